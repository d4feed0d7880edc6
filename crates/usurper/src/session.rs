//! The session context: who we are and which room we are in.
//!
//! Held as an explicit value by the runtime and passed where needed —
//! there are no ambient globals for the current room or identity.

use usurper_protocol::{PlayerId, RoomCode};
use usurper_transport::GameApi;

use crate::ClientError;

/// One player's membership in one room.
#[derive(Debug, Clone)]
pub struct Session {
    pub room: RoomCode,
    pub player: PlayerId,
    pub nickname: String,
}

impl Session {
    /// Creates a fresh room on the authority and joins it as host.
    ///
    /// Identity issuance is out of scope: the caller supplies `player`.
    pub async fn create<A: GameApi>(
        api: &A,
        player: PlayerId,
        nickname: &str,
    ) -> Result<Self, ClientError> {
        let created = api.create_room(&player).await?;
        Self::join(api, created.room_code, player, nickname).await
    }

    /// Joins an existing room under the given display name.
    pub async fn join<A: GameApi>(
        api: &A,
        room: RoomCode,
        player: PlayerId,
        nickname: &str,
    ) -> Result<Self, ClientError> {
        api.join_room(&room, &player, nickname).await?;
        tracing::info!(%room, %player, "joined room");
        Ok(Self {
            room,
            player,
            nickname: nickname.to_owned(),
        })
    }
}
