//! Raw wire shapes and their conversion into the typed [`Snapshot`].
//!
//! The authority's JSON is looser than the domain model: card masks are
//! the literal string `"?"`, the `revealed` list can drift out of step
//! with the hand, some payloads carry `deck_count` while others carry the
//! deck itself, and a player's public identity is spread across three
//! columns. All of that is normalized here, at the boundary, so the rest
//! of the client only ever sees well-formed values.

use serde::{Deserialize, Serialize};

use crate::{
    CardSlot, PlayerId, PlayerView, ProtocolError, Role, RoomStatus, Snapshot,
};

/// The card mask the authority substitutes for hidden slots in another
/// viewer's hand.
const MASK: &str = "?";

/// The `game` object as sent by the authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireGame {
    pub status: RoomStatus,
    #[serde(default)]
    pub turn: Option<usize>,
    /// Present in masked views.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_count: Option<usize>,
    /// Present in unmasked views; only its length is meaningful here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck: Option<Vec<String>>,
    #[serde(default)]
    pub trash: Vec<Role>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default)]
    pub winner: Option<String>,
}

/// One player row as sent by the authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePlayer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub guest_id: Option<String>,
    pub nickname: String,
    #[serde(default)]
    pub coins: u32,
    #[serde(default = "default_alive")]
    pub is_alive: bool,
    #[serde(default)]
    pub hand: Vec<String>,
    #[serde(default)]
    pub revealed: Vec<bool>,
}

fn default_alive() -> bool {
    true
}

impl WirePlayer {
    /// The identity other protocol fields refer to: guest id, then account
    /// id, then the stringified row id — the authority's own lookup chain.
    pub fn identity(&self) -> PlayerId {
        if let Some(guest) = &self.guest_id {
            return PlayerId(guest.clone());
        }
        if let Some(user) = &self.user_id {
            return PlayerId(user.clone());
        }
        PlayerId(self.id.unwrap_or_default().to_string())
    }
}

/// A full `{game, players}` state payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireState {
    pub game: WireGame,
    pub players: Vec<WirePlayer>,
}

impl WireState {
    /// Normalizes the raw payload into a typed snapshot.
    ///
    /// # Errors
    /// Fails on a card name that is neither a known role nor the mask;
    /// such a payload is treated as malformed and discarded upstream.
    pub fn into_snapshot(self) -> Result<Snapshot, ProtocolError> {
        let status = self.game.status;
        let players = self
            .players
            .into_iter()
            .map(convert_player)
            .collect::<Result<Vec<_>, _>>()?;

        // A turn pointer is only meaningful once the game is running; the
        // authority leaves a default 0 in place while waiting.
        let turn = match status {
            RoomStatus::Started => self.game.turn,
            RoomStatus::Waiting => None,
        };

        let deck_count = self
            .game
            .deck_count
            .or_else(|| self.game.deck.as_ref().map(Vec::len))
            .unwrap_or(0);

        Ok(Snapshot {
            status,
            players,
            turn,
            deck_count,
            trash: self.game.trash,
            game_over: self.game.game_over,
            winner: self.game.winner,
        })
    }
}

fn convert_player(p: WirePlayer) -> Result<PlayerView, ProtocolError> {
    let id = p.identity();

    // Pad or truncate `revealed` to hand length, as the authority does.
    let mut revealed = p.revealed;
    revealed.resize(p.hand.len(), false);

    let hand = p
        .hand
        .iter()
        .zip(revealed)
        .map(|(name, revealed)| {
            let role = if name == MASK {
                None
            } else {
                Some(
                    Role::from_wire(name)
                        .ok_or_else(|| ProtocolError::UnknownCard(name.clone()))?,
                )
            };
            Ok(CardSlot { role, revealed })
        })
        .collect::<Result<Vec<_>, ProtocolError>>()?;

    Ok(PlayerView {
        id,
        name: p.nickname,
        coins: p.coins,
        hand,
        alive: p.is_alive,
    })
}
