//! Push-channel messages and the normalized update fed to the engine.

use serde::{Deserialize, Serialize};

use crate::{PendingAction, ProtocolError, Snapshot, WireState};

/// An asynchronous message from the push channel, tagged by kind.
///
/// `#[serde(tag = "type")]` matches the authority's `{"type": "...", ...}`
/// framing. Unknown tags fail decode and are discarded by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Room state while gathering players. The state payload is flattened
    /// at the top level; a `pending_action` rides along when a client
    /// connects into a game already mid-negotiation.
    LobbyUpdate {
        #[serde(flatten)]
        state: WireState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pending_action: Option<PendingAction>,
    },

    /// The game has started; carries the initial in-game state.
    Started {
        #[serde(rename = "gameState")]
        game_state: WireState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
    },

    /// An action (or reaction) was processed.
    Action {
        /// Human-readable log line to surface verbatim.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        msg: Option<String>,
        #[serde(rename = "gameState")]
        game_state: WireState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pending_action: Option<PendingAction>,
    },

    /// Reply to the client's keepalive ping.
    Pong,
}

/// The normalized (snapshot, pending action, note) triple the engine
/// consumes, regardless of which channel produced it.
#[derive(Debug, Clone)]
pub struct StateUpdate {
    pub snapshot: Snapshot,
    pub pending: Option<PendingAction>,
    /// Informational line to show the player, if any.
    pub note: Option<String>,
}

impl PushMessage {
    /// Decodes one push frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Normalizes this message into an engine update. `Ok(None)` for
    /// messages that carry no state (pong).
    pub fn into_update(self) -> Result<Option<StateUpdate>, ProtocolError> {
        match self {
            Self::LobbyUpdate {
                state,
                msg,
                pending_action,
            } => Ok(Some(StateUpdate {
                snapshot: state.into_snapshot()?,
                pending: pending_action,
                note: msg,
            })),
            Self::Started { game_state, msg } => Ok(Some(StateUpdate {
                snapshot: game_state.into_snapshot()?,
                pending: None,
                note: msg,
            })),
            Self::Action {
                msg,
                game_state,
                pending_action,
            } => Ok(Some(StateUpdate {
                snapshot: game_state.into_snapshot()?,
                pending: pending_action,
                note: msg,
            })),
            Self::Pong => Ok(None),
        }
    }
}
