//! Request and response bodies for the request/response channel.

use serde::{Deserialize, Serialize};

use crate::{
    ActionKind, PendingAction, PlayerId, ProtocolError, Role, RoomCode,
    StateUpdate, WireState,
};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// The verb submitted on the action endpoint: a performable action, or one
/// of the meta verbs that resolve a pending negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestVerb {
    Income,
    ForeignAid,
    Coup,
    Tax,
    Assassinate,
    Steal,
    Exchange,
    Challenge,
    Block,
    Pass,
    SelectCard,
}

impl From<ActionKind> for RequestVerb {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Income => Self::Income,
            ActionKind::ForeignAid => Self::ForeignAid,
            ActionKind::Coup => Self::Coup,
            ActionKind::Tax => Self::Tax,
            ActionKind::Assassinate => Self::Assassinate,
            ActionKind::Steal => Self::Steal,
            ActionKind::Exchange => Self::Exchange,
        }
    }
}

/// One protocol request against the action endpoint. Room and player
/// identity are supplied by the transport from the session context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action_type: RequestVerb,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_card: Option<Role>,
}

impl ActionRequest {
    /// A turn action, optionally targeted.
    pub fn play(kind: ActionKind, target: Option<PlayerId>) -> Self {
        Self {
            action_type: kind.into(),
            target_id: target,
            card_index: None,
            block_card: None,
        }
    }

    /// Decline to react to the pending action.
    pub fn pass() -> Self {
        Self {
            action_type: RequestVerb::Pass,
            target_id: None,
            card_index: None,
            block_card: None,
        }
    }

    /// Dispute the pending claim.
    pub fn challenge() -> Self {
        Self {
            action_type: RequestVerb::Challenge,
            target_id: None,
            card_index: None,
            block_card: None,
        }
    }

    /// Counter the pending action, claiming `role`.
    pub fn block(role: Role) -> Self {
        Self {
            action_type: RequestVerb::Block,
            target_id: None,
            card_index: None,
            block_card: Some(role),
        }
    }

    /// Answer a forced-disclosure stage with a hand index.
    pub fn select_card(index: usize) -> Self {
        Self {
            action_type: RequestVerb::SelectCard,
            target_id: None,
            card_index: Some(index),
            block_card: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response to room creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomResponse {
    pub room_code: RoomCode,
}

/// A bare acknowledgment, optionally with a human-readable message.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to an action submission. The inline snapshot, when present,
/// goes through the same engine entry point as a push update.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "gameState", default)]
    pub game_state: Option<WireState>,
    #[serde(default)]
    pub pending_action: Option<PendingAction>,
}

impl ActionResponse {
    /// Normalizes the inline snapshot, if any, into an engine update.
    pub fn into_update(self) -> Result<Option<StateUpdate>, ProtocolError> {
        let Some(state) = self.game_state else {
            return Ok(None);
        };
        Ok(Some(StateUpdate {
            snapshot: state.into_snapshot()?,
            pending: self.pending_action,
            note: self.message,
        }))
    }
}

/// Response to a state fetch: the masked state, plus the negotiation
/// descriptor when one is in flight.
#[derive(Debug, Clone, Deserialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub state: WireState,
    #[serde(default)]
    pub pending_action: Option<PendingAction>,
}

impl StateResponse {
    pub fn into_update(self) -> Result<StateUpdate, ProtocolError> {
        Ok(StateUpdate {
            snapshot: self.state.into_snapshot()?,
            pending: self.pending_action,
            note: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_serializes_action_verb() {
        let req = ActionRequest::play(
            ActionKind::Steal,
            Some(PlayerId::from("g-2")),
        );
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action_type"], "steal");
        assert_eq!(json["target_id"], "g-2");
        assert!(json.get("card_index").is_none());
        assert!(json.get("block_card").is_none());
    }

    #[test]
    fn test_block_carries_claimed_role() {
        let json: serde_json::Value =
            serde_json::to_value(ActionRequest::block(Role::Contessa)).unwrap();
        assert_eq!(json["action_type"], "block");
        assert_eq!(json["block_card"], "Contessa");
    }

    #[test]
    fn test_select_card_carries_index_only() {
        let json: serde_json::Value =
            serde_json::to_value(ActionRequest::select_card(1)).unwrap();
        assert_eq!(json["action_type"], "select_card");
        assert_eq!(json["card_index"], 1);
        assert!(json.get("target_id").is_none());
    }

    #[test]
    fn test_pass_and_challenge_verbs() {
        let json: serde_json::Value =
            serde_json::to_value(ActionRequest::pass()).unwrap();
        assert_eq!(json["action_type"], "pass");
        let json: serde_json::Value =
            serde_json::to_value(ActionRequest::challenge()).unwrap();
        assert_eq!(json["action_type"], "challenge");
    }

    #[test]
    fn test_action_response_without_snapshot() {
        let resp: ActionResponse =
            serde_json::from_str(r#"{"message": "ok"}"#).unwrap();
        assert!(resp.into_update().unwrap().is_none());
    }

    #[test]
    fn test_action_response_with_inline_snapshot() {
        let resp: ActionResponse = serde_json::from_str(
            r#"{
                "message": "alice takes Income (+1 coin)",
                "gameState": {
                    "game": {"status": "started", "turn": 1, "deck_count": 11,
                             "trash": [], "game_over": false},
                    "players": []
                }
            }"#,
        )
        .unwrap();
        let update = resp.into_update().unwrap().unwrap();
        assert_eq!(update.snapshot.turn, Some(1));
        assert_eq!(
            update.note.as_deref(),
            Some("alice takes Income (+1 coin)")
        );
    }

    #[test]
    fn test_state_response_tolerates_missing_pending() {
        let resp: StateResponse = serde_json::from_str(
            r#"{
                "game": {"status": "waiting", "turn": 0, "deck_count": 15,
                         "trash": [], "game_over": false},
                "players": []
            }"#,
        )
        .unwrap();
        let update = resp.into_update().unwrap();
        assert!(update.pending.is_none());
        assert!(!update.snapshot.is_started());
    }
}
