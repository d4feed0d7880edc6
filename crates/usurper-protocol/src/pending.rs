//! The in-flight negotiation descriptor.
//!
//! A [`PendingAction`] is created by the authority when an action (or a
//! counter-action) is submitted and destroyed when the stage resolves.
//! The client never originates or mutates one — it only reacts to the
//! latest descriptor it has been shown.

use serde::{Deserialize, Serialize};

use crate::{ActionKind, PlayerId, Role};

/// Length of the authority's reaction clock, in seconds. The local
/// countdown is a convenience mirror of this; the authoritative timeout
/// is enforced server-side.
pub const REACTION_WINDOW_SECS: u64 = 60;

/// The stage a pending negotiation is in.
///
/// Stages are server-driven: the client never infers transitions, it only
/// dispatches on the label it was given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Everyone but the actor may challenge or block.
    Reaction,
    /// A block was raised; everyone but the blocker may challenge it.
    /// A block is never itself re-blocked.
    BlockReaction,
    /// One participant must choose a card (to discard, or to exchange).
    CardSelection,
    /// One participant must prove a claim by revealing the required card.
    RevealClaim,
}

/// Descriptor of an in-flight negotiation, absent when none is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub action: ActionKind,
    #[serde(rename = "actor_id")]
    pub actor: PlayerId,
    #[serde(rename = "target_id", default)]
    pub target: Option<PlayerId>,
    pub stage: Stage,
    /// The single participant the authority is blocked on, for the
    /// card_selection and reveal_claim stages.
    #[serde(default)]
    pub awaiting_from: Option<PlayerId>,
    /// The card a reveal_claim participant must show.
    #[serde(default)]
    pub required_card: Option<Role>,
    #[serde(rename = "blocker_id", default)]
    pub blocker: Option<PlayerId>,
    /// The role the blocker claimed.
    #[serde(default)]
    pub block_card: Option<Role>,
    /// Server's view of the reaction clock, in seconds.
    #[serde(default)]
    pub time_remaining: Option<f64>,
}

impl PendingAction {
    /// Whether `other` describes the same negotiation at the same stage.
    ///
    /// `time_remaining` is excluded: the clock ticking down does not make
    /// a re-delivered descriptor a new negotiation. Anything else changing
    /// (stage escalation, a different blocker, a new awaited participant)
    /// does.
    pub fn same_negotiation(&self, other: &Self) -> bool {
        self.action == other.action
            && self.actor == other.actor
            && self.target == other.target
            && self.stage == other.stage
            && self.awaiting_from == other.awaiting_from
            && self.required_card == other.required_card
            && self.blocker == other.blocker
            && self.block_card == other.block_card
    }

    /// Whether the authority is waiting on `id` specifically.
    pub fn awaits(&self, id: &PlayerId) -> bool {
        self.awaiting_from.as_ref() == Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(stage: Stage) -> PendingAction {
        PendingAction {
            action: ActionKind::Assassinate,
            actor: PlayerId::from("a"),
            target: Some(PlayerId::from("t")),
            stage,
            awaiting_from: None,
            required_card: None,
            blocker: None,
            block_card: None,
            time_remaining: Some(60.0),
        }
    }

    #[test]
    fn test_decodes_reaction_stage_payload() {
        // The shape broadcast right after an action is submitted.
        let json = r#"{
            "actor_id": "g-1",
            "action": "steal",
            "target_id": "g-2",
            "awaiting_from": null,
            "required_card": null,
            "time_remaining": 54.2,
            "stage": "reaction",
            "blocker_id": null,
            "block_card": null
        }"#;
        let pa: PendingAction = serde_json::from_str(json).unwrap();
        assert_eq!(pa.action, ActionKind::Steal);
        assert_eq!(pa.stage, Stage::Reaction);
        assert_eq!(pa.actor, PlayerId::from("g-1"));
        assert_eq!(pa.target, Some(PlayerId::from("g-2")));
        assert_eq!(pa.time_remaining, Some(54.2));
    }

    #[test]
    fn test_decodes_sparse_payload_with_unknown_fields() {
        // The inline request/response variant carries bookkeeping fields
        // the client has no use for, and omits time_remaining.
        let json = r#"{
            "actor_id": "g-1",
            "action": "exchange",
            "target_id": null,
            "timestamp": 1723380000.1,
            "game_id": 7,
            "stage": "card_selection",
            "awaiting_from": "g-1",
            "challenge_failed": true
        }"#;
        let pa: PendingAction = serde_json::from_str(json).unwrap();
        assert_eq!(pa.stage, Stage::CardSelection);
        assert!(pa.awaits(&PlayerId::from("g-1")));
        assert_eq!(pa.time_remaining, None);
    }

    #[test]
    fn test_unknown_stage_fails_decode() {
        let json = r#"{"actor_id": "a", "action": "tax", "stage": "haggling"}"#;
        assert!(serde_json::from_str::<PendingAction>(json).is_err());
    }

    #[test]
    fn test_same_negotiation_ignores_clock_only() {
        let a = pending(Stage::Reaction);
        let mut b = a.clone();
        b.time_remaining = Some(12.0);
        assert!(a.same_negotiation(&b));

        let mut escalated = a.clone();
        escalated.stage = Stage::BlockReaction;
        escalated.blocker = Some(PlayerId::from("t"));
        assert!(!a.same_negotiation(&escalated));
    }

    #[test]
    fn test_same_negotiation_detects_new_awaited_participant() {
        let mut a = pending(Stage::CardSelection);
        a.awaiting_from = Some(PlayerId::from("t"));
        let mut b = a.clone();
        b.awaiting_from = Some(PlayerId::from("a"));
        assert!(!a.same_negotiation(&b));
    }
}
