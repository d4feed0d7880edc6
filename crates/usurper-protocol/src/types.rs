//! Core vocabulary: identities, cards, actions, and room status.
//!
//! Everything here is a closed set. The reaction rules (who may challenge,
//! who may block, with which card) are methods on [`ActionKind`] so that a
//! new action kind cannot be added without the compiler pointing at every
//! rule table that must learn about it.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's public identity within a room.
///
/// The authority hands this out at join time (a guest or account id); every
/// pending-action field (`actor_id`, `awaiting_from`, ...) refers to it.
/// `#[serde(transparent)]` keeps it a plain JSON string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A short shareable code identifying a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// The five court roles. Serialized as their PascalCase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Duke,
    Assassin,
    Captain,
    Ambassador,
    Contessa,
}

impl Role {
    /// Parses the wire name of a role. `None` for anything unknown
    /// (including the `"?"` mask, which callers handle separately).
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "Duke" => Some(Self::Duke),
            "Assassin" => Some(Self::Assassin),
            "Captain" => Some(Self::Captain),
            "Ambassador" => Some(Self::Ambassador),
            "Contessa" => Some(Self::Contessa),
            _ => None,
        }
    }

    /// The wire name of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Duke => "Duke",
            Self::Assassin => "Assassin",
            Self::Captain => "Captain",
            Self::Ambassador => "Ambassador",
            Self::Contessa => "Contessa",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One card slot in a player's hand.
///
/// `role` is `None` when the authority has masked the card for this viewer.
/// A slot with `revealed == true` is public knowledge and always carries
/// its role, even in another player's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardSlot {
    pub role: Option<Role>,
    pub revealed: bool,
}

impl CardSlot {
    /// A face-down card whose role this viewer knows (their own hand).
    pub fn secret(role: Role) -> Self {
        Self {
            role: Some(role),
            revealed: false,
        }
    }

    /// A face-down card masked by the authority.
    pub fn masked() -> Self {
        Self {
            role: None,
            revealed: false,
        }
    }

    /// A face-up card; its role is public.
    pub fn shown(role: Role) -> Self {
        Self {
            role: Some(role),
            revealed: true,
        }
    }

    /// Whether this slot still counts as hidden influence.
    pub fn is_secret(&self) -> bool {
        !self.revealed
    }

    /// Whether this slot is a live (unrevealed) copy of `role`, as far as
    /// this viewer can tell.
    pub fn is_live(&self, role: Role) -> bool {
        !self.revealed && self.role == Some(role)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Who is allowed to block an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPolicy {
    /// The action cannot be blocked.
    Nobody,
    /// Any player other than the actor may block.
    Anyone,
    /// Only the declared target may block.
    TargetOnly,
}

/// The seven performable actions. Serialized in snake_case, matching the
/// authority's action vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Income,
    ForeignAid,
    Coup,
    Tax,
    Assassinate,
    Steal,
    Exchange,
}

impl ActionKind {
    /// The role this action claims, i.e. what a challenger disputes.
    /// Actions without a claim cannot be challenged.
    pub fn claim(self) -> Option<Role> {
        match self {
            Self::Tax => Some(Role::Duke),
            Self::Assassinate => Some(Role::Assassin),
            Self::Steal => Some(Role::Captain),
            Self::Exchange => Some(Role::Ambassador),
            Self::Income | Self::ForeignAid | Self::Coup => None,
        }
    }

    /// Whether a challenge may be raised against this action.
    pub fn is_challengeable(self) -> bool {
        self.claim().is_some()
    }

    /// The roles that may be claimed to block this action.
    pub fn block_roles(self) -> &'static [Role] {
        match self {
            Self::ForeignAid => &[Role::Duke],
            Self::Assassinate => &[Role::Contessa],
            Self::Steal => &[Role::Captain, Role::Ambassador],
            Self::Income | Self::Coup | Self::Tax | Self::Exchange => &[],
        }
    }

    /// Who may raise a block against this action.
    pub fn block_policy(self) -> BlockPolicy {
        match self {
            Self::ForeignAid => BlockPolicy::Anyone,
            Self::Assassinate | Self::Steal => BlockPolicy::TargetOnly,
            Self::Income | Self::Coup | Self::Tax | Self::Exchange => {
                BlockPolicy::Nobody
            }
        }
    }

    /// Whether the authority opens a reaction window for this action.
    /// income and coup resolve without one.
    pub fn has_reaction_stage(self) -> bool {
        self.is_challengeable() || self.block_policy() != BlockPolicy::Nobody
    }

    /// Whether the action must name a target player.
    pub fn requires_target(self) -> bool {
        matches!(self, Self::Coup | Self::Assassinate | Self::Steal)
    }

    /// The wire name of this action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::ForeignAid => "foreign_aid",
            Self::Coup => "coup",
            Self::Tax => "tax",
            Self::Assassinate => "assassinate",
            Self::Steal => "steal",
            Self::Exchange => "exchange",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Room status
// ---------------------------------------------------------------------------

/// Lifecycle status of a room as reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Room exists, players gathering, lobby polling active.
    Waiting,
    /// Cards dealt, turn pointer live.
    Started,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::from("g-42")).unwrap();
        assert_eq!(json, "\"g-42\"");
    }

    #[test]
    fn test_role_wire_names_round_trip() {
        for role in [
            Role::Duke,
            Role::Assassin,
            Role::Captain,
            Role::Ambassador,
            Role::Contessa,
        ] {
            assert_eq!(Role::from_wire(role.as_str()), Some(role));
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
        }
    }

    #[test]
    fn test_role_from_wire_rejects_mask_and_garbage() {
        assert_eq!(Role::from_wire("?"), None);
        assert_eq!(Role::from_wire("Jester"), None);
    }

    #[test]
    fn test_action_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ActionKind::ForeignAid).unwrap();
        assert_eq!(json, "\"foreign_aid\"");
        let kind: ActionKind = serde_json::from_str("\"assassinate\"").unwrap();
        assert_eq!(kind, ActionKind::Assassinate);
    }

    #[test]
    fn test_challengeable_set() {
        // Exactly {tax, assassinate, steal, exchange}.
        assert!(ActionKind::Tax.is_challengeable());
        assert!(ActionKind::Assassinate.is_challengeable());
        assert!(ActionKind::Steal.is_challengeable());
        assert!(ActionKind::Exchange.is_challengeable());
        assert!(!ActionKind::Income.is_challengeable());
        assert!(!ActionKind::ForeignAid.is_challengeable());
        assert!(!ActionKind::Coup.is_challengeable());
    }

    #[test]
    fn test_claim_table() {
        assert_eq!(ActionKind::Tax.claim(), Some(Role::Duke));
        assert_eq!(ActionKind::Assassinate.claim(), Some(Role::Assassin));
        assert_eq!(ActionKind::Steal.claim(), Some(Role::Captain));
        assert_eq!(ActionKind::Exchange.claim(), Some(Role::Ambassador));
        assert_eq!(ActionKind::ForeignAid.claim(), None);
    }

    #[test]
    fn test_block_table() {
        assert_eq!(ActionKind::ForeignAid.block_roles(), &[Role::Duke]);
        assert_eq!(ActionKind::Assassinate.block_roles(), &[Role::Contessa]);
        assert_eq!(
            ActionKind::Steal.block_roles(),
            &[Role::Captain, Role::Ambassador]
        );
        assert!(ActionKind::Tax.block_roles().is_empty());
        assert!(ActionKind::Coup.block_roles().is_empty());
    }

    #[test]
    fn test_block_policy() {
        assert_eq!(ActionKind::ForeignAid.block_policy(), BlockPolicy::Anyone);
        assert_eq!(
            ActionKind::Assassinate.block_policy(),
            BlockPolicy::TargetOnly
        );
        assert_eq!(ActionKind::Steal.block_policy(), BlockPolicy::TargetOnly);
        assert_eq!(ActionKind::Income.block_policy(), BlockPolicy::Nobody);
    }

    #[test]
    fn test_income_and_coup_have_no_reaction_stage() {
        assert!(!ActionKind::Income.has_reaction_stage());
        assert!(!ActionKind::Coup.has_reaction_stage());
        assert!(ActionKind::ForeignAid.has_reaction_stage());
        assert!(ActionKind::Tax.has_reaction_stage());
    }

    #[test]
    fn test_room_status_lowercase() {
        let s: RoomStatus = serde_json::from_str("\"waiting\"").unwrap();
        assert_eq!(s, RoomStatus::Waiting);
        let s: RoomStatus = serde_json::from_str("\"started\"").unwrap();
        assert_eq!(s, RoomStatus::Started);
    }

    #[test]
    fn test_card_slot_liveness() {
        assert!(CardSlot::secret(Role::Duke).is_live(Role::Duke));
        assert!(!CardSlot::shown(Role::Duke).is_live(Role::Duke));
        assert!(!CardSlot::masked().is_live(Role::Duke));
    }
}
