//! The typed, viewer-specific snapshot of a room.
//!
//! A [`Snapshot`] is an immutable value: every update from the authority
//! produces a fresh one that replaces the previous wholesale. Nothing in
//! the client ever patches a snapshot field-by-field — that is what keeps
//! the push and poll paths from racing each other into a half-merged view.

use crate::{CardSlot, PlayerId, Role, RoomStatus};

/// One player as seen by the local viewer.
///
/// `hand` is masked per-viewer by the authority: the local player sees
/// their own roles, everyone else's unrevealed slots come back unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub coins: u32,
    pub hand: Vec<CardSlot>,
    pub alive: bool,
}

impl PlayerView {
    /// Whether this player still holds a live copy of `role`, as far as
    /// the viewer can tell.
    pub fn holds_live(&self, role: Role) -> bool {
        self.hand.iter().any(|slot| slot.is_live(role))
    }
}

/// The complete authoritative view of a room at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub status: RoomStatus,
    /// Players in authority order; the turn pointer indexes this list.
    pub players: Vec<PlayerView>,
    /// Index of the player whose turn it is. `None` before the game starts.
    pub turn: Option<usize>,
    pub deck_count: usize,
    /// Revealed cards, in discard order.
    pub trash: Vec<Role>,
    pub game_over: bool,
    /// Winner's display name, once the game is over.
    pub winner: Option<String>,
}

impl Snapshot {
    pub fn is_started(&self) -> bool {
        self.status == RoomStatus::Started
    }

    /// Looks up a player by identity.
    pub fn player(&self, id: &PlayerId) -> Option<&PlayerView> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// The player holding the turn, if the game is running.
    pub fn current_player(&self) -> Option<&PlayerView> {
        self.turn.and_then(|i| self.players.get(i))
    }

    /// Whether it is `id`'s turn right now.
    pub fn is_turn_of(&self, id: &PlayerId) -> bool {
        self.current_player().is_some_and(|p| &p.id == id)
    }
}
