//! The game state store: one snapshot, one pending action, replace-only.

use usurper_protocol::{PendingAction, Snapshot};

/// Holds the single latest authoritative view.
///
/// Both values are replaced wholesale on every update and never patched
/// in place. The transport provides no ordering guarantees, so wholesale
/// replacement (last-message-wins) is the only strategy that cannot leave
/// a half-merged view; it remains vulnerable to a late stale message,
/// which is an accepted, documented risk.
#[derive(Debug, Default)]
pub struct GameStateStore {
    snapshot: Option<Snapshot>,
    pending: Option<PendingAction>,
}

impl GameStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces both values unconditionally.
    pub fn replace(
        &mut self,
        snapshot: Snapshot,
        pending: Option<PendingAction>,
    ) {
        self.snapshot = Some(snapshot);
        self.pending = pending;
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usurper_protocol::{ActionKind, PlayerId, RoomStatus, Stage};

    fn snapshot(deck_count: usize) -> Snapshot {
        Snapshot {
            status: RoomStatus::Started,
            players: vec![],
            turn: Some(0),
            deck_count,
            trash: vec![],
            game_over: false,
            winner: None,
        }
    }

    fn pending() -> PendingAction {
        PendingAction {
            action: ActionKind::Tax,
            actor: PlayerId::from("a"),
            target: None,
            stage: Stage::Reaction,
            awaiting_from: None,
            required_card: None,
            blocker: None,
            block_card: None,
            time_remaining: None,
        }
    }

    #[test]
    fn test_second_update_replaces_first_exactly() {
        let mut store = GameStateStore::new();
        store.replace(snapshot(15), Some(pending()));
        store.replace(snapshot(11), None);

        // Replacement, not merge: the pending action from the first
        // update must not survive the second.
        assert_eq!(store.snapshot(), Some(&snapshot(11)));
        assert!(store.pending().is_none());
    }

    #[test]
    fn test_pending_is_carried_with_its_snapshot() {
        let mut store = GameStateStore::new();
        store.replace(snapshot(15), None);
        store.replace(snapshot(15), Some(pending()));
        assert!(store.pending().is_some());
    }
}
