//! The reaction window and its owned countdown task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use usurper_protocol::{
    ActionKind, BlockPolicy, PendingAction, PlayerId, Role,
};

/// Counter for generating unique window ids.
static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one opened reaction window. Countdown ticks are tagged with
/// it so a tick from a replaced window can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(u64);

impl WindowId {
    fn next() -> Self {
        Self(NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "win-{}", self.0)
    }
}

/// A 1 Hz tick emitted by a window's countdown task.
#[derive(Debug, Clone, Copy)]
pub struct WindowTick {
    pub id: WindowId,
    /// Seconds left after this tick. Zero means the window just expired.
    pub remaining: u64,
}

/// What the local player may do inside a reaction window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionOptions {
    /// Pass is always offered; Challenge only against a claimed role.
    pub can_challenge: bool,
    /// Roles the local player may claim to block with. Empty means no
    /// block is offered.
    pub block_roles: Vec<Role>,
}

impl ReactionOptions {
    /// Options for the first reaction stage, seen by `local`.
    ///
    /// Challenge is offered iff the action claims a role. Block is
    /// offered per the action's block policy: foreign aid to anyone but
    /// the actor, targeted actions to the declared target only.
    pub fn for_reaction(
        action: ActionKind,
        actor: &PlayerId,
        target: Option<&PlayerId>,
        local: &PlayerId,
    ) -> Self {
        let may_block = match action.block_policy() {
            BlockPolicy::Nobody => false,
            BlockPolicy::Anyone => local != actor,
            BlockPolicy::TargetOnly => target == Some(local),
        };
        Self {
            can_challenge: action.is_challengeable(),
            block_roles: if may_block {
                action.block_roles().to_vec()
            } else {
                Vec::new()
            },
        }
    }

    /// Options for the block-reaction stage: a block can be challenged
    /// but never re-blocked.
    pub fn for_block_reaction() -> Self {
        Self {
            can_challenge: true,
            block_roles: Vec::new(),
        }
    }

    pub fn can_block(&self) -> bool {
        !self.block_roles.is_empty()
    }
}

/// Local-only countdown attached to a pending reaction stage.
///
/// The window owns its timer task: dropping the window aborts the task,
/// so opening a new window cancels the previous countdown outright and at
/// most one countdown runs at a time.
#[derive(Debug)]
pub struct ReactionWindow {
    id: WindowId,
    pending: PendingAction,
    options: ReactionOptions,
    remaining: u64,
    timer: JoinHandle<()>,
}

impl ReactionWindow {
    /// Opens a window over `pending`, counting down from `secs`, emitting
    /// ticks into `ticks`.
    pub(crate) fn open(
        pending: PendingAction,
        options: ReactionOptions,
        secs: u64,
        ticks: mpsc::UnboundedSender<WindowTick>,
    ) -> Self {
        let id = WindowId::next();
        let timer = tokio::spawn(async move {
            let mut remaining = secs;
            // A window seeded at zero (the authority's clock already ran
            // out) expires on the next poll of the task.
            if remaining == 0 {
                let _ = ticks.send(WindowTick { id, remaining: 0 });
                return;
            }
            while remaining > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                remaining -= 1;
                if ticks.send(WindowTick { id, remaining }).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(%id, secs, "reaction window opened");
        Self {
            id,
            pending,
            options,
            remaining: secs,
            timer,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn pending(&self) -> &PendingAction {
        &self.pending
    }

    pub fn options(&self) -> &ReactionOptions {
        &self.options
    }

    /// Seconds left on the countdown.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub(crate) fn record_tick(&mut self, remaining: u64) {
        self.remaining = remaining;
    }
}

impl Drop for ReactionWindow {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    #[test]
    fn test_tax_offers_challenge_only() {
        let o = ReactionOptions::for_reaction(
            ActionKind::Tax,
            &pid("a"),
            None,
            &pid("b"),
        );
        assert!(o.can_challenge);
        assert!(!o.can_block());
    }

    #[test]
    fn test_foreign_aid_blockable_by_any_bystander() {
        let o = ReactionOptions::for_reaction(
            ActionKind::ForeignAid,
            &pid("a"),
            None,
            &pid("b"),
        );
        assert!(!o.can_challenge);
        assert_eq!(o.block_roles, vec![Role::Duke]);
    }

    #[test]
    fn test_foreign_aid_not_blockable_by_its_actor() {
        let o = ReactionOptions::for_reaction(
            ActionKind::ForeignAid,
            &pid("a"),
            None,
            &pid("a"),
        );
        assert!(!o.can_block());
    }

    #[test]
    fn test_assassinate_blockable_by_target_only() {
        let target = ReactionOptions::for_reaction(
            ActionKind::Assassinate,
            &pid("a"),
            Some(&pid("t")),
            &pid("t"),
        );
        assert!(target.can_challenge);
        assert_eq!(target.block_roles, vec![Role::Contessa]);

        let bystander = ReactionOptions::for_reaction(
            ActionKind::Assassinate,
            &pid("a"),
            Some(&pid("t")),
            &pid("u"),
        );
        assert!(bystander.can_challenge);
        assert!(!bystander.can_block());
    }

    #[test]
    fn test_steal_block_offers_both_roles_to_target() {
        let o = ReactionOptions::for_reaction(
            ActionKind::Steal,
            &pid("a"),
            Some(&pid("t")),
            &pid("t"),
        );
        assert_eq!(o.block_roles, vec![Role::Captain, Role::Ambassador]);
    }

    #[test]
    fn test_block_reaction_never_offers_a_block() {
        let o = ReactionOptions::for_block_reaction();
        assert!(o.can_challenge);
        assert!(!o.can_block());
    }
}
