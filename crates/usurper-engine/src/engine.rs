//! The protocol engine: the client-side synchronization state machine.

use tokio::sync::mpsc;

use usurper_protocol::{
    ActionKind, ActionRequest, CardSlot, PendingAction, PlayerId, Role, Stage,
    StateUpdate, REACTION_WINDOW_SECS,
};

use crate::window::{ReactionOptions, ReactionWindow, WindowTick};
use crate::{EngineError, GameStateStore};

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Which flavor of card choice a selection prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Choose a card to lose to the trash.
    Discard,
    /// Choose a card to swap with the deck.
    Exchange,
}

/// The decision surface the local player should be shown.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptSpec {
    /// A reaction window against an action: Pass, and conditionally
    /// Challenge and Block per `options`.
    Reaction {
        action: ActionKind,
        actor: PlayerId,
        options: ReactionOptions,
    },
    /// A reaction window against a block: Pass and Challenge only.
    BlockReaction {
        action: ActionKind,
        blocker: PlayerId,
        block_card: Option<Role>,
        options: ReactionOptions,
    },
    /// A forced card choice from the local hand.
    CardSelection {
        mode: SelectionMode,
        hand: Vec<CardSlot>,
    },
    /// Prove a claim by revealing the required card.
    RevealClaim {
        required: Role,
        /// Whether the local hand visibly holds a live copy.
        holds_required: bool,
        hand: Vec<CardSlot>,
    },
}

/// Result of feeding one update through the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    /// The surface the player should now see. `None` dismisses any open
    /// prompt — the negotiation, if any, has concluded or moved on.
    pub prompt: Option<PromptSpec>,
    /// True exactly once, on the waiting→started transition (from either
    /// channel). The lobby poller must be stopped before rendering.
    pub game_started: bool,
    /// Informational line to surface verbatim.
    pub note: Option<String>,
}

/// Result of feeding a countdown tick through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The active window counted down to `remaining` seconds.
    Counting(u64),
    /// The window just expired and was closed locally; dismiss the
    /// prompt. The authoritative timeout arrives as a later update.
    Expired,
    /// A tick from a window that has already been replaced or closed.
    Stale,
}

/// A choice the local player made on a decision surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerResponse {
    Pass,
    Challenge,
    Block(Role),
    SelectCard(usize),
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The single in-client authority for what the local player must do.
///
/// All updates — push, poll, inline response — enter through
/// [`apply_update`](Self::apply_update); all outgoing requests are built
/// by [`respond`](Self::respond) / [`play`](Self::play). The engine never
/// predicts the authority's resolution of anything it sends.
pub struct ProtocolEngine {
    local: PlayerId,
    store: GameStateStore,
    window: Option<ReactionWindow>,
    started_seen: bool,
    ticks: mpsc::UnboundedSender<WindowTick>,
}

impl ProtocolEngine {
    /// Creates an engine for the local player. Countdown ticks from
    /// reaction windows are emitted into `ticks`.
    pub fn new(
        local: PlayerId,
        ticks: mpsc::UnboundedSender<WindowTick>,
    ) -> Self {
        Self {
            local,
            store: GameStateStore::new(),
            window: None,
            started_seen: false,
            ticks,
        }
    }

    pub fn local(&self) -> &PlayerId {
        &self.local
    }

    pub fn store(&self) -> &GameStateStore {
        &self.store
    }

    /// Whether a started status has been observed from any channel.
    pub fn started(&self) -> bool {
        self.started_seen
    }

    /// Seconds left on the active reaction window, if one is open.
    pub fn countdown_remaining(&self) -> Option<u64> {
        self.window.as_ref().map(ReactionWindow::remaining)
    }

    /// Applies one authoritative update. The stored snapshot is replaced
    /// unconditionally (last-message-wins: the transport carries no
    /// sequence numbers, so no staleness check is possible).
    pub fn apply_update(&mut self, update: StateUpdate) -> EngineOutput {
        let was_started = self.started_seen;
        let started = update.snapshot.is_started();
        self.store.replace(update.snapshot, update.pending.clone());
        if started {
            self.started_seen = true;
        }

        let prompt = match update.pending {
            // No negotiation accompanies this update: whatever window or
            // prompt was open belongs to a concluded one.
            None => {
                self.close_window();
                None
            }
            Some(pending) => self.dispatch(pending),
        };

        EngineOutput {
            prompt,
            game_started: started && !was_started,
            note: update.note,
        }
    }

    /// Recomputes the prompt from the stored state, re-opening the
    /// reaction window if needed. Used to restore a decision surface
    /// after a failed send so the player can re-attempt manually.
    pub fn reapply_pending(&mut self) -> Option<PromptSpec> {
        match self.store.pending().cloned() {
            Some(pending) => self.dispatch(pending),
            None => {
                self.close_window();
                None
            }
        }
    }

    /// Feeds a countdown tick back into the engine.
    pub fn handle_tick(&mut self, tick: WindowTick) -> TickOutcome {
        match &mut self.window {
            Some(window) if window.id() == tick.id => {
                if tick.remaining == 0 {
                    tracing::debug!(id = %tick.id, "reaction window expired locally");
                    self.window = None;
                    TickOutcome::Expired
                } else {
                    window.record_tick(tick.remaining);
                    TickOutcome::Counting(tick.remaining)
                }
            }
            _ => TickOutcome::Stale,
        }
    }

    /// Builds the request for a turn action.
    ///
    /// Validates turn ownership and target shape only — costs and rule
    /// legality are the authority's business.
    pub fn play(
        &self,
        kind: ActionKind,
        target: Option<PlayerId>,
    ) -> Result<ActionRequest, EngineError> {
        let snapshot = self
            .store
            .snapshot()
            .filter(|s| s.is_started())
            .ok_or(EngineError::NotStarted)?;
        if snapshot.game_over {
            return Err(EngineError::GameOver);
        }
        if !snapshot.is_turn_of(&self.local) {
            return Err(EngineError::NotYourTurn);
        }
        if kind.requires_target() && target.is_none() {
            return Err(EngineError::MissingTarget(kind));
        }
        Ok(ActionRequest::play(kind, target))
    }

    /// Builds the request for a response to the pending negotiation.
    ///
    /// Fails locally — sending nothing — when there is no pending action
    /// or the response does not fit its stage. On success the reaction
    /// window is closed: the player has responded.
    pub fn respond(
        &mut self,
        response: PlayerResponse,
    ) -> Result<ActionRequest, EngineError> {
        let pending = self
            .store
            .pending()
            .ok_or(EngineError::NoPendingAction)?
            .clone();

        let request = match response {
            PlayerResponse::Pass => match pending.stage {
                Stage::Reaction | Stage::BlockReaction => ActionRequest::pass(),
                stage => {
                    return Err(EngineError::WrongStage { verb: "pass", stage })
                }
            },
            PlayerResponse::Challenge => match pending.stage {
                Stage::Reaction => {
                    if !pending.action.is_challengeable() {
                        return Err(EngineError::NotChallengeable(
                            pending.action,
                        ));
                    }
                    ActionRequest::challenge()
                }
                // A block is always a role claim, so always challengeable.
                Stage::BlockReaction => ActionRequest::challenge(),
                stage => {
                    return Err(EngineError::WrongStage {
                        verb: "challenge",
                        stage,
                    })
                }
            },
            PlayerResponse::Block(role) => {
                if pending.stage != Stage::Reaction {
                    return Err(EngineError::WrongStage {
                        verb: "block",
                        stage: pending.stage,
                    });
                }
                let options = ReactionOptions::for_reaction(
                    pending.action,
                    &pending.actor,
                    pending.target.as_ref(),
                    &self.local,
                );
                if !options.block_roles.contains(&role) {
                    return Err(EngineError::IllegalBlock {
                        action: pending.action,
                        role,
                    });
                }
                ActionRequest::block(role)
            }
            PlayerResponse::SelectCard(index) => {
                match pending.stage {
                    Stage::CardSelection | Stage::RevealClaim => {}
                    stage => {
                        return Err(EngineError::WrongStage {
                            verb: "select a card",
                            stage,
                        })
                    }
                }
                if !pending.awaits(&self.local) {
                    return Err(EngineError::NotAwaited);
                }
                let hand = self.local_hand();
                if index >= hand.len() {
                    return Err(EngineError::CardIndexOutOfRange {
                        index,
                        hand: hand.len(),
                    });
                }
                ActionRequest::select_card(index)
            }
        };

        self.close_window();
        Ok(request)
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    fn dispatch(&mut self, pending: PendingAction) -> Option<PromptSpec> {
        match pending.stage {
            Stage::CardSelection => {
                self.close_window();
                if !pending.awaits(&self.local) {
                    return None;
                }
                let mode = if pending.action == ActionKind::Exchange {
                    SelectionMode::Exchange
                } else {
                    SelectionMode::Discard
                };
                Some(PromptSpec::CardSelection {
                    mode,
                    hand: self.local_hand(),
                })
            }

            Stage::RevealClaim => {
                self.close_window();
                if !pending.awaits(&self.local) {
                    return None;
                }
                let Some(required) = pending.required_card else {
                    tracing::warn!(
                        action = %pending.action,
                        "reveal_claim without a required card, ignoring"
                    );
                    return None;
                };
                let hand = self.local_hand();
                let holds_required =
                    hand.iter().any(|slot| slot.is_live(required));
                Some(PromptSpec::RevealClaim {
                    required,
                    holds_required,
                    hand,
                })
            }

            Stage::Reaction => {
                if !pending.action.has_reaction_stage() {
                    // income and coup admit no reaction; the authority
                    // should never send this.
                    tracing::warn!(
                        action = %pending.action,
                        "reaction stage for an unreactable action, ignoring"
                    );
                    self.close_window();
                    return None;
                }
                if pending.actor == self.local {
                    // The window is for everyone except the actor.
                    self.close_window();
                    return None;
                }
                let options = ReactionOptions::for_reaction(
                    pending.action,
                    &pending.actor,
                    pending.target.as_ref(),
                    &self.local,
                );
                let spec = PromptSpec::Reaction {
                    action: pending.action,
                    actor: pending.actor.clone(),
                    options: options.clone(),
                };
                self.ensure_window(pending, options);
                Some(spec)
            }

            Stage::BlockReaction => {
                let Some(blocker) = pending.blocker.clone() else {
                    tracing::warn!("block_reaction without a blocker, ignoring");
                    self.close_window();
                    return None;
                };
                if blocker == self.local {
                    self.close_window();
                    return None;
                }
                let options = ReactionOptions::for_block_reaction();
                let spec = PromptSpec::BlockReaction {
                    action: pending.action,
                    blocker,
                    block_card: pending.block_card,
                    options: options.clone(),
                };
                self.ensure_window(pending, options);
                Some(spec)
            }
        }
    }

    /// Opens a window over `pending` unless one for the same negotiation
    /// is already running. Replacing drops the old window, which aborts
    /// its countdown — at most one countdown runs at a time.
    fn ensure_window(
        &mut self,
        pending: PendingAction,
        options: ReactionOptions,
    ) {
        if let Some(window) = &self.window {
            if window.pending().same_negotiation(&pending) {
                return;
            }
        }
        // Seed from the authority's clock when it is ahead of ours, so a
        // client joining mid-window doesn't count a full one.
        let secs = pending
            .time_remaining
            .map(|t| (t.ceil().max(0.0) as u64).min(REACTION_WINDOW_SECS))
            .unwrap_or(REACTION_WINDOW_SECS);
        self.window = Some(ReactionWindow::open(
            pending,
            options,
            secs,
            self.ticks.clone(),
        ));
    }

    fn close_window(&mut self) {
        if let Some(window) = self.window.take() {
            tracing::debug!(id = %window.id(), "reaction window closed");
        }
    }

    fn local_hand(&self) -> Vec<CardSlot> {
        self.store
            .snapshot()
            .and_then(|s| s.player(&self.local))
            .map(|p| p.hand.clone())
            .unwrap_or_default()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use usurper_protocol::{PlayerView, RoomStatus, Snapshot};

    fn pid(s: &str) -> PlayerId {
        PlayerId::from(s)
    }

    fn player(id: &str, hand: Vec<CardSlot>) -> PlayerView {
        PlayerView {
            id: pid(id),
            name: id.to_uppercase(),
            coins: 2,
            hand,
            alive: true,
        }
    }

    fn started_snapshot(turn: usize) -> Snapshot {
        Snapshot {
            status: RoomStatus::Started,
            players: vec![
                player(
                    "a",
                    vec![
                        CardSlot::secret(Role::Duke),
                        CardSlot::secret(Role::Contessa),
                    ],
                ),
                player("t", vec![CardSlot::masked(), CardSlot::masked()]),
                player("u", vec![CardSlot::masked(), CardSlot::masked()]),
            ],
            turn: Some(turn),
            deck_count: 9,
            trash: vec![],
            game_over: false,
            winner: None,
        }
    }

    fn waiting_snapshot() -> Snapshot {
        Snapshot {
            status: RoomStatus::Waiting,
            players: vec![player("a", vec![]), player("t", vec![])],
            turn: None,
            deck_count: 15,
            trash: vec![],
            game_over: false,
            winner: None,
        }
    }

    fn reaction(action: ActionKind, actor: &str, target: Option<&str>) -> PendingAction {
        PendingAction {
            action,
            actor: pid(actor),
            target: target.map(pid),
            stage: Stage::Reaction,
            awaiting_from: None,
            required_card: None,
            blocker: None,
            block_card: None,
            time_remaining: None,
        }
    }

    fn update(
        snapshot: Snapshot,
        pending: Option<PendingAction>,
    ) -> StateUpdate {
        StateUpdate {
            snapshot,
            pending,
            note: None,
        }
    }

    fn engine_for(local: &str) -> ProtocolEngine {
        let (tx, _rx) = mpsc::unbounded_channel();
        ProtocolEngine::new(pid(local), tx)
    }

    // -----------------------------------------------------------------
    // Reaction dispatch
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_tax_reaction_offers_challenge_and_pass_no_block() {
        let mut engine = engine_for("u");
        let out = engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        match out.prompt {
            Some(PromptSpec::Reaction {
                action, options, ..
            }) => {
                assert_eq!(action, ActionKind::Tax);
                assert!(options.can_challenge);
                assert!(!options.can_block());
            }
            other => panic!("expected reaction prompt, got {other:?}"),
        }
        assert!(engine.countdown_remaining().is_some());
    }

    #[tokio::test]
    async fn test_actor_gets_no_reaction_window() {
        let mut engine = engine_for("a");
        let out = engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        assert_eq!(out.prompt, None);
        assert_eq!(engine.countdown_remaining(), None);
    }

    #[tokio::test]
    async fn test_assassinate_target_sees_block_bystander_does_not() {
        let pending = reaction(ActionKind::Assassinate, "a", Some("t"));

        let mut target = engine_for("t");
        let out = target
            .apply_update(update(started_snapshot(0), Some(pending.clone())));
        match out.prompt {
            Some(PromptSpec::Reaction { options, .. }) => {
                assert!(options.can_challenge);
                assert_eq!(options.block_roles, vec![Role::Contessa]);
            }
            other => panic!("expected reaction prompt, got {other:?}"),
        }

        let mut bystander = engine_for("u");
        let out =
            bystander.apply_update(update(started_snapshot(0), Some(pending)));
        match out.prompt {
            Some(PromptSpec::Reaction { options, .. }) => {
                assert!(options.can_challenge);
                assert!(!options.can_block());
            }
            other => panic!("expected reaction prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_income_reaction_stage_is_ignored() {
        // The authority never opens a reaction for income; if a stray
        // descriptor claims otherwise, no window may open.
        let mut engine = engine_for("u");
        let out = engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Income, "a", None)),
        ));
        assert_eq!(out.prompt, None);
        assert_eq!(engine.countdown_remaining(), None);
    }

    #[tokio::test]
    async fn test_block_reaction_offers_challenge_only_to_others() {
        let mut pending = reaction(ActionKind::ForeignAid, "a", None);
        pending.stage = Stage::BlockReaction;
        pending.blocker = Some(pid("t"));
        pending.block_card = Some(Role::Duke);

        let mut bystander = engine_for("u");
        let out = bystander
            .apply_update(update(started_snapshot(0), Some(pending.clone())));
        match out.prompt {
            Some(PromptSpec::BlockReaction {
                blocker, options, ..
            }) => {
                assert_eq!(blocker, pid("t"));
                assert!(options.can_challenge);
                assert!(!options.can_block());
            }
            other => panic!("expected block-reaction prompt, got {other:?}"),
        }

        let mut blocker = engine_for("t");
        let out =
            blocker.apply_update(update(started_snapshot(0), Some(pending)));
        assert_eq!(out.prompt, None);
        assert_eq!(blocker.countdown_remaining(), None);
    }

    // -----------------------------------------------------------------
    // Forced-disclosure dispatch
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_card_selection_prompts_only_the_awaited_player() {
        let mut pending = reaction(ActionKind::Coup, "a", Some("t"));
        pending.stage = Stage::CardSelection;
        pending.awaiting_from = Some(pid("a"));

        let mut awaited = engine_for("a");
        let out = awaited
            .apply_update(update(started_snapshot(0), Some(pending.clone())));
        match out.prompt {
            Some(PromptSpec::CardSelection { mode, hand }) => {
                assert_eq!(mode, SelectionMode::Discard);
                // Lists the awaited player's current hand.
                assert_eq!(hand.len(), 2);
                assert!(hand[0].is_live(Role::Duke));
            }
            other => panic!("expected card selection, got {other:?}"),
        }

        let mut other = engine_for("u");
        let out = other.apply_update(update(started_snapshot(0), Some(pending)));
        assert_eq!(out.prompt, None);
    }

    #[tokio::test]
    async fn test_exchange_card_selection_uses_exchange_mode() {
        let mut pending = reaction(ActionKind::Exchange, "a", None);
        pending.stage = Stage::CardSelection;
        pending.awaiting_from = Some(pid("a"));

        let mut engine = engine_for("a");
        let out = engine.apply_update(update(started_snapshot(0), Some(pending)));
        assert!(matches!(
            out.prompt,
            Some(PromptSpec::CardSelection {
                mode: SelectionMode::Exchange,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_reveal_claim_highlights_required_card() {
        let mut pending = reaction(ActionKind::Tax, "a", None);
        pending.stage = Stage::RevealClaim;
        pending.awaiting_from = Some(pid("a"));
        pending.required_card = Some(Role::Duke);

        let mut engine = engine_for("a");
        let out = engine.apply_update(update(started_snapshot(0), Some(pending)));
        match out.prompt {
            Some(PromptSpec::RevealClaim {
                required,
                holds_required,
                ..
            }) => {
                assert_eq!(required, Role::Duke);
                assert!(holds_required);
            }
            other => panic!("expected reveal prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reveal_claim_escalation_closes_reaction_window() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        assert!(engine.countdown_remaining().is_some());

        let mut escalated = reaction(ActionKind::Tax, "a", None);
        escalated.stage = Stage::RevealClaim;
        escalated.awaiting_from = Some(pid("a"));
        escalated.required_card = Some(Role::Duke);

        let out = engine.apply_update(update(started_snapshot(0), Some(escalated)));
        assert_eq!(out.prompt, None);
        assert_eq!(engine.countdown_remaining(), None);
    }

    // -----------------------------------------------------------------
    // Window lifecycle
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_update_without_pending_closes_window_and_prompt() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        assert!(engine.countdown_remaining().is_some());

        let out = engine.apply_update(update(started_snapshot(1), None));
        assert_eq!(out.prompt, None);
        assert_eq!(engine.countdown_remaining(), None);
        assert!(engine.store().pending().is_none());
    }

    #[tokio::test]
    async fn test_redelivered_negotiation_keeps_the_running_window() {
        let mut engine = engine_for("u");
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
        engine.ticks = tick_tx;

        let mut first = reaction(ActionKind::Tax, "a", None);
        first.time_remaining = Some(60.0);
        engine.apply_update(update(started_snapshot(0), Some(first.clone())));
        let remaining = engine.countdown_remaining();

        // Same negotiation, older clock: window must not restart.
        let mut redelivered = first.clone();
        redelivered.time_remaining = Some(31.0);
        engine.apply_update(update(started_snapshot(0), Some(redelivered)));
        assert_eq!(engine.countdown_remaining(), remaining);
        assert!(tick_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_new_negotiation_replaces_the_window() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        let first_remaining = engine.countdown_remaining().unwrap();
        assert_eq!(first_remaining, REACTION_WINDOW_SECS);

        let mut second = reaction(ActionKind::Steal, "t", Some("u"));
        second.time_remaining = Some(42.0);
        let out = engine.apply_update(update(started_snapshot(1), Some(second)));
        assert!(matches!(
            out.prompt,
            Some(PromptSpec::Reaction {
                action: ActionKind::Steal,
                ..
            })
        ));
        // New window, seeded from the authority's clock.
        assert_eq!(engine.countdown_remaining(), Some(42));
    }

    #[tokio::test]
    async fn test_stale_tick_from_replaced_window_is_ignored() {
        let mut engine = engine_for("u");
        let (tick_tx, _tick_rx) = mpsc::unbounded_channel();
        engine.ticks = tick_tx;

        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        let old_id = engine.window.as_ref().unwrap().id();

        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Exchange, "a", None)),
        ));

        let outcome = engine.handle_tick(WindowTick {
            id: old_id,
            remaining: 30,
        });
        assert_eq!(outcome, TickOutcome::Stale);
    }

    #[tokio::test]
    async fn test_tick_to_zero_expires_the_window() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        let id = engine.window.as_ref().unwrap().id();

        assert_eq!(
            engine.handle_tick(WindowTick { id, remaining: 3 }),
            TickOutcome::Counting(3)
        );
        assert_eq!(engine.countdown_remaining(), Some(3));

        assert_eq!(
            engine.handle_tick(WindowTick { id, remaining: 0 }),
            TickOutcome::Expired
        );
        assert_eq!(engine.countdown_remaining(), None);

        // A later authoritative update still applies normally.
        let out = engine.apply_update(update(started_snapshot(1), None));
        assert_eq!(out.prompt, None);
        assert_eq!(engine.store().snapshot().unwrap().turn, Some(1));
    }

    // -----------------------------------------------------------------
    // Started transition
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_game_started_fires_once() {
        let mut engine = engine_for("a");
        let out = engine.apply_update(update(waiting_snapshot(), None));
        assert!(!out.game_started);
        assert!(!engine.started());

        let out = engine.apply_update(update(started_snapshot(0), None));
        assert!(out.game_started);
        assert!(engine.started());

        let out = engine.apply_update(update(started_snapshot(1), None));
        assert!(!out.game_started);
    }

    // -----------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_respond_without_pending_is_a_local_error() {
        let mut engine = engine_for("u");
        engine.apply_update(update(started_snapshot(0), None));
        assert!(matches!(
            engine.respond(PlayerResponse::Pass),
            Err(EngineError::NoPendingAction)
        ));
    }

    #[tokio::test]
    async fn test_pass_builds_request_and_closes_window() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        let request = engine.respond(PlayerResponse::Pass).unwrap();
        assert_eq!(request, ActionRequest::pass());
        assert_eq!(engine.countdown_remaining(), None);
    }

    #[tokio::test]
    async fn test_challenge_rejected_for_unchallengeable_action() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::ForeignAid, "a", None)),
        ));
        assert!(matches!(
            engine.respond(PlayerResponse::Challenge),
            Err(EngineError::NotChallengeable(ActionKind::ForeignAid))
        ));
    }

    #[tokio::test]
    async fn test_block_with_wrong_role_is_rejected() {
        let mut engine = engine_for("t");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Assassinate, "a", Some("t"))),
        ));
        assert!(matches!(
            engine.respond(PlayerResponse::Block(Role::Duke)),
            Err(EngineError::IllegalBlock { .. })
        ));
        let request = engine
            .respond(PlayerResponse::Block(Role::Contessa))
            .unwrap();
        assert_eq!(request, ActionRequest::block(Role::Contessa));
    }

    #[tokio::test]
    async fn test_block_by_non_target_is_rejected() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Steal, "a", Some("t"))),
        ));
        assert!(matches!(
            engine.respond(PlayerResponse::Block(Role::Captain)),
            Err(EngineError::IllegalBlock { .. })
        ));
    }

    #[tokio::test]
    async fn test_select_card_validates_awaited_and_index() {
        let mut pending = reaction(ActionKind::Coup, "x", Some("a"));
        pending.stage = Stage::CardSelection;
        pending.awaiting_from = Some(pid("a"));

        let mut engine = engine_for("a");
        engine.apply_update(update(started_snapshot(0), Some(pending.clone())));

        assert!(matches!(
            engine.respond(PlayerResponse::SelectCard(5)),
            Err(EngineError::CardIndexOutOfRange { index: 5, hand: 2 })
        ));
        let request = engine.respond(PlayerResponse::SelectCard(1)).unwrap();
        assert_eq!(request, ActionRequest::select_card(1));

        let mut other = engine_for("u");
        other.apply_update(update(started_snapshot(0), Some(pending)));
        assert!(matches!(
            other.respond(PlayerResponse::SelectCard(0)),
            Err(EngineError::NotAwaited)
        ));
    }

    #[tokio::test]
    async fn test_select_card_rejected_during_reaction() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        assert!(matches!(
            engine.respond(PlayerResponse::SelectCard(0)),
            Err(EngineError::WrongStage { .. })
        ));
    }

    // -----------------------------------------------------------------
    // Turn actions
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_play_requires_a_started_game_and_the_turn() {
        let mut engine = engine_for("t");
        assert!(matches!(
            engine.play(ActionKind::Income, None),
            Err(EngineError::NotStarted)
        ));

        engine.apply_update(update(started_snapshot(0), None));
        assert!(matches!(
            engine.play(ActionKind::Income, None),
            Err(EngineError::NotYourTurn)
        ));

        engine.apply_update(update(started_snapshot(1), None));
        let request = engine.play(ActionKind::Income, None).unwrap();
        assert_eq!(request, ActionRequest::play(ActionKind::Income, None));
    }

    #[tokio::test]
    async fn test_play_targeted_action_requires_target() {
        let mut engine = engine_for("a");
        engine.apply_update(update(started_snapshot(0), None));
        assert!(matches!(
            engine.play(ActionKind::Coup, None),
            Err(EngineError::MissingTarget(ActionKind::Coup))
        ));
        assert!(engine
            .play(ActionKind::Coup, Some(pid("t")))
            .is_ok());
    }

    #[tokio::test]
    async fn test_play_rejected_after_game_over() {
        let mut engine = engine_for("a");
        let mut snap = started_snapshot(0);
        snap.game_over = true;
        engine.apply_update(update(snap, None));
        assert!(matches!(
            engine.play(ActionKind::Income, None),
            Err(EngineError::GameOver)
        ));
    }

    // -----------------------------------------------------------------
    // Re-applying after a failed send
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn test_reapply_pending_restores_window_after_respond() {
        let mut engine = engine_for("u");
        engine.apply_update(update(
            started_snapshot(0),
            Some(reaction(ActionKind::Tax, "a", None)),
        ));
        let _request = engine.respond(PlayerResponse::Pass).unwrap();
        assert_eq!(engine.countdown_remaining(), None);

        // The send failed; the negotiation is still the stored state.
        let prompt = engine.reapply_pending();
        assert!(matches!(prompt, Some(PromptSpec::Reaction { .. })));
        assert!(engine.countdown_remaining().is_some());
    }
}
