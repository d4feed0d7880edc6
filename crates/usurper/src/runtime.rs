//! The client runtime: a single event-driven loop tying the layers
//! together.
//!
//! All work is triggered by one of four sources — a push message, a poll
//! result, a countdown tick, or a player command — and every state change
//! re-enters the protocol engine through its single apply-update entry
//! point. Outbound requests run in their own tasks and report back
//! through a channel, so a slow request never blocks the loop from
//! processing a concurrently arriving push message.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use usurper_engine::{
    PlayerResponse, PromptSpec, ProtocolEngine, TickOutcome, WindowTick,
};
use usurper_protocol::{
    Ack, ActionKind, ActionRequest, ActionResponse, PlayerId, PushMessage,
    Snapshot, StateUpdate,
};
use usurper_transport::{GameApi, PushSource, TransportError};

use crate::{LobbyPoller, PromptController, Session};

/// How often the keepalive ping is sent on the push channel.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(25);

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// A command from the player (via whatever frontend renders the view).
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Perform a turn action.
    Play {
        kind: ActionKind,
        target: Option<PlayerId>,
    },
    /// Answer the active decision surface.
    Respond(PlayerResponse),
    /// Ask the authority to start the game.
    StartGame,
    /// Leave the room and shut the runtime down.
    Leave,
}

/// What the presentation layer reads: the latest snapshot, the active
/// decision surface, and the countdown. Published through a `watch`
/// channel — written only by the runtime task, read-only elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub snapshot: Option<Snapshot>,
    pub prompt: Option<PromptSpec>,
    pub countdown: Option<u64>,
}

/// A player-facing line: game log or a transient failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// The caller's side of a running [`ClientRuntime`].
pub struct RuntimeHandle {
    commands: mpsc::UnboundedSender<PlayerCommand>,
    view: watch::Receiver<ViewState>,
    /// Player-facing notices, in arrival order.
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

impl RuntimeHandle {
    /// Sends a player command. Returns `false` if the runtime has exited.
    pub fn command(&self, command: PlayerCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// A fresh watch on the view state.
    pub fn view(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }
}

// ---------------------------------------------------------------------------
// Internal events
// ---------------------------------------------------------------------------

/// Completion of a spawned request task, re-entering the loop.
enum TaskEvent {
    Submitted {
        result: Result<ActionResponse, TransportError>,
        /// Whether this request answered a decision surface (and should
        /// restore it on a transport failure so the player can retry).
        was_response: bool,
    },
    Started(Result<Ack, TransportError>),
    Left(Result<Ack, TransportError>),
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// The event loop around engine, prompts, poller, and transport.
pub struct ClientRuntime<P: PushSource, A: GameApi> {
    push: P,
    ticks: mpsc::UnboundedReceiver<WindowTick>,
    polls: mpsc::UnboundedReceiver<StateUpdate>,
    commands: mpsc::UnboundedReceiver<PlayerCommand>,
    tasks: mpsc::UnboundedReceiver<TaskEvent>,
    core: Core<A>,
}

/// The state the loop operates on; separated from the channels so the
/// select arms can borrow both independently.
struct Core<A: GameApi> {
    session: Session,
    api: Arc<A>,
    engine: ProtocolEngine,
    prompts: PromptController,
    poller: Option<LobbyPoller>,
    view: watch::Sender<ViewState>,
    notices: mpsc::UnboundedSender<Notice>,
    tasks: mpsc::UnboundedSender<TaskEvent>,
}

impl<P: PushSource, A: GameApi> ClientRuntime<P, A> {
    /// Wires up a runtime for `session`. The lobby poller starts
    /// immediately and runs until a started status is observed.
    pub fn new(session: Session, api: A, push: P) -> (Self, RuntimeHandle) {
        let api = Arc::new(api);
        let (tick_tx, tick_rx) = mpsc::unbounded_channel();
        let (poll_tx, poll_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(ViewState::default());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let engine = ProtocolEngine::new(session.player.clone(), tick_tx);
        let poller = LobbyPoller::start(
            Arc::clone(&api),
            session.room.clone(),
            session.player.clone(),
            poll_tx,
        );

        let runtime = Self {
            push,
            ticks: tick_rx,
            polls: poll_rx,
            commands: command_rx,
            tasks: task_rx,
            core: Core {
                session,
                api,
                engine,
                prompts: PromptController::new(),
                poller: Some(poller),
                view: view_tx,
                notices: notice_tx,
                tasks: task_tx,
            },
        };
        let handle = RuntimeHandle {
            commands: command_tx,
            view: view_rx,
            notices: notice_rx,
        };
        (runtime, handle)
    }

    /// Runs until the player leaves or every command sender is dropped.
    pub async fn run(self) {
        let Self {
            mut push,
            mut ticks,
            mut polls,
            mut commands,
            mut tasks,
            mut core,
        } = self;

        let mut keepalive = tokio::time::interval_at(
            tokio::time::Instant::now() + KEEPALIVE_INTERVAL,
            KEEPALIVE_INTERVAL,
        );
        let mut push_open = true;
        let mut running = true;

        tracing::info!(room = %core.session.room, "client runtime started");

        while running {
            tokio::select! {
                msg = push.recv(), if push_open => match msg {
                    Ok(Some(msg)) => core.on_push(msg),
                    Ok(None) => {
                        push_open = false;
                        core.on_push_closed(None);
                    }
                    Err(e) => {
                        push_open = false;
                        core.on_push_closed(Some(e));
                    }
                },
                Some(tick) = ticks.recv() => core.on_tick(tick),
                Some(update) = polls.recv() => core.on_poll(update),
                event = commands.recv() => match event {
                    Some(command) => core.on_command(command),
                    None => running = false,
                },
                Some(event) = tasks.recv() => {
                    if core.on_task(event) {
                        running = false;
                    }
                },
                _ = keepalive.tick(), if push_open => {
                    if let Err(e) = push.ping().await {
                        tracing::debug!(error = %e, "keepalive ping failed");
                    }
                }
            }
        }

        tracing::info!(room = %core.session.room, "client runtime stopped");
    }
}

impl<A: GameApi> Core<A> {
    // -----------------------------------------------------------------
    // Inbound state
    // -----------------------------------------------------------------

    fn on_push(&mut self, msg: PushMessage) {
        match msg.into_update() {
            Ok(Some(update)) => self.apply(update),
            Ok(None) => {} // pong
            Err(e) => {
                // Discard; the next good message re-synchronizes state.
                tracing::warn!(error = %e, "discarding malformed push payload");
            }
        }
    }

    fn on_push_closed(&mut self, error: Option<TransportError>) {
        match &error {
            Some(e) => {
                tracing::warn!(error = %e, "push channel failed")
            }
            None => tracing::info!("push channel closed"),
        }
        // No reconnect: the session keeps serving its last state and
        // player commands, but live updates stop here.
        self.notify(Notice::Error(
            "live connection lost; updates will no longer arrive".into(),
        ));
    }

    fn on_poll(&mut self, update: StateUpdate) {
        // A queued poll result must never overwrite a live game board
        // with a stale lobby view.
        if self.engine.started() {
            return;
        }
        self.apply(update);
    }

    fn on_tick(&mut self, tick: WindowTick) {
        match self.engine.handle_tick(tick) {
            TickOutcome::Counting(_) => self.publish(),
            TickOutcome::Expired => {
                // Local convenience close; the authoritative timeout
                // arrives as a later update.
                self.prompts.sync(None);
                self.publish();
            }
            TickOutcome::Stale => {}
        }
    }

    /// The single path by which any update reaches the engine.
    fn apply(&mut self, update: StateUpdate) {
        let out = self.engine.apply_update(update);
        if out.game_started {
            // The poller must be fully stopped before the game view is
            // published.
            if let Some(poller) = self.poller.take() {
                poller.stop();
            }
        }
        self.prompts.sync(out.prompt);
        if let Some(note) = out.note {
            self.notify(Notice::Info(note));
        }
        self.publish();
    }

    // -----------------------------------------------------------------
    // Player commands
    // -----------------------------------------------------------------

    fn on_command(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play { kind, target } => {
                match self.engine.play(kind, target) {
                    Ok(request) => self.submit(request, false),
                    Err(e) => self.notify(Notice::Error(e.to_string())),
                }
            }
            PlayerCommand::Respond(response) => {
                match self.prompts.choose(&mut self.engine, response) {
                    Ok(request) => {
                        // Surface closed, window closed: show it.
                        self.publish();
                        self.submit(request, true);
                    }
                    Err(e) => self.notify(Notice::Error(e.to_string())),
                }
            }
            PlayerCommand::StartGame => {
                let api = Arc::clone(&self.api);
                let room = self.session.room.clone();
                let tasks = self.tasks.clone();
                tokio::spawn(async move {
                    let result = api.start_room(&room).await;
                    let _ = tasks.send(TaskEvent::Started(result));
                });
            }
            PlayerCommand::Leave => {
                let api = Arc::clone(&self.api);
                let room = self.session.room.clone();
                let player = self.session.player.clone();
                let tasks = self.tasks.clone();
                tokio::spawn(async move {
                    let result = api.leave_room(&room, &player).await;
                    let _ = tasks.send(TaskEvent::Left(result));
                });
            }
        }
    }

    /// Spawns the request so the loop keeps processing push messages
    /// while it is in flight. No automatic retry on failure.
    fn submit(&self, request: ActionRequest, was_response: bool) {
        let api = Arc::clone(&self.api);
        let room = self.session.room.clone();
        let player = self.session.player.clone();
        let tasks = self.tasks.clone();
        tokio::spawn(async move {
            let result = api.submit_action(&room, &player, &request).await;
            let _ = tasks.send(TaskEvent::Submitted {
                result,
                was_response,
            });
        });
    }

    // -----------------------------------------------------------------
    // Request completions
    // -----------------------------------------------------------------

    /// Returns `true` when the runtime should exit.
    fn on_task(&mut self, event: TaskEvent) -> bool {
        match event {
            TaskEvent::Submitted {
                result,
                was_response,
            } => {
                match result {
                    Ok(response) => match response.into_update() {
                        Ok(Some(update)) => self.apply(update),
                        Ok(None) => {}
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                "discarding malformed inline snapshot"
                            );
                        }
                    },
                    Err(e @ TransportError::Rejected { .. }) => {
                        // The authority said no; its message is shown
                        // verbatim and local state stays as-is until the
                        // next legitimate update.
                        self.notify(Notice::Error(e.to_string()));
                    }
                    Err(e) => {
                        self.notify(Notice::Error(format!(
                            "{e}; the request was not delivered — try again"
                        )));
                        if was_response {
                            // Restore the surface so a manual re-attempt
                            // is possible.
                            let prompt = self.engine.reapply_pending();
                            self.prompts.sync(prompt);
                            self.publish();
                        }
                    }
                }
                false
            }
            TaskEvent::Started(result) => {
                if let Err(e) = result {
                    self.notify(Notice::Error(e.to_string()));
                }
                false
            }
            TaskEvent::Left(result) => {
                if let Err(e) = result {
                    self.notify(Notice::Error(e.to_string()));
                }
                self.notify(Notice::Info("left the room".into()));
                true
            }
        }
    }

    // -----------------------------------------------------------------
    // Outputs
    // -----------------------------------------------------------------

    fn publish(&self) {
        self.view.send_replace(ViewState {
            snapshot: self.engine.store().snapshot().cloned(),
            prompt: self.prompts.active().cloned(),
            countdown: self.engine.countdown_remaining(),
        });
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.send(notice);
    }
}
