//! Protocol engine for the usurper client.
//!
//! The engine is the single in-client authority for "what must the local
//! player do right now". It consumes normalized state updates — from the
//! push channel, the lobby poller, or an inline action response — through
//! one entry point, replaces the stored snapshot wholesale, manages the
//! bounded-time reaction window, and decides which decision surface (if
//! any) the player should see.
//!
//! It never predicts authority-side outcomes: every response the player
//! makes is turned into a typed request, and the engine waits for the
//! next update to reflect the resolution.
//!
//! # Key types
//!
//! - [`ProtocolEngine`] — the state machine
//! - [`GameStateStore`] — latest snapshot + pending action, replace-only
//! - [`ReactionWindow`] — the countdown attached to a reaction stage
//! - [`PromptSpec`] — the decision surface the player should be shown

mod engine;
mod error;
mod store;
mod window;

pub use engine::{
    EngineOutput, PlayerResponse, PromptSpec, ProtocolEngine, SelectionMode,
    TickOutcome,
};
pub use error::EngineError;
pub use store::GameStateStore;
pub use window::{ReactionOptions, ReactionWindow, WindowId, WindowTick};
