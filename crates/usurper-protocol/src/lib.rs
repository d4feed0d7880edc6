//! Wire protocol for the usurper client.
//!
//! This crate defines the "language" the client speaks with the
//! authoritative game service:
//!
//! - **Vocabulary** ([`Role`], [`ActionKind`], [`Stage`]) — the closed
//!   sets of cards, actions, and negotiation stages.
//! - **State model** ([`Snapshot`], [`PendingAction`]) — the typed view
//!   of authoritative state, always replaced wholesale.
//! - **Messages** ([`PushMessage`], [`ActionRequest`], responses) — what
//!   travels on the push and request/response channels.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the engine
//! (decisions). It doesn't know about sockets or prompts — it only knows
//! how to turn JSON into typed values and back.
//!
//! ```text
//! Transport (frames) → Protocol (Snapshot/PendingAction) → Engine
//! ```

mod api;
mod error;
mod pending;
mod push;
mod snapshot;
mod types;
mod wire;

pub use api::{
    Ack, ActionRequest, ActionResponse, CreateRoomResponse, RequestVerb,
    StateResponse,
};
pub use error::ProtocolError;
pub use pending::{PendingAction, Stage, REACTION_WINDOW_SECS};
pub use push::{PushMessage, StateUpdate};
pub use snapshot::{PlayerView, Snapshot};
pub use types::{
    ActionKind, BlockPolicy, CardSlot, PlayerId, Role, RoomCode, RoomStatus,
};
pub use wire::{WireGame, WirePlayer, WireState};
