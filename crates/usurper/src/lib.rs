//! # Usurper
//!
//! Client runtime for a turn-based social-deduction card game played over
//! a network. The authoritative rules engine runs elsewhere; this crate
//! renders its state trustworthy-side-up: it synchronizes snapshots from
//! push and polling, drives the player through the reaction protocol
//! (challenge, block, pass, forced reveals and discards), and turns their
//! choices into requests — never predicting the authority's answer.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use usurper::prelude::*;
//!
//! # async fn demo() -> Result<(), usurper::ClientError> {
//! let api = HttpApi::new("http://localhost:8000");
//! let session =
//!     Session::create(&api, PlayerId::from("g-1"), "alice").await?;
//!
//! let url = PushChannel::endpoint(api.base(), &session.room, &session.player);
//! let push = PushChannel::connect(&url).await?;
//!
//! let (runtime, handle) = ClientRuntime::new(session, api, push);
//! tokio::spawn(runtime.run());
//!
//! handle.command(PlayerCommand::StartGame);
//! # Ok(())
//! # }
//! ```

mod error;
mod poller;
mod prompt;
mod runtime;
mod session;

pub use error::ClientError;
pub use poller::LobbyPoller;
pub use prompt::PromptController;
pub use runtime::{
    ClientRuntime, Notice, PlayerCommand, RuntimeHandle, ViewState,
};
pub use session::Session;

/// The common imports for building a frontend.
pub mod prelude {
    pub use crate::{
        ClientError, ClientRuntime, Notice, PlayerCommand, RuntimeHandle,
        Session, ViewState,
    };
    pub use usurper_engine::{
        PlayerResponse, PromptSpec, SelectionMode,
    };
    pub use usurper_protocol::{
        ActionKind, CardSlot, PlayerId, Role, RoomCode, RoomStatus, Snapshot,
    };
    pub use usurper_transport::{GameApi, HttpApi, PushChannel, PushSource};
}
