//! Transport adapter for the usurper client.
//!
//! Two channels reach the authoritative service:
//!
//! - the **request/response channel** ([`GameApi`], implemented over HTTP
//!   by [`HttpApi`]) for room management and action submission;
//! - the **push channel** ([`PushSource`], implemented over WebSocket by
//!   [`PushChannel`]) for asynchronous state broadcasts.
//!
//! The adapter decodes frames into typed messages and maps failures into
//! [`TransportError`]; it never interprets message content. There is no
//! automatic retry and no reconnect: a failed request surfaces to the
//! player, a dropped push connection ends the stream.

use std::future::Future;

use usurper_protocol::{
    Ack, ActionRequest, ActionResponse, CreateRoomResponse, PlayerId,
    PushMessage, RoomCode, StateResponse,
};

mod error;
mod http;
mod push;

pub use error::TransportError;
pub use http::HttpApi;
pub use push::PushChannel;

/// The request/response channel to the authoritative service.
///
/// Futures are `Send` so implementations can be shared across the runtime
/// and the lobby poller task.
pub trait GameApi: Send + Sync + 'static {
    /// Creates a room and returns its shareable code.
    fn create_room(
        &self,
        host: &PlayerId,
    ) -> impl Future<Output = Result<CreateRoomResponse, TransportError>> + Send;

    /// Joins a room under the given display name.
    fn join_room(
        &self,
        room: &RoomCode,
        player: &PlayerId,
        nickname: &str,
    ) -> impl Future<Output = Result<Ack, TransportError>> + Send;

    /// Asks the authority to start the game.
    fn start_room(
        &self,
        room: &RoomCode,
    ) -> impl Future<Output = Result<Ack, TransportError>> + Send;

    /// Submits an action or a reaction to the pending negotiation.
    fn submit_action(
        &self,
        room: &RoomCode,
        player: &PlayerId,
        request: &ActionRequest,
    ) -> impl Future<Output = Result<ActionResponse, TransportError>> + Send;

    /// Fetches the masked room state for this viewer.
    fn fetch_state(
        &self,
        room: &RoomCode,
        viewer: &PlayerId,
    ) -> impl Future<Output = Result<StateResponse, TransportError>> + Send;

    /// Leaves the room.
    fn leave_room(
        &self,
        room: &RoomCode,
        player: &PlayerId,
    ) -> impl Future<Output = Result<Ack, TransportError>> + Send;
}

/// The push channel: a stream of typed messages from the authority.
pub trait PushSource: Send + 'static {
    /// Receives the next decodable message.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed. Frames
    /// that fail to decode are logged and skipped — the next good message
    /// re-synchronizes state.
    fn recv(
        &mut self,
    ) -> impl Future<Output = Result<Option<PushMessage>, TransportError>> + Send;

    /// Sends the keepalive ping frame.
    fn ping(
        &mut self,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}
