//! Error type for the client facade.

use usurper_engine::EngineError;
use usurper_protocol::ProtocolError;
use usurper_transport::TransportError;

/// Anything that can go wrong at the facade level.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A choice was made with no decision surface open.
    #[error("no decision surface is open")]
    NoPrompt,
}
