//! Error types for the transport layer.

/// Errors that can occur on either channel.
///
/// `Rejected` is the authority saying no (a protocol violation, reported
/// verbatim to the player); everything else is the network misbehaving
/// (reported as a transient, manually-retryable failure).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request/response channel failed below the protocol level.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The authority rejected a request. `message` is its detail string,
    /// surfaced to the player unchanged.
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Establishing the push connection failed.
    #[error("push connect failed: {0}")]
    Connect(tokio_tungstenite::tungstenite::Error),

    /// The push connection failed mid-stream.
    #[error("push channel failed: {0}")]
    Push(tokio_tungstenite::tungstenite::Error),
}
