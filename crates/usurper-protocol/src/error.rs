//! Error types for the protocol layer.

/// Errors that can occur while decoding or normalizing wire payloads.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The payload is not valid JSON, or does not match any known shape.
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    /// A card name that is neither a known role nor the viewer mask.
    #[error("unknown card name: {0:?}")]
    UnknownCard(String),
}
