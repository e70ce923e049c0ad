//! Error types for the protocol layer.
//!
//! Each crate in Gavel defines its own error enum, so a `ProtocolError`
//! always means the problem is in serialization/deserialization — not in
//! networking or room state.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed — malformed JSON, missing fields, wrong
    /// data types, or a truncated message.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message passed deserialization but violates protocol rules —
    /// e.g. a `Hello` with an unsupported version, or an action sent
    /// before the handshake completed.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
