//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and raw bytes. The protocol layer
//! doesn't care HOW messages are serialized — it just needs something
//! that implements the [`Codec`] trait, so a binary codec can be swapped
//! in later without touching any other layer.
//!
//! Currently we provide [`JsonCodec`] (human-readable, easy to inspect
//! from browser DevTools while developing the auction clients).

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec is shared across the
/// connection-handler tasks Tokio spawns. The methods are generic over
/// any serde-compatible type, so the same codec instance handles both
/// envelope directions.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use gavel_protocol::{
///     ClientAction, ClientEnvelope, Codec, JsonCodec, RoomCode,
/// };
///
/// let codec = JsonCodec;
///
/// let envelope = ClientEnvelope {
///     seq: 1,
///     timestamp: 5000,
///     action: ClientAction::PlaceBid { code: RoomCode::from("K3XQ7P") },
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: ClientEnvelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
