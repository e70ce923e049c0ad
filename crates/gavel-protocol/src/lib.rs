//! Wire protocol for Gavel.
//!
//! This crate defines the "language" that auction clients and the server
//! speak:
//!
//! - **Types** ([`ClientEnvelope`], [`ServerEnvelope`], [`ClientAction`],
//!   [`ServerEvent`], the snapshot structs) — the message structures that
//!   travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (participant identity). It doesn't know about connections or rooms —
//! it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (envelopes) → Session (participant context)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientAction, ClientEnvelope, ItemDraft, ItemSnapshot, ItemStatus,
    ParticipantId, ParticipantSummary, RejectKind, RoomCode, RoomSnapshot,
    ServerEnvelope, ServerEvent, WonItem,
};
