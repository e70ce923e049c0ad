//! Unified error type for the Gavel server.

use gavel_protocol::ProtocolError;
use gavel_room::AuctionError;
use gavel_session::SessionError;
use gavel_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GavelError {
    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (resume token, expiry).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// An auction-level error (room state, bidding rules).
    #[error(transparent)]
    Auction(#[from] AuctionError),
}
