//! # Gavel
//!
//! Live auction coordinator: one auctioneer creates a room and puts
//! items on the block one at a time; bidders raise the price in fixed
//! increments until the auctioneer closes the lot with a three-stage
//! final call.
//!
//! The server is authoritative: every bid and call is validated and
//! applied by a per-room actor, and the resulting state is broadcast to
//! every client in the room. This crate ties the layers together:
//! transport → protocol → session → room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gavel::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), GavelError> {
//!     let server = GavelServerBuilder::new()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::GavelError;
pub use server::{GavelServer, GavelServerBuilder, PROTOCOL_VERSION};

/// Everything a server binary or wire-level test typically needs.
pub mod prelude {
    pub use crate::{GavelError, GavelServer, GavelServerBuilder, PROTOCOL_VERSION};

    pub use gavel_protocol::{
        ClientAction, ClientEnvelope, Codec, ItemDraft, ItemSnapshot,
        ItemStatus, JsonCodec, ParticipantId, ParticipantSummary,
        ProtocolError, RejectKind, RoomCode, RoomSnapshot, ServerEnvelope,
        ServerEvent, WonItem,
    };
    pub use gavel_room::{AuctionError, RoomConfig, RoomDirectory};
    pub use gavel_session::{SessionConfig, SessionError, SessionManager};
    pub use gavel_transport::TransportError;
}
