//! Participant identity management for Gavel.
//!
//! This crate owns the one fact the bidding core depends on most:
//! WHO a participant is, independently of any network connection.
//!
//! 1. **Identity issuance** — a fresh [`ParticipantId`] minted at
//!    handshake ([`SessionManager::register`])
//! 2. **Session tracking** — knowing who's connected
//! 3. **Reconnection** — a disconnected participant presents a resume
//!    token and gets the SAME id back, so a standing bid or recorded win
//!    is never orphaned by a dropped connection
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← records bids and wins against ParticipantId
//!     ↕
//! Session Layer (this crate)  ← issues and restores ParticipantId
//!     ↕
//! Protocol Layer (below)  ← provides the ParticipantId type
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig, SessionState};
