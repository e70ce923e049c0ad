//! Session types: the server's record of one participant's connection.

use std::time::Instant;

use gavel_protocol::ParticipantId;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long (in seconds) a disconnected participant has to resume
    /// before their session is permanently expired.
    ///
    /// Default: 120 seconds — long enough to ride out a network blip
    /// mid-auction without losing a standing bid. Set to 0 to disable
    /// resumption entirely.
    pub reconnect_grace_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect_grace_secs: 120,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The current state of a participant's session.
///
/// ```text
///   Connected ──(disconnect)──→ Disconnected ──(grace elapsed)──→ Expired
///       ↑                            │
///       └─────────(resume)───────────┘
/// ```
///
/// `Instant` (monotonic clock) records WHEN the disconnect happened, so
/// the grace period is immune to wall-clock adjustments.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Participant is actively connected.
    Connected,

    /// Participant lost their connection at the given instant. They
    /// have until `since + grace_period` to resume.
    Disconnected { since: Instant },

    /// Grace period elapsed. The session is dead and will be cleaned
    /// up; the participant must handshake fresh for a new identity.
    Expired,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One participant's session on the server.
///
/// Created at handshake; lives until the participant disconnects and
/// the grace period runs out (or the server shuts down).
#[derive(Debug, Clone)]
pub struct Session {
    /// The stable identity issued to this participant. Bids and wins in
    /// every room reference this id, never a transport connection id.
    pub participant_id: ParticipantId,

    /// Current lifecycle state.
    pub state: SessionState,

    /// Secret the client presents to get this identity back after a
    /// dropped connection. 32 hex characters (128 bits of randomness).
    pub resume_token: String,
}
