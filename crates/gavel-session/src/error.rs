//! Error types for the session layer.

/// Errors that can occur during session management.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session exists for the given participant.
    #[error("session not found for participant {0}")]
    NotFound(gavel_protocol::ParticipantId),

    /// The resume token doesn't match anything the server issued.
    /// Could be a stale token, a typo, or a guess.
    #[error("invalid resume token")]
    InvalidToken,

    /// The session's reconnection grace period has elapsed.
    #[error("session expired for participant {0}")]
    SessionExpired(gavel_protocol::ParticipantId),

    /// The participant already has an active (Connected) session —
    /// a resume token was presented while the original connection is
    /// still alive.
    #[error("participant {0} already has an active session")]
    AlreadyConnected(gavel_protocol::ParticipantId),
}
