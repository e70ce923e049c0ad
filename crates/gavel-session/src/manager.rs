//! The session manager: issues participant identities and tracks them.
//!
//! Responsibilities:
//! - Minting a fresh [`ParticipantId`] + resume token at handshake
//! - Tracking which participants are connected/disconnected
//! - Restoring identity from a resume token within the grace period
//! - Expiring sessions after the grace period and cleaning them up
//!
//! # Concurrency note
//!
//! `SessionManager` is NOT thread-safe by itself — it uses a plain
//! `HashMap`, not a concurrent one. This is intentional: the manager is
//! owned by the server and accessed through a mutex at a higher level.
//! Keeping it simple here avoids hidden locking overhead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use gavel_protocol::ParticipantId;
use rand::Rng;

use crate::{Session, SessionConfig, SessionError, SessionState};

/// Issues and tracks participant sessions.
///
/// ## Lifecycle
///
/// ```text
/// register() ──→ [Connected] ──disconnect()──→ [Disconnected]
///                     ↑                              │
///                     └────────── resume() ──────────┤
///                                                    ▼ (grace elapsed)
///                                   expire_stale() → [Expired] → cleanup_expired()
/// ```
pub struct SessionManager {
    /// All sessions, keyed by participant id.
    sessions: HashMap<ParticipantId, Session>,

    /// Index from resume tokens to participant ids, kept in sync with
    /// `sessions`. A resuming client sends a token, not an id; this map
    /// resolves it without scanning every session.
    tokens: HashMap<String, ParticipantId>,

    /// Next identity to mint. Ids are never reused within a process.
    next_id: u64,

    config: SessionConfig,
}

impl SessionManager {
    /// Creates a new, empty session manager with the given config.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            tokens: HashMap::new(),
            next_id: 1,
            config,
        }
    }

    /// Issues a fresh identity for a newly handshaking client.
    ///
    /// Unlike a login system, there is nothing to verify — identity here
    /// is a capability: whoever holds the returned resume token IS this
    /// participant. The id is minted from a monotonic counter so it can
    /// never collide with a reconnecting participant's id.
    pub fn register(&mut self) -> &Session {
        let participant_id = ParticipantId(self.next_id);
        self.next_id += 1;

        let token = generate_token();
        let session = Session {
            participant_id,
            state: SessionState::Connected,
            resume_token: token.clone(),
        };

        // Insert into both maps to keep them in sync.
        self.tokens.insert(token, participant_id);
        self.sessions.insert(participant_id, session);

        tracing::info!(%participant_id, "session issued");

        self.sessions
            .get(&participant_id)
            .expect("just inserted")
    }

    /// Marks a participant as disconnected. Starts the grace period.
    ///
    /// The session isn't destroyed — the participant has
    /// `config.reconnect_grace_secs` to resume with their token, and any
    /// standing bid they hold in a room remains valid throughout.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no session exists.
    pub fn disconnect(
        &mut self,
        participant_id: ParticipantId,
    ) -> Result<(), SessionError> {
        let session = self
            .sessions
            .get_mut(&participant_id)
            .ok_or(SessionError::NotFound(participant_id))?;

        session.state = SessionState::Disconnected {
            since: Instant::now(),
        };

        tracing::info!(%participant_id, "participant disconnected, grace period started");
        Ok(())
    }

    /// Restores a participant's identity from their resume token.
    ///
    /// On success the session transitions back to Connected and the
    /// SAME [`ParticipantId`] is live again — `highest_bidder` fields
    /// and win history referencing it stay meaningful.
    ///
    /// # Errors
    /// - [`SessionError::InvalidToken`] — token not recognized
    /// - [`SessionError::SessionExpired`] — grace period elapsed
    /// - [`SessionError::AlreadyConnected`] — the original connection
    ///   is still live
    pub fn resume(
        &mut self,
        token: &str,
    ) -> Result<&Session, SessionError> {
        let participant_id = self
            .tokens
            .get(token)
            .copied()
            .ok_or(SessionError::InvalidToken)?;

        let session = self
            .sessions
            .get_mut(&participant_id)
            .ok_or(SessionError::InvalidToken)?;

        match &session.state {
            SessionState::Disconnected { since } => {
                let grace =
                    Duration::from_secs(self.config.reconnect_grace_secs);
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    return Err(SessionError::SessionExpired(participant_id));
                }
                session.state = SessionState::Connected;
                tracing::info!(%participant_id, "participant resumed");
                Ok(self
                    .sessions
                    .get(&participant_id)
                    .expect("just modified"))
            }
            SessionState::Connected => {
                Err(SessionError::AlreadyConnected(participant_id))
            }
            SessionState::Expired => {
                Err(SessionError::SessionExpired(participant_id))
            }
        }
    }

    /// Scans all sessions and expires any past the grace period.
    ///
    /// Call periodically. Returns the participant ids that expired, so
    /// higher layers can react (e.g. log that a bidder is gone for good)
    /// before [`cleanup_expired`](Self::cleanup_expired) deletes them.
    pub fn expire_stale(&mut self) -> Vec<ParticipantId> {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        let mut expired = Vec::new();

        for session in self.sessions.values_mut() {
            if let SessionState::Disconnected { since } = &session.state {
                if since.elapsed() > grace {
                    session.state = SessionState::Expired;
                    expired.push(session.participant_id);
                    tracing::info!(
                        participant_id = %session.participant_id,
                        "session expired (grace period elapsed)"
                    );
                }
            }
        }

        expired
    }

    /// Removes all expired sessions and invalidates their tokens.
    pub fn cleanup_expired(&mut self) {
        self.sessions.retain(|_, session| {
            if matches!(session.state, SessionState::Expired) {
                self.tokens.remove(&session.resume_token);
                false
            } else {
                true
            }
        });
    }

    /// Looks up a session by participant id.
    pub fn get(&self, participant_id: &ParticipantId) -> Option<&Session> {
        self.sessions.get(participant_id)
    }

    /// Returns the number of tracked sessions (any state).
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random 32-character hex string (128 bits of entropy).
///
/// Only the server and the specific client know this value; 128 bits
/// makes guessing a valid token computationally infeasible.
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionManager`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! # Testing time-dependent behavior
    //!
    //! Grace-period expiry depends on elapsed time. Instead of sleeping
    //! (slow, flaky), two configs cover both sides of the boundary:
    //!   - `reconnect_grace_secs: 0` → sessions expire immediately
    //!   - `reconnect_grace_secs: 3600` → sessions never expire in-test

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn manager_with_instant_expiry() -> SessionManager {
        SessionManager::new(SessionConfig {
            reconnect_grace_secs: 0,
        })
    }

    fn manager_with_long_grace() -> SessionManager {
        SessionManager::new(SessionConfig {
            reconnect_grace_secs: 3600,
        })
    }

    // =====================================================================
    // register()
    // =====================================================================

    #[test]
    fn test_register_issues_connected_session() {
        let mut mgr = manager_with_long_grace();

        let session = mgr.register();

        assert!(matches!(session.state, SessionState::Connected));
        assert_eq!(session.resume_token.len(), 32);
    }

    #[test]
    fn test_register_issues_sequential_unique_ids() {
        // Ids come from a monotonic counter — no reuse, no collision
        // with a participant who might still resume.
        let mut mgr = manager_with_long_grace();

        let id1 = mgr.register().participant_id;
        let id2 = mgr.register().participant_id;
        let id3 = mgr.register().participant_id;

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert!(id1.0 < id2.0 && id2.0 < id3.0);
    }

    #[test]
    fn test_register_issues_unique_tokens() {
        // If tokens collided, one participant could resume as another.
        let mut mgr = manager_with_long_grace();

        let token1 = mgr.register().resume_token.clone();
        let token2 = mgr.register().resume_token.clone();

        assert_ne!(token1, token2, "tokens must be unique per session");
    }

    // =====================================================================
    // disconnect()
    // =====================================================================

    #[test]
    fn test_disconnect_connected_becomes_disconnected() {
        let mut mgr = manager_with_long_grace();
        let id = mgr.register().participant_id;

        mgr.disconnect(id).expect("should succeed");

        let session = mgr.get(&id).expect("session should still exist");
        assert!(
            matches!(session.state, SessionState::Disconnected { .. }),
            "state should be Disconnected, got {:?}",
            session.state
        );
    }

    #[test]
    fn test_disconnect_unknown_participant_returns_not_found() {
        let mut mgr = manager_with_long_grace();

        let result = mgr.disconnect(ParticipantId(99));

        assert!(matches!(
            result,
            Err(SessionError::NotFound(ParticipantId(99)))
        ));
    }

    #[test]
    fn test_disconnect_preserves_resume_token() {
        // The token must survive a disconnect — it's how the
        // participant gets back in.
        let mut mgr = manager_with_long_grace();
        let session = mgr.register();
        let id = session.participant_id;
        let token = session.resume_token.clone();

        mgr.disconnect(id).unwrap();

        assert_eq!(mgr.get(&id).unwrap().resume_token, token);
    }

    // =====================================================================
    // resume()
    // =====================================================================

    #[test]
    fn test_resume_valid_token_restores_same_identity() {
        // The property the bidding core depends on: the id after resume
        // is the SAME id, so a standing bid stays attached to it.
        let mut mgr = manager_with_long_grace();
        let session = mgr.register();
        let id = session.participant_id;
        let token = session.resume_token.clone();
        mgr.disconnect(id).unwrap();

        let restored = mgr.resume(&token).expect("should succeed");

        assert!(matches!(restored.state, SessionState::Connected));
        assert_eq!(restored.participant_id, id);
    }

    #[test]
    fn test_resume_invalid_token_returns_error() {
        let mut mgr = manager_with_long_grace();
        let id = mgr.register().participant_id;
        mgr.disconnect(id).unwrap();

        let result = mgr.resume("not-a-real-token");

        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_resume_after_grace_period_returns_expired() {
        let mut mgr = manager_with_instant_expiry();
        let session = mgr.register();
        let id = session.participant_id;
        let token = session.resume_token.clone();
        mgr.disconnect(id).unwrap();

        let result = mgr.resume(&token);

        assert!(
            matches!(result, Err(SessionError::SessionExpired(p)) if p == id)
        );
    }

    #[test]
    fn test_resume_while_still_connected_returns_error() {
        // A token presented while the original connection is live is
        // either a duplicate tab or a stolen token — refuse it.
        let mut mgr = manager_with_long_grace();
        let token = mgr.register().resume_token.clone();

        let result = mgr.resume(&token);

        assert!(matches!(result, Err(SessionError::AlreadyConnected(_))));
    }

    // =====================================================================
    // expire_stale() / cleanup_expired()
    // =====================================================================

    #[test]
    fn test_expire_stale_expires_only_disconnected() {
        let mut mgr = manager_with_instant_expiry();
        let id1 = mgr.register().participant_id;
        let id2 = mgr.register().participant_id;
        mgr.disconnect(id1).unwrap();
        // id2 stays connected.

        let expired = mgr.expire_stale();

        assert_eq!(expired, vec![id1]);
        assert!(matches!(
            mgr.get(&id2).unwrap().state,
            SessionState::Connected
        ));
    }

    #[test]
    fn test_expire_stale_skips_sessions_within_grace() {
        let mut mgr = manager_with_long_grace();
        let id = mgr.register().participant_id;
        mgr.disconnect(id).unwrap();

        let expired = mgr.expire_stale();

        assert!(expired.is_empty());
    }

    #[test]
    fn test_cleanup_expired_removes_expired_sessions() {
        let mut mgr = manager_with_instant_expiry();
        let id = mgr.register().participant_id;
        mgr.disconnect(id).unwrap();
        mgr.expire_stale();
        assert_eq!(mgr.len(), 1);

        mgr.cleanup_expired();

        assert_eq!(mgr.len(), 0);
        assert!(mgr.get(&id).is_none());
    }

    #[test]
    fn test_cleanup_expired_invalidates_old_token() {
        // A token must not resurrect a session that was fully removed.
        let mut mgr = manager_with_instant_expiry();
        let session = mgr.register();
        let id = session.participant_id;
        let token = session.resume_token.clone();
        mgr.disconnect(id).unwrap();
        mgr.expire_stale();
        mgr.cleanup_expired();

        let result = mgr.resume(&token);

        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_cleanup_expired_preserves_active_sessions() {
        let mut mgr = manager_with_instant_expiry();
        let id1 = mgr.register().participant_id;
        let id2 = mgr.register().participant_id;
        mgr.disconnect(id1).unwrap();
        mgr.expire_stale();

        mgr.cleanup_expired();

        assert!(mgr.get(&id1).is_none());
        assert!(mgr.get(&id2).is_some());
    }

    // =====================================================================
    // Full lifecycle
    // =====================================================================

    #[test]
    fn test_full_lifecycle_disconnect_mid_auction_and_resume() {
        // The scenario the grace period exists for: a bidder's WiFi
        // drops while they hold the highest bid, and they come back.
        let mut mgr = manager_with_long_grace();

        let session = mgr.register();
        let id = session.participant_id;
        let token = session.resume_token.clone();

        mgr.disconnect(id).unwrap();
        assert!(matches!(
            mgr.get(&id).unwrap().state,
            SessionState::Disconnected { .. }
        ));

        let restored = mgr.resume(&token).unwrap();
        assert_eq!(restored.participant_id, id);
    }

    #[test]
    fn test_multiple_participants_independent_lifecycles() {
        let mut mgr = manager_with_long_grace();

        let s1 = mgr.register();
        let (id1, token1) = (s1.participant_id, s1.resume_token.clone());
        let s2 = mgr.register();
        let (id2, token2) = (s2.participant_id, s2.resume_token.clone());

        mgr.disconnect(id1).unwrap();
        mgr.resume(&token1).unwrap();

        // Participant 2 was never touched.
        assert!(matches!(
            mgr.get(&id2).unwrap().state,
            SessionState::Connected
        ));

        mgr.disconnect(id2).unwrap();
        mgr.resume(&token2).unwrap();

        assert!(matches!(
            mgr.get(&id1).unwrap().state,
            SessionState::Connected
        ));
        assert!(matches!(
            mgr.get(&id2).unwrap().state,
            SessionState::Connected
        ));
    }
}
