//! Error types for the room layer.
//!
//! Every variant except `Unavailable` is a local validation failure:
//! the action is refused, the room's state is untouched, and the other
//! participants never notice. `kind()` maps each variant to the wire
//! [`RejectKind`] sent back to the offending client.

use gavel_protocol::{ParticipantId, RejectKind, RoomCode};

/// Errors that can occur during auction room operations.
#[derive(Debug, thiserror::Error)]
pub enum AuctionError {
    /// The item lifecycle does not permit this transition — e.g.
    /// opening bidding while another item is still on the block.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// No item is currently open for bidding.
    #[error("no item is currently open for bidding")]
    NoActiveAuction,

    /// The caller is not a bidder in this room. Also covers the
    /// auctioneer trying to bid on their own lot.
    #[error("participant {0} is not a bidder in this room")]
    UnknownParticipant(ParticipantId),

    /// No room exists under the given code (or it has been closed).
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room's participant limit has been reached.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// Room configuration failed validation.
    #[error("invalid room config: {0}")]
    InvalidConfig(String),

    /// Item fields failed validation.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// The action is reserved for the room's auctioneer.
    #[error("only the auctioneer may {0}")]
    NotAuctioneer(&'static str),

    /// Every uploaded item has already been auctioned.
    #[error("all items have been auctioned")]
    NoItemsRemaining,

    /// The room actor's command channel is closed — the room is
    /// shutting down.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl AuctionError {
    /// The wire-level rejection kind for this error.
    pub fn kind(&self) -> RejectKind {
        match self {
            Self::InvalidTransition(_) => RejectKind::InvalidTransition,
            Self::NoActiveAuction => RejectKind::NoActiveAuction,
            Self::UnknownParticipant(_) => RejectKind::UnknownParticipant,
            Self::RoomNotFound(_) => RejectKind::RoomNotFound,
            Self::RoomFull(_) => RejectKind::RoomFull,
            Self::InvalidConfig(_) => RejectKind::InvalidConfig,
            Self::InvalidItem(_) => RejectKind::InvalidItem,
            Self::NotAuctioneer(_) => RejectKind::NotAuctioneer,
            Self::NoItemsRemaining => RejectKind::NoItemsRemaining,
            Self::Unavailable(_) => RejectKind::RoomUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_maps_to_a_distinct_kind() {
        let code = RoomCode::from("AB12CD");
        let errors = [
            AuctionError::InvalidTransition("x".into()),
            AuctionError::NoActiveAuction,
            AuctionError::UnknownParticipant(ParticipantId(1)),
            AuctionError::RoomNotFound(code.clone()),
            AuctionError::RoomFull(code.clone()),
            AuctionError::InvalidConfig("x".into()),
            AuctionError::InvalidItem("x".into()),
            AuctionError::NotAuctioneer("upload items"),
            AuctionError::NoItemsRemaining,
            AuctionError::Unavailable(code),
        ];
        let mut kinds: Vec<RejectKind> =
            errors.iter().map(|e| e.kind()).collect();
        kinds.dedup();
        assert_eq!(kinds.len(), errors.len());
    }

    #[test]
    fn test_display_includes_room_code() {
        let err = AuctionError::RoomFull(RoomCode::from("K3XQ7P"));
        assert!(err.to_string().contains("K3XQ7P"));
    }
}
