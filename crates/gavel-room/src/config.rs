//! Room configuration.

use serde::{Deserialize, Serialize};

use crate::AuctionError;

/// Configuration for one auction room, chosen by the auctioneer at
/// creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Human-readable room name shown to bidders.
    pub name: String,

    /// Maximum number of bidders allowed in the room. The auctioneer
    /// does not count against this limit.
    pub max_participants: usize,

    /// Fixed amount added to the current bid by each accepted bid.
    pub bid_increment: u64,
}

impl RoomConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`AuctionError::InvalidConfig`] when `max_participants`
    /// or `bid_increment` is zero, or the name is blank.
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.name.trim().is_empty() {
            return Err(AuctionError::InvalidConfig(
                "room name must not be blank".into(),
            ));
        }
        if self.max_participants == 0 {
            return Err(AuctionError::InvalidConfig(
                "max_participants must be positive".into(),
            ));
        }
        if self.bid_increment == 0 {
            return Err(AuctionError::InvalidConfig(
                "bid_increment must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            name: "Auction".to_string(),
            max_participants: 20,
            bid_increment: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default_is_valid() {
        let config = RoomConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_participants, 20);
        assert_eq!(config.bid_increment, 100);
    }

    #[test]
    fn test_zero_max_participants_rejected() {
        let config = RoomConfig {
            max_participants: 0,
            ..RoomConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuctionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_zero_bid_increment_rejected() {
        let config = RoomConfig {
            bid_increment: 0,
            ..RoomConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuctionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_blank_name_rejected() {
        let config = RoomConfig {
            name: "   ".to_string(),
            ..RoomConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuctionError::InvalidConfig(_))
        ));
    }
}
