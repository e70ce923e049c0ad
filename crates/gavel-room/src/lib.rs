//! Auction room management for Gavel.
//!
//! This crate is the core of the system: the per-item bidding state
//! machine, the room controller that owns a room's participants and
//! dispatches actions into that machine, and the directory that maps
//! shareable room codes to running rooms.
//!
//! Each room runs as an isolated Tokio task (actor model). Every
//! operation on a room flows through the actor's command channel, so
//! bids and final calls are serialized per room by construction — two
//! simultaneous bids can never both increment from the same base price.
//!
//! # Key types
//!
//! - [`BiddingState`] — the pending → bidding → sold/unsold state machine
//! - [`Room`] — one auction session's full state and validation rules
//! - [`RoomHandle`] — send actions to a running room actor
//! - [`RoomDirectory`] — creates rooms, resolves codes, routes actions
//! - [`RoomConfig`] — room settings (participant limit, bid increment)

mod bidding;
mod config;
mod directory;
mod error;
mod room;

pub use bidding::{BidAccepted, BiddingState, CallOutcome, Item};
pub use config::RoomConfig;
pub use directory::RoomDirectory;
pub use error::AuctionError;
pub use room::{Participant, Room, RoomHandle, RoomSender};
