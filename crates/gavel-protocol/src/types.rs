//! Core protocol types for Gavel's wire format.
//!
//! Everything in this module travels on the wire: client actions going
//! up to the server, server events fanned back out to every subscriber
//! of a room, and the snapshot structures that describe authoritative
//! room state. The shapes here are the contract with the client SDK —
//! the serde attributes are load-bearing, and the tests at the bottom
//! pin the exact JSON they produce.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a participant (auctioneer or bidder).
///
/// Issued by the session layer at handshake and stable for the life of
/// the session — it survives transport reconnects, so a standing bid or
/// a win recorded against this id stays meaningful after a dropped
/// connection. Never a transport connection id.
///
/// `#[serde(transparent)]` makes `ParticipantId(42)` serialize as the
/// bare number `42`, which is what the client SDK expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room's shareable join code.
///
/// Six uppercase alphanumeric characters, generated when the auctioneer
/// creates the room and handed out-of-band to bidders. Serializes as a
/// plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Item lifecycle status
// ---------------------------------------------------------------------------

/// The lifecycle status of a single auction item (lot).
///
/// ```text
/// Pending ──(start bidding)──→ Bidding ──(final call ×3)──→ Sold
///                                  │                          │
///                                  └──(final call ×3,         │
///                                      no bids)──→ Unsold ────┘ (terminal)
/// ```
///
/// Transitions are owned by the room crate's bidding state machine;
/// this enum is shared vocabulary between domain state and the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ItemStatus {
    /// Uploaded, waiting for the auctioneer to open bidding.
    Pending,
    /// Live: the item currently accepting bids. At most one per room.
    Bidding,
    /// Terminal: sold to the last accepted bidder.
    Sold,
    /// Terminal: the final call completed with no bids.
    Unsold,
}

impl ItemStatus {
    /// Returns `true` for the two terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Sold | Self::Unsold)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Bidding => write!(f, "Bidding"),
            Self::Sold => write!(f, "Sold"),
            Self::Unsold => write!(f, "Unsold"),
        }
    }
}

// ---------------------------------------------------------------------------
// Item payloads
// ---------------------------------------------------------------------------

/// The fields the auctioneer supplies when uploading an item.
///
/// Validation (non-blank fields, positive base value) happens in the
/// room layer; this is just the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    pub club: String,
    pub position: String,
    pub style: String,
    pub base_value: u64,
}

/// Authoritative snapshot of one item, as broadcast to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub name: String,
    pub club: String,
    pub position: String,
    pub style: String,
    pub base_value: u64,
    /// Current price. Equals `base_value` until the first bid lands.
    pub current_bid: u64,
    /// The last accepted bidder, if any bid has been accepted.
    pub highest_bidder: Option<ParticipantId>,
    pub status: ItemStatus,
    /// Set exactly when `status` is [`ItemStatus::Sold`].
    pub winner: Option<ParticipantId>,
}

/// An item a participant has won, with the price it closed at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WonItem {
    pub item: ItemSnapshot,
    pub price: u64,
}

/// A participant as seen by other clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub name: String,
    pub wins: Vec<WonItem>,
}

/// Full authoritative room state, sent on join and on reconnect so a
/// client can rebuild its view from scratch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub name: String,
    pub bid_increment: u64,
    pub max_participants: usize,
    pub auctioneer: ParticipantId,
    pub participants: Vec<ParticipantSummary>,
    pub items: Vec<ItemSnapshot>,
    /// Index into `items` of the item currently in [`ItemStatus::Bidding`].
    pub active_item: Option<usize>,
    /// Final-call countdown stage (0–3); only meaningful while an item
    /// is bidding.
    pub call_stage: u8,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Rejection kinds
// ---------------------------------------------------------------------------

/// The kind of a rejected action, surfaced to the calling client.
///
/// Every kind is a local validation failure: the action is refused, the
/// room and its other participants are unaffected, and nothing is
/// retried automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RejectKind {
    /// The item lifecycle does not permit this transition.
    InvalidTransition,
    /// No item is currently open for bidding.
    NoActiveAuction,
    /// The caller is not a participant of the room (or is the auctioneer
    /// trying to bid).
    UnknownParticipant,
    /// No room exists under the given code.
    RoomNotFound,
    /// The room's participant limit has been reached.
    RoomFull,
    /// Room configuration is invalid (zero limit or increment).
    InvalidConfig,
    /// Item fields failed validation (blank field or zero base value).
    InvalidItem,
    /// The action is reserved for the room's auctioneer.
    NotAuctioneer,
    /// Every uploaded item has already been auctioned.
    NoItemsRemaining,
    /// The room is shutting down and can no longer accept actions.
    RoomUnavailable,
    /// The message itself broke the protocol — wrong version, or an
    /// action sent before the handshake completed.
    ProtocolViolation,
}

// ---------------------------------------------------------------------------
// Client actions
// ---------------------------------------------------------------------------

/// Actions a client sends to the server.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON — e.g.
/// `{ "type": "PlaceBid", "code": "K3XQ7P" }` — which is the easiest
/// shape to produce and switch on from a JavaScript client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientAction {
    /// First message on every connection. A fresh connection sends no
    /// token and is issued a new identity; a reconnecting client sends
    /// the resume token it received in [`ServerEvent::Welcome`] to get
    /// its old [`ParticipantId`] back.
    Hello {
        version: u32,
        resume_token: Option<String>,
    },

    /// Keep-alive. `client_time` is echoed back for RTT measurement.
    Heartbeat { client_time: u64 },

    /// Create an auction room; the caller becomes its auctioneer.
    CreateRoom {
        name: String,
        max_participants: usize,
        bid_increment: u64,
    },

    /// Join an existing room as a bidder.
    JoinRoom {
        code: RoomCode,
        display_name: String,
    },

    /// Auctioneer only: add an item to the room's lot list.
    UploadItem { code: RoomCode, item: ItemDraft },

    /// Auctioneer only: open bidding on the first pending item.
    StartBidding { code: RoomCode },

    /// Bidder only: raise the current bid by the room's fixed increment.
    PlaceBid { code: RoomCode },

    /// Auctioneer only: advance the three-stage final-call countdown.
    FinalCall { code: RoomCode },

    /// Auctioneer only: close the room for good.
    EndRoom { code: RoomCode },

    /// Client is going away; `reason` is logged server-side.
    Disconnect { reason: String },
}

// ---------------------------------------------------------------------------
// Server events
// ---------------------------------------------------------------------------

/// Events the server sends to clients — direct replies and room-wide
/// broadcasts share this one enum, so a client has a single decode path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to [`ClientAction::Hello`]: the participant's stable
    /// identity and the secret token that restores it after a dropped
    /// connection. `resumed` is `true` when an old identity was
    /// restored rather than a new one issued.
    Welcome {
        participant_id: ParticipantId,
        resume_token: String,
        resumed: bool,
        server_time: u64,
    },

    /// Reply to [`ClientAction::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Reply to the auctioneer: the room exists, share the code.
    RoomCreated {
        code: RoomCode,
        name: String,
        bid_increment: u64,
        max_participants: usize,
    },

    /// Reply to a joiner: you're in.
    RoomJoined {
        code: RoomCode,
        participant_id: ParticipantId,
    },

    /// Full authoritative state, sent to a client on join and on
    /// reconnect.
    RoomSnapshot { room: RoomSnapshot },

    /// Broadcast: the participant roster changed.
    ParticipantsUpdate {
        participants: Vec<ParticipantSummary>,
    },

    /// Broadcast: an item was uploaded or changed lifecycle status.
    ItemUpdate { item: ItemSnapshot },

    /// Broadcast: a bid was accepted on the active item.
    BidUpdate {
        current_bid: u64,
        highest_bidder: Option<ParticipantId>,
        highest_bidder_name: Option<String>,
    },

    /// Broadcast: advisory final-call notification ("First Call",
    /// "Second Call"). Stage 3 resolves as [`ServerEvent::ItemSold`] or
    /// [`ServerEvent::ItemUnsold`] instead.
    CallStage { stage: u8, label: String },

    /// Broadcast: the active item sold on the third call.
    ItemSold {
        item: ItemSnapshot,
        winner: ParticipantId,
        winner_name: String,
        price: u64,
    },

    /// Broadcast: the final call completed with no bids.
    ItemUnsold { item: ItemSnapshot },

    /// Broadcast: the auctioneer closed the room.
    RoomClosed { code: RoomCode },

    /// Direct reply: the action was refused. The room is unaffected.
    Rejected { kind: RejectKind, message: String },
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Top-level wrapper for every client → server message.
///
/// `seq` is the sender's own auto-incrementing counter (used to spot
/// missing or reordered messages while debugging); `timestamp` is
/// milliseconds since the sender started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientEnvelope {
    pub seq: u64,
    pub timestamp: u64,
    pub action: ClientAction,
}

/// Top-level wrapper for every server → client message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEnvelope {
    pub seq: u64,
    pub timestamp: u64,
    pub event: ServerEvent,
}

// =========================================================================
// Tests
// =========================================================================
