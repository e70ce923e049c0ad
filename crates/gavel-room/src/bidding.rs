//! The bidding state machine: one item at a time moves through
//! `Pending → Bidding → {Sold, Unsold}` under guarded transitions.
//!
//! This module owns every rule about prices and item lifecycle:
//!
//! - at most one item is in `Bidding` at any time, and it is exactly
//!   `items[active]` when `active` is `Some`
//! - `current_bid` only moves in steps of the fixed increment, so after
//!   k accepted bids it is always `base_value + k * increment`
//! - `highest_bidder` is `None` exactly until the first accepted bid
//! - any accepted bid resets the final-call countdown to zero
//! - the third consecutive call resolves the item: sold to the last
//!   accepted bidder, or unsold when nobody bid
//!
//! Callers are expected to serialize access per room (the room actor
//! does this); the methods here are plain `&mut self` and atomic —
//! each either fully applies or returns an error leaving state intact.

use gavel_protocol::{ItemDraft, ItemSnapshot, ItemStatus, ParticipantId};

use crate::AuctionError;

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// One lot in the auction.
///
/// Fields are read-only outside this module; all mutation goes through
/// [`BiddingState`] so the lifecycle invariants can't be bypassed.
#[derive(Debug, Clone)]
pub struct Item {
    name: String,
    club: String,
    position: String,
    style: String,
    base_value: u64,
    current_bid: u64,
    highest_bidder: Option<ParticipantId>,
    status: ItemStatus,
    winner: Option<ParticipantId>,
}

impl Item {
    /// Builds a pending item from an upload, validating its fields.
    ///
    /// # Errors
    /// Returns [`AuctionError::InvalidItem`] when `base_value` is zero
    /// or any text field is blank.
    fn from_draft(draft: ItemDraft) -> Result<Self, AuctionError> {
        for (field, value) in [
            ("name", &draft.name),
            ("club", &draft.club),
            ("position", &draft.position),
            ("style", &draft.style),
        ] {
            if value.trim().is_empty() {
                return Err(AuctionError::InvalidItem(format!(
                    "{field} must not be blank"
                )));
            }
        }
        if draft.base_value == 0 {
            return Err(AuctionError::InvalidItem(
                "base_value must be positive".into(),
            ));
        }

        Ok(Self {
            name: draft.name,
            club: draft.club,
            position: draft.position,
            style: draft.style,
            base_value: draft.base_value,
            current_bid: draft.base_value,
            highest_bidder: None,
            status: ItemStatus::Pending,
            winner: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_value(&self) -> u64 {
        self.base_value
    }

    /// Current price: `base_value` until the first accepted bid.
    pub fn current_bid(&self) -> u64 {
        self.current_bid
    }

    /// The last accepted bidder, if any.
    pub fn highest_bidder(&self) -> Option<ParticipantId> {
        self.highest_bidder
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    /// Set exactly when `status` is [`ItemStatus::Sold`].
    pub fn winner(&self) -> Option<ParticipantId> {
        self.winner
    }

    /// The wire representation of this item.
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            name: self.name.clone(),
            club: self.club.clone(),
            position: self.position.clone(),
            style: self.style.clone(),
            base_value: self.base_value,
            current_bid: self.current_bid,
            highest_bidder: self.highest_bidder,
            status: self.status,
            winner: self.winner,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition results
// ---------------------------------------------------------------------------

/// An accepted bid, as reported back to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidAccepted {
    /// The price after this bid.
    pub current_bid: u64,
    /// Who now holds the highest bid.
    pub bidder: ParticipantId,
}

/// The result of advancing the final-call countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    /// Stage 1 — advisory only, no state change beyond the counter.
    FirstCall,
    /// Stage 2 — advisory only.
    SecondCall,
    /// Stage 3 with at least one accepted bid: the item is sold.
    Sold {
        index: usize,
        winner: ParticipantId,
        price: u64,
    },
    /// Stage 3 with no bids: the item goes unsold.
    Unsold { index: usize },
}

// ---------------------------------------------------------------------------
// BiddingState
// ---------------------------------------------------------------------------

/// The per-room bidding state: the ordered lot list, which item (if
/// any) is on the block, and the final-call countdown.
#[derive(Debug)]
pub struct BiddingState {
    increment: u64,
    items: Vec<Item>,
    /// Index of the item currently in [`ItemStatus::Bidding`].
    active: Option<usize>,
    /// Final-call countdown, 0–3. Reset by every accepted bid and by
    /// resolution.
    call_stage: u8,
}

impl BiddingState {
    /// Creates an empty lot list with the room's fixed bid increment.
    pub fn new(increment: u64) -> Self {
        Self {
            increment,
            items: Vec::new(),
            active: None,
            call_stage: 0,
        }
    }

    /// Appends a pending item to the lot list.
    ///
    /// # Errors
    /// Returns [`AuctionError::InvalidItem`] if the draft fails
    /// validation.
    pub fn upload(&mut self, draft: ItemDraft) -> Result<&Item, AuctionError> {
        let item = Item::from_draft(draft)?;
        self.items.push(item);
        Ok(self.items.last().expect("just pushed"))
    }

    /// Opens bidding on the first pending item, in upload order.
    ///
    /// The item's price starts at its base value with no bidder, and the
    /// call countdown is cleared.
    ///
    /// # Errors
    /// - [`AuctionError::InvalidTransition`] if an item is already on
    ///   the block
    /// - [`AuctionError::NoItemsRemaining`] if no pending item is left
    pub fn start_next(&mut self) -> Result<(usize, &Item), AuctionError> {
        if self.active.is_some() {
            return Err(AuctionError::InvalidTransition(
                "an item is already open for bidding".into(),
            ));
        }
        let index = self
            .items
            .iter()
            .position(|item| item.status == ItemStatus::Pending)
            .ok_or(AuctionError::NoItemsRemaining)?;

        let item = &mut self.items[index];
        item.status = ItemStatus::Bidding;
        item.current_bid = item.base_value;
        item.highest_bidder = None;
        self.active = Some(index);
        self.call_stage = 0;

        Ok((index, &self.items[index]))
    }

    /// Accepts a bid on the active item: the price rises by the fixed
    /// increment, the bidder becomes the highest bidder, and the
    /// final-call countdown resets.
    ///
    /// Membership checks (is the bidder in the room, is the bidder not
    /// the auctioneer) belong to the controller; by the time a call
    /// reaches here the bidder id has been resolved.
    ///
    /// # Errors
    /// Returns [`AuctionError::NoActiveAuction`] when no item is open
    /// for bidding.
    pub fn place_bid(
        &mut self,
        bidder: ParticipantId,
    ) -> Result<BidAccepted, AuctionError> {
        let index = self.active.ok_or(AuctionError::NoActiveAuction)?;
        let item = &mut self.items[index];
        debug_assert_eq!(item.status, ItemStatus::Bidding);

        item.current_bid += self.increment;
        item.highest_bidder = Some(bidder);
        self.call_stage = 0;

        Ok(BidAccepted {
            current_bid: item.current_bid,
            bidder,
        })
    }

    /// Advances the final-call countdown on the active item.
    ///
    /// Stages 1 and 2 are advisory. Stage 3 resolves the item — sold to
    /// the last accepted bidder if there is one, unsold otherwise — and
    /// clears the active slot and the countdown.
    ///
    /// # Errors
    /// Returns [`AuctionError::NoActiveAuction`] when no item is open
    /// for bidding; state is untouched.
    pub fn advance_call(&mut self) -> Result<CallOutcome, AuctionError> {
        let index = self.active.ok_or(AuctionError::NoActiveAuction)?;

        self.call_stage += 1;
        match self.call_stage {
            1 => Ok(CallOutcome::FirstCall),
            2 => Ok(CallOutcome::SecondCall),
            _ => {
                let item = &mut self.items[index];
                let outcome = match item.highest_bidder {
                    Some(winner) => {
                        item.status = ItemStatus::Sold;
                        item.winner = Some(winner);
                        CallOutcome::Sold {
                            index,
                            winner,
                            price: item.current_bid,
                        }
                    }
                    None => {
                        item.status = ItemStatus::Unsold;
                        CallOutcome::Unsold { index }
                    }
                };
                self.active = None;
                self.call_stage = 0;
                Ok(outcome)
            }
        }
    }

    /// The item currently open for bidding, if any.
    pub fn active_item(&self) -> Option<&Item> {
        self.active.map(|i| &self.items[i])
    }

    /// Index of the item currently open for bidding.
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Current final-call countdown stage (0–3).
    pub fn call_stage(&self) -> u8 {
        self.call_stage
    }

    /// All items in upload order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The item at `index`, if it exists.
    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    /// The room's fixed bid increment.
    pub fn increment(&self) -> u64 {
        self.increment
    }
}

// =========================================================================
// Tests
// =========================================================================
