//! Room state, validation rules, and the room actor.
//!
//! [`Room`] is the auction room controller's state: the roster, the
//! auctioneer, and the bidding state machine, with one method per
//! client-visible operation. The methods are synchronous and pure of
//! I/O so the rules can be unit-tested directly.
//!
//! [`RoomActor`] wraps a `Room` in an isolated Tokio task. All access
//! goes through an mpsc command channel — no shared mutable state, just
//! message passing — which is what serializes concurrent bids: two
//! `PlaceBid` commands arrive in *some* order, and the second one sees
//! the first one's price.

use std::collections::HashMap;

use gavel_protocol::{
    ItemDraft, ParticipantId, ParticipantSummary, RoomCode, RoomSnapshot,
    ServerEvent, WonItem,
};
use tokio::sync::{mpsc, oneshot};

use crate::{
    bidding::{BidAccepted, BiddingState, CallOutcome, Item},
    AuctionError, RoomConfig,
};

/// Advisory labels for final-call stages 1 and 2. Stage 3 resolves the
/// item instead of emitting a label.
const CALL_LABELS: [&str; 2] = ["First Call", "Second Call"];

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// A bidder in a room.
///
/// Identity is fixed at join; the roster entry persists across
/// transport disconnects so a standing bid or recorded win is never
/// lost to a dropped connection.
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    wins: Vec<Win>,
}

/// One won lot: the index into the room's item list plus the closing
/// price.
#[derive(Debug, Clone, Copy)]
struct Win {
    item: usize,
    price: u64,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One auction session: an auctioneer, a bidder roster, and a lot list.
///
/// Every mutating method validates the caller's role and the room state
/// before touching anything, so a rejected action leaves the room
/// exactly as it was.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    name: String,
    max_participants: usize,
    auctioneer: ParticipantId,
    participants: Vec<Participant>,
    bidding: BiddingState,
    active: bool,
}

impl Room {
    /// Creates a room with a validated config.
    ///
    /// # Errors
    /// Returns [`AuctionError::InvalidConfig`] when the config fails
    /// validation.
    pub fn new(
        code: RoomCode,
        config: RoomConfig,
        auctioneer: ParticipantId,
    ) -> Result<Self, AuctionError> {
        config.validate()?;
        Ok(Self {
            code,
            name: config.name,
            max_participants: config.max_participants,
            auctioneer,
            participants: Vec::new(),
            bidding: BiddingState::new(config.bid_increment),
            active: true,
        })
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn auctioneer(&self) -> ParticipantId {
        self.auctioneer
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn bidding(&self) -> &BiddingState {
        &self.bidding
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Adds a bidder to the roster. Returns `true` if the roster grew.
    ///
    /// Joining again with an id already on the roster — a reconnect —
    /// is a no-op `Ok(false)`, as is the auctioneer "joining" their own
    /// room. Capacity is only checked for genuinely new bidders, so a
    /// full room never locks out a returning one.
    ///
    /// # Errors
    /// - [`AuctionError::RoomNotFound`] if the room has been closed
    /// - [`AuctionError::RoomFull`] if the roster is at capacity
    pub fn join(
        &mut self,
        id: ParticipantId,
        name: &str,
    ) -> Result<bool, AuctionError> {
        if !self.active {
            return Err(AuctionError::RoomNotFound(self.code.clone()));
        }
        if id == self.auctioneer || self.participant(id).is_some() {
            return Ok(false);
        }
        if self.participants.len() >= self.max_participants {
            return Err(AuctionError::RoomFull(self.code.clone()));
        }

        self.participants.push(Participant {
            id,
            name: name.to_string(),
            wins: Vec::new(),
        });
        Ok(true)
    }

    /// Auctioneer only: appends a pending item to the lot list.
    pub fn upload_item(
        &mut self,
        caller: ParticipantId,
        draft: ItemDraft,
    ) -> Result<&Item, AuctionError> {
        if caller != self.auctioneer {
            return Err(AuctionError::NotAuctioneer("upload items"));
        }
        self.bidding.upload(draft)
    }

    /// Auctioneer only: opens bidding on the first pending item.
    pub fn start_bidding(
        &mut self,
        caller: ParticipantId,
    ) -> Result<(usize, &Item), AuctionError> {
        if caller != self.auctioneer {
            return Err(AuctionError::NotAuctioneer("start bidding"));
        }
        self.bidding.start_next()
    }

    /// Accepts a bid from a roster member on the active item.
    ///
    /// # Errors
    /// - [`AuctionError::UnknownParticipant`] if the caller is not on
    ///   the roster (the auctioneer never is, so this also blocks the
    ///   auctioneer from bidding on their own lot)
    /// - [`AuctionError::NoActiveAuction`] if no item is on the block
    pub fn place_bid(
        &mut self,
        caller: ParticipantId,
    ) -> Result<BidAccepted, AuctionError> {
        if self.participant(caller).is_none() {
            return Err(AuctionError::UnknownParticipant(caller));
        }
        self.bidding.place_bid(caller)
    }

    /// Auctioneer only: advances the final-call countdown. On a sale,
    /// the win is recorded on the winner's roster entry.
    pub fn advance_final_call(
        &mut self,
        caller: ParticipantId,
    ) -> Result<CallOutcome, AuctionError> {
        if caller != self.auctioneer {
            return Err(AuctionError::NotAuctioneer("make the final call"));
        }
        let outcome = self.bidding.advance_call()?;
        if let CallOutcome::Sold { index, winner, price } = outcome {
            if let Some(p) =
                self.participants.iter_mut().find(|p| p.id == winner)
            {
                p.wins.push(Win { item: index, price });
            }
        }
        Ok(outcome)
    }

    /// Auctioneer only: closes the room for good.
    pub fn end(&mut self, caller: ParticipantId) -> Result<(), AuctionError> {
        if caller != self.auctioneer {
            return Err(AuctionError::NotAuctioneer("end the room"));
        }
        self.active = false;
        Ok(())
    }

    /// The roster in wire form, wins resolved to item snapshots.
    pub fn participants_summary(&self) -> Vec<ParticipantSummary> {
        self.participants
            .iter()
            .map(|p| ParticipantSummary {
                id: p.id,
                name: p.name.clone(),
                wins: p
                    .wins
                    .iter()
                    .filter_map(|w| {
                        self.bidding.item(w.item).map(|item| WonItem {
                            item: item.snapshot(),
                            price: w.price,
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    /// Full authoritative state in wire form.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            bid_increment: self.bidding.increment(),
            max_participants: self.max_participants,
            auctioneer: self.auctioneer,
            participants: self.participants_summary(),
            items: self.bidding.items().iter().map(Item::snapshot).collect(),
            active_item: self.bidding.active_index(),
            call_stage: self.bidding.call_stage(),
            active: self.active,
        }
    }
}

// ---------------------------------------------------------------------------
// Room actor plumbing
// ---------------------------------------------------------------------------

/// Channel sender for delivering server events to one participant's
/// connection handler.
pub type RoomSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in each mutating variant is the reply channel:
/// the caller awaits the validation verdict there, while the resulting
/// broadcasts travel through the participants' [`RoomSender`]s.
pub(crate) enum RoomCommand {
    Join {
        participant_id: ParticipantId,
        name: String,
        sender: RoomSender,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    UploadItem {
        caller: ParticipantId,
        draft: ItemDraft,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    StartBidding {
        caller: ParticipantId,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    PlaceBid {
        caller: ParticipantId,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    FinalCall {
        caller: ParticipantId,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    EndRoom {
        caller: ParticipantId,
        reply: oneshot::Sender<Result<(), AuctionError>>,
    },
    /// Transport disconnect: stop delivering to this participant. Their
    /// roster entry, standing bid, and wins are untouched.
    Detach { participant_id: ParticipantId },
    /// Read-only full-state query.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// Handle to a running room actor. Cheap to clone — it's an
/// `mpsc::Sender` wrapper plus the room code for error reporting.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's shareable code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Joins a bidder (or re-attaches a reconnecting one). On success
    /// the joiner receives a `RoomSnapshot` through `sender`.
    pub async fn join(
        &self,
        participant_id: ParticipantId,
        name: String,
        sender: RoomSender,
    ) -> Result<(), AuctionError> {
        self.request(|reply| RoomCommand::Join {
            participant_id,
            name,
            sender,
            reply,
        })
        .await
    }

    /// Auctioneer only: uploads an item.
    pub async fn upload_item(
        &self,
        caller: ParticipantId,
        draft: ItemDraft,
    ) -> Result<(), AuctionError> {
        self.request(|reply| RoomCommand::UploadItem {
            caller,
            draft,
            reply,
        })
        .await
    }

    /// Auctioneer only: opens bidding on the first pending item.
    pub async fn start_bidding(
        &self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        self.request(|reply| RoomCommand::StartBidding { caller, reply })
            .await
    }

    /// Places a bid for `caller` on the active item.
    pub async fn place_bid(
        &self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        self.request(|reply| RoomCommand::PlaceBid { caller, reply })
            .await
    }

    /// Auctioneer only: advances the final-call countdown.
    pub async fn final_call(
        &self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        self.request(|reply| RoomCommand::FinalCall { caller, reply })
            .await
    }

    /// Auctioneer only: closes the room. The actor stops on success.
    pub async fn end_room(
        &self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        self.request(|reply| RoomCommand::EndRoom { caller, reply })
            .await
    }

    /// Detaches a participant's delivery channel (fire-and-forget).
    pub async fn detach(&self, participant_id: ParticipantId) {
        let _ = self
            .sender
            .send(RoomCommand::Detach { participant_id })
            .await;
    }

    /// Requests a full-state snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, AuctionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))
    }

    /// Sends a command built by `make` and awaits its reply channel.
    async fn request(
        &self,
        make: impl FnOnce(oneshot::Sender<Result<(), AuctionError>>) -> RoomCommand,
    ) -> Result<(), AuctionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| AuctionError::Unavailable(self.code.clone()))?
    }
}

// ---------------------------------------------------------------------------
// RoomActor
// ---------------------------------------------------------------------------

/// The internal room actor. Runs inside a Tokio task and is the single
/// owner of its `Room` — the serialization point the bidding rules
/// depend on.
struct RoomActor {
    room: Room,
    /// Per-participant outbound channels (auctioneer included).
    senders: HashMap<ParticipantId, RoomSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until the room ends or every handle is gone.
    async fn run(mut self) {
        tracing::info!(room = %self.room.code(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    participant_id,
                    name,
                    sender,
                    reply,
                } => {
                    let result =
                        self.handle_join(participant_id, &name, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::UploadItem { caller, draft, reply } => {
                    let _ = reply.send(self.handle_upload(caller, draft));
                }
                RoomCommand::StartBidding { caller, reply } => {
                    let _ = reply.send(self.handle_start(caller));
                }
                RoomCommand::PlaceBid { caller, reply } => {
                    let _ = reply.send(self.handle_bid(caller));
                }
                RoomCommand::FinalCall { caller, reply } => {
                    let _ = reply.send(self.handle_call(caller));
                }
                RoomCommand::EndRoom { caller, reply } => {
                    let result = self.room.end(caller);
                    let ended = result.is_ok();
                    let _ = reply.send(result);
                    if ended {
                        self.broadcast(ServerEvent::RoomClosed {
                            code: self.room.code().clone(),
                        });
                        tracing::info!(
                            room = %self.room.code(),
                            "room ended by auctioneer"
                        );
                        break;
                    }
                }
                RoomCommand::Detach { participant_id } => {
                    self.senders.remove(&participant_id);
                    tracing::info!(
                        room = %self.room.code(),
                        %participant_id,
                        "participant detached"
                    );
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.room.snapshot());
                }
            }
        }

        tracing::info!(room = %self.room.code(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        participant_id: ParticipantId,
        name: &str,
        sender: RoomSender,
    ) -> Result<(), AuctionError> {
        let newly_joined = self.room.join(participant_id, name)?;
        self.senders.insert(participant_id, sender);

        // The joiner always gets the full authoritative state, whether
        // this is a first join or a reconnect.
        self.send_to(
            participant_id,
            ServerEvent::RoomSnapshot {
                room: self.room.snapshot(),
            },
        );

        if newly_joined {
            tracing::info!(
                room = %self.room.code(),
                %participant_id,
                participants = self.room.participants_summary().len(),
                "participant joined"
            );
            self.broadcast(ServerEvent::ParticipantsUpdate {
                participants: self.room.participants_summary(),
            });
        } else {
            tracing::info!(
                room = %self.room.code(),
                %participant_id,
                "participant re-attached"
            );
        }

        Ok(())
    }

    fn handle_upload(
        &mut self,
        caller: ParticipantId,
        draft: ItemDraft,
    ) -> Result<(), AuctionError> {
        let snapshot = self.room.upload_item(caller, draft)?.snapshot();
        tracing::info!(
            room = %self.room.code(),
            item = %snapshot.name,
            base_value = snapshot.base_value,
            "item uploaded"
        );
        self.broadcast(ServerEvent::ItemUpdate { item: snapshot });
        Ok(())
    }

    fn handle_start(
        &mut self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        let (_, item) = self.room.start_bidding(caller)?;
        let snapshot = item.snapshot();
        tracing::info!(
            room = %self.room.code(),
            item = %snapshot.name,
            opening = snapshot.base_value,
            "bidding opened"
        );
        self.broadcast(ServerEvent::ItemUpdate {
            item: snapshot.clone(),
        });
        self.broadcast(ServerEvent::BidUpdate {
            current_bid: snapshot.current_bid,
            highest_bidder: None,
            highest_bidder_name: None,
        });
        Ok(())
    }

    fn handle_bid(
        &mut self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        let accepted = self.room.place_bid(caller)?;
        let name = self
            .room
            .participant(accepted.bidder)
            .map(|p| p.name.clone());
        tracing::info!(
            room = %self.room.code(),
            bidder = %accepted.bidder,
            bid = accepted.current_bid,
            "bid accepted"
        );
        self.broadcast(ServerEvent::BidUpdate {
            current_bid: accepted.current_bid,
            highest_bidder: Some(accepted.bidder),
            highest_bidder_name: name,
        });
        Ok(())
    }

    fn handle_call(
        &mut self,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        match self.room.advance_final_call(caller)? {
            CallOutcome::FirstCall | CallOutcome::SecondCall => {
                let stage = self.room.bidding().call_stage();
                self.broadcast(ServerEvent::CallStage {
                    stage,
                    label: CALL_LABELS[stage as usize - 1].to_string(),
                });
            }
            CallOutcome::Sold { index, winner, price } => {
                let item = self
                    .room
                    .bidding()
                    .item(index)
                    .expect("sold item exists")
                    .snapshot();
                let winner_name = self
                    .room
                    .participant(winner)
                    .map(|p| p.name.clone())
                    .unwrap_or_default();
                tracing::info!(
                    room = %self.room.code(),
                    item = %item.name,
                    %winner,
                    price,
                    "item sold"
                );
                self.broadcast(ServerEvent::ItemSold {
                    item,
                    winner,
                    winner_name,
                    price,
                });
                // Wins changed — refresh everyone's roster view.
                self.broadcast(ServerEvent::ParticipantsUpdate {
                    participants: self.room.participants_summary(),
                });
            }
            CallOutcome::Unsold { index } => {
                let item = self
                    .room
                    .bidding()
                    .item(index)
                    .expect("unsold item exists")
                    .snapshot();
                tracing::info!(
                    room = %self.room.code(),
                    item = %item.name,
                    "item went unsold"
                );
                self.broadcast(ServerEvent::ItemUnsold { item });
            }
        }
        Ok(())
    }

    /// Fans an event out to every attached participant.
    fn broadcast(&self, event: ServerEvent) {
        for (participant_id, sender) in &self.senders {
            if sender.send(event.clone()).is_err() {
                tracing::debug!(
                    room = %self.room.code(),
                    %participant_id,
                    "dropping event for detached receiver"
                );
            }
        }
    }

    /// Sends an event to a single participant. Silently drops if the
    /// receiver is gone (participant disconnected).
    fn send_to(&self, participant_id: ParticipantId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&participant_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a room actor task and returns a handle to it.
///
/// The auctioneer's outbound channel is attached from the start so they
/// receive every broadcast without an explicit join.
///
/// `channel_size` bounds the command channel — if it fills up, senders
/// wait.
pub(crate) fn spawn_room(
    room: Room,
    auctioneer_sender: RoomSender,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let code = room.code().clone();

    let mut senders = HashMap::new();
    senders.insert(room.auctioneer(), auctioneer_sender);

    let actor = RoomActor {
        room,
        senders,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the controller rules on `Room`. The actor and
    //! fan-out behavior are covered in `tests/auction_flow.rs`.

    use gavel_protocol::ItemStatus;

    use super::*;

    const AUCTIONEER: ParticipantId = ParticipantId(1);

    fn room_with_capacity(max: usize) -> Room {
        Room::new(
            RoomCode::from("TEST01"),
            RoomConfig {
                name: "Test Auction".into(),
                max_participants: max,
                bid_increment: 100,
            },
            AUCTIONEER,
        )
        .expect("valid config")
    }

    fn draft(name: &str, base_value: u64) -> ItemDraft {
        ItemDraft {
            name: name.into(),
            club: "Azzurri FC".into(),
            position: "CF".into(),
            style: "Goal Poacher".into(),
            base_value,
        }
    }

    fn pid(id: u64) -> ParticipantId {
        ParticipantId(id)
    }

    // =====================================================================
    // new() / join()
    // =====================================================================

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Room::new(
            RoomCode::from("TEST01"),
            RoomConfig {
                bid_increment: 0,
                ..RoomConfig::default()
            },
            AUCTIONEER,
        );
        assert!(matches!(result, Err(AuctionError::InvalidConfig(_))));
    }

    #[test]
    fn test_join_appends_to_roster() {
        let mut room = room_with_capacity(3);

        assert!(room.join(pid(2), "ana").unwrap());

        assert_eq!(room.participant(pid(2)).unwrap().name, "ana");
    }

    #[test]
    fn test_join_full_room_fails_and_leaves_roster_unchanged() {
        let mut room = room_with_capacity(2);
        room.join(pid(2), "ana").unwrap();
        room.join(pid(3), "ben").unwrap();

        let result = room.join(pid(4), "chi");

        assert!(matches!(result, Err(AuctionError::RoomFull(_))));
        assert!(room.participant(pid(4)).is_none());
        assert_eq!(room.participants_summary().len(), 2);
    }

    #[test]
    fn test_rejoin_existing_id_does_not_grow_roster() {
        let mut room = room_with_capacity(2);
        room.join(pid(2), "ana").unwrap();

        assert!(!room.join(pid(2), "ana").unwrap());
        assert_eq!(room.participants_summary().len(), 1);
    }

    #[test]
    fn test_rejoin_succeeds_even_when_room_is_full() {
        // A reconnecting bidder must never be locked out by capacity.
        let mut room = room_with_capacity(2);
        room.join(pid(2), "ana").unwrap();
        room.join(pid(3), "ben").unwrap();

        assert!(!room.join(pid(2), "ana").unwrap());
    }

    #[test]
    fn test_auctioneer_join_is_a_noop() {
        let mut room = room_with_capacity(2);

        assert!(!room.join(AUCTIONEER, "host").unwrap());
        assert!(room.participant(AUCTIONEER).is_none());
    }

    #[test]
    fn test_join_closed_room_fails() {
        let mut room = room_with_capacity(2);
        room.end(AUCTIONEER).unwrap();

        let result = room.join(pid(2), "ana");

        assert!(matches!(result, Err(AuctionError::RoomNotFound(_))));
    }

    // =====================================================================
    // Role guards
    // =====================================================================

    #[test]
    fn test_bidder_cannot_upload_items() {
        let mut room = room_with_capacity(3);
        room.join(pid(2), "ana").unwrap();

        let result = room.upload_item(pid(2), draft("E. Rossi", 1000));

        assert!(matches!(result, Err(AuctionError::NotAuctioneer(_))));
        assert!(room.bidding().items().is_empty());
    }

    #[test]
    fn test_bidder_cannot_start_bidding_or_call() {
        let mut room = room_with_capacity(3);
        room.join(pid(2), "ana").unwrap();
        room.upload_item(AUCTIONEER, draft("E. Rossi", 1000)).unwrap();

        assert!(matches!(
            room.start_bidding(pid(2)),
            Err(AuctionError::NotAuctioneer(_))
        ));
        room.start_bidding(AUCTIONEER).unwrap();
        assert!(matches!(
            room.advance_final_call(pid(2)),
            Err(AuctionError::NotAuctioneer(_))
        ));
    }

    #[test]
    fn test_auctioneer_cannot_bid_on_own_lot() {
        let mut room = room_with_capacity(3);
        room.upload_item(AUCTIONEER, draft("E. Rossi", 1000)).unwrap();
        room.start_bidding(AUCTIONEER).unwrap();

        let result = room.place_bid(AUCTIONEER);

        assert!(matches!(
            result,
            Err(AuctionError::UnknownParticipant(p)) if p == AUCTIONEER
        ));
    }

    #[test]
    fn test_non_member_cannot_bid() {
        let mut room = room_with_capacity(3);
        room.upload_item(AUCTIONEER, draft("E. Rossi", 1000)).unwrap();
        room.start_bidding(AUCTIONEER).unwrap();

        let result = room.place_bid(pid(99));

        assert!(matches!(
            result,
            Err(AuctionError::UnknownParticipant(p)) if p == pid(99)
        ));
        assert_eq!(room.bidding().active_item().unwrap().current_bid(), 1000);
    }

    #[test]
    fn test_bidder_cannot_end_room() {
        let mut room = room_with_capacity(3);
        room.join(pid(2), "ana").unwrap();

        assert!(matches!(
            room.end(pid(2)),
            Err(AuctionError::NotAuctioneer(_))
        ));
        assert!(room.is_active());
    }

    // =====================================================================
    // Full auction: the canonical sold scenario
    // =====================================================================

    #[test]
    fn test_sold_item_lands_in_winner_roster_entry() {
        // Increment 100, base 1000: start → 1000/no bidder, one bid →
        // 1100, three calls → sold at 1100 and recorded as a win.
        let mut room = room_with_capacity(5);
        room.join(pid(2), "ana").unwrap();
        room.upload_item(AUCTIONEER, draft("E. Rossi", 1000)).unwrap();

        room.start_bidding(AUCTIONEER).unwrap();
        {
            let item = room.bidding().active_item().unwrap();
            assert_eq!(item.current_bid(), 1000);
            assert_eq!(item.highest_bidder(), None);
        }

        let accepted = room.place_bid(pid(2)).unwrap();
        assert_eq!(accepted.current_bid, 1100);

        room.advance_final_call(AUCTIONEER).unwrap();
        room.advance_final_call(AUCTIONEER).unwrap();
        let outcome = room.advance_final_call(AUCTIONEER).unwrap();

        assert_eq!(
            outcome,
            CallOutcome::Sold {
                index: 0,
                winner: pid(2),
                price: 1100
            }
        );
        let item = &room.bidding().items()[0];
        assert_eq!(item.status(), ItemStatus::Sold);
        assert_eq!(item.winner(), Some(pid(2)));

        let summary = room.participants_summary();
        assert_eq!(summary[0].wins.len(), 1);
        assert_eq!(summary[0].wins[0].price, 1100);
        assert_eq!(summary[0].wins[0].item.name, "E. Rossi");
    }

    #[test]
    fn test_unsold_item_records_no_win() {
        let mut room = room_with_capacity(5);
        room.join(pid(2), "ana").unwrap();
        room.upload_item(AUCTIONEER, draft("E. Rossi", 1000)).unwrap();
        room.start_bidding(AUCTIONEER).unwrap();

        for _ in 0..3 {
            room.advance_final_call(AUCTIONEER).unwrap();
        }

        assert_eq!(room.bidding().items()[0].status(), ItemStatus::Unsold);
        assert_eq!(room.bidding().active_index(), None);
        assert!(room.participants_summary()[0].wins.is_empty());
    }

    // =====================================================================
    // Snapshot
    // =====================================================================

    #[test]
    fn test_snapshot_reflects_live_state() {
        let mut room = room_with_capacity(5);
        room.join(pid(2), "ana").unwrap();
        room.upload_item(AUCTIONEER, draft("E. Rossi", 1000)).unwrap();
        room.start_bidding(AUCTIONEER).unwrap();
        room.place_bid(pid(2)).unwrap();
        room.advance_final_call(AUCTIONEER).unwrap();

        let snap = room.snapshot();

        assert_eq!(snap.code, RoomCode::from("TEST01"));
        assert_eq!(snap.bid_increment, 100);
        assert_eq!(snap.auctioneer, AUCTIONEER);
        assert_eq!(snap.participants.len(), 1);
        assert_eq!(snap.items.len(), 1);
        assert_eq!(snap.active_item, Some(0));
        assert_eq!(snap.call_stage, 1);
        assert_eq!(snap.items[0].current_bid, 1100);
        assert_eq!(snap.items[0].status, ItemStatus::Bidding);
        assert!(snap.active);
    }
}
