//! The room directory: creates rooms, resolves codes, routes actions.
//!
//! This is the explicit replacement for "a global mutable map keyed by
//! room code". The directory owns one [`RoomHandle`] per live room;
//! every mutation of a room's state travels through that room's actor
//! channel, so concurrent updates to the same code can never clobber
//! each other, while operations on different rooms run in parallel.
//!
//! Like the session manager, the directory itself is not thread-safe —
//! it is owned by the server and accessed through a mutex above.

use std::collections::HashMap;

use gavel_protocol::{ParticipantId, RoomCode};
use rand::Rng;

use crate::room::spawn_room;
use crate::{AuctionError, Room, RoomConfig, RoomHandle, RoomSender};

/// Default command channel size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Room codes are 6 characters from this set, matching what bidders
/// type in by hand.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

/// Tracks all live rooms and which rooms each participant is in.
pub struct RoomDirectory {
    /// Live rooms, keyed by their shareable code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Rooms each participant has joined (or created). Used to detach
    /// their delivery channels when their connection drops. Entries
    /// survive a disconnect — the participant may resume.
    participant_rooms: HashMap<ParticipantId, Vec<RoomCode>>,
}

impl RoomDirectory {
    /// Creates a new, empty directory.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            participant_rooms: HashMap::new(),
        }
    }

    /// Creates a room, spawns its actor, and returns the generated code.
    ///
    /// The caller becomes the room's auctioneer and their outbound
    /// channel is attached from the start.
    ///
    /// # Errors
    /// Returns [`AuctionError::InvalidConfig`] if the config fails
    /// validation; nothing is created in that case.
    pub fn create(
        &mut self,
        config: RoomConfig,
        auctioneer: ParticipantId,
        sender: RoomSender,
    ) -> Result<RoomCode, AuctionError> {
        let code = self.generate_code();
        let room = Room::new(code.clone(), config, auctioneer)?;
        let handle = spawn_room(room, sender, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(code.clone(), handle);
        self.index(auctioneer, &code);

        tracing::info!(room = %code, %auctioneer, "room created");
        Ok(code)
    }

    /// Resolves a code to its room handle.
    ///
    /// # Errors
    /// Returns [`AuctionError::RoomNotFound`] for unknown (or already
    /// closed) codes.
    pub fn get(&self, code: &RoomCode) -> Result<&RoomHandle, AuctionError> {
        self.rooms
            .get(code)
            .ok_or_else(|| AuctionError::RoomNotFound(code.clone()))
    }

    /// Adds a participant to a room (or re-attaches a returning one)
    /// and records the membership in the index.
    pub async fn join(
        &mut self,
        code: &RoomCode,
        participant_id: ParticipantId,
        name: String,
        sender: RoomSender,
    ) -> Result<(), AuctionError> {
        let handle = self.get(code)?.clone();
        handle.join(participant_id, name, sender).await?;
        self.index(participant_id, code);
        Ok(())
    }

    /// Closes a room: the actor broadcasts the closure and stops, and
    /// the directory forgets the code and its index rows.
    ///
    /// # Errors
    /// - [`AuctionError::RoomNotFound`] for unknown codes
    /// - [`AuctionError::NotAuctioneer`] when `caller` doesn't own the
    ///   room (the entry is kept in that case)
    pub async fn end_room(
        &mut self,
        code: &RoomCode,
        caller: ParticipantId,
    ) -> Result<(), AuctionError> {
        let handle = self.get(code)?.clone();
        handle.end_room(caller).await?;

        self.rooms.remove(code);
        for codes in self.participant_rooms.values_mut() {
            codes.retain(|c| c != code);
        }
        self.participant_rooms.retain(|_, codes| !codes.is_empty());

        tracing::info!(room = %code, "room removed from directory");
        Ok(())
    }

    /// Detaches a disconnected participant's delivery channel from
    /// every room they're in. Their roster entries, standing bids, and
    /// wins are untouched — only message delivery stops.
    pub async fn detach_participant(&self, participant_id: ParticipantId) {
        let Some(codes) = self.participant_rooms.get(&participant_id) else {
            return;
        };
        for code in codes {
            if let Some(handle) = self.rooms.get(code) {
                handle.detach(participant_id).await;
            }
        }
    }

    /// The rooms a participant has joined (or created).
    pub fn rooms_of(&self, participant_id: &ParticipantId) -> Vec<RoomCode> {
        self.participant_rooms
            .get(participant_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn index(&mut self, participant_id: ParticipantId, code: &RoomCode) {
        let codes = self.participant_rooms.entry(participant_id).or_default();
        if !codes.contains(code) {
            codes.push(code.clone());
        }
    }

    /// Generates a code not currently in use. Retries on collision —
    /// with 36^6 possibilities and a handful of live rooms, the loop
    /// all but never runs twice.
    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| {
                    let idx = rng.random_range(0..CODE_CHARSET.len());
                    CODE_CHARSET[idx] as char
                })
                .collect();
            let code = RoomCode(code);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}
