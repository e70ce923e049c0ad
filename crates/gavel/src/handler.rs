//! Per-connection handler: handshake, identity, and action routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Receive `Hello` → validate version
//!   2. Issue a fresh identity, or restore one from a resume token
//!   3. Send `Welcome` → participant is online
//!   4. Loop: receive envelopes → route actions to the directory/rooms
//!
//! All outbound traffic — direct replies and room broadcasts alike —
//! funnels through a single per-connection channel drained by the
//! outbound pump task, so the client sees one ordered event stream no
//! matter which room actor produced an event.

use std::sync::Arc;
use std::time::{Duration, Instant};

use gavel_protocol::{
    ClientAction, ClientEnvelope, Codec, ParticipantId, ProtocolError,
    RejectKind, RoomCode, ServerEnvelope, ServerEvent,
};
use gavel_room::{AuctionError, RoomConfig, RoomHandle, RoomSender};
use gavel_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::{ServerState, PROTOCOL_VERSION};
use crate::GavelError;

/// How long a fresh connection gets to send its `Hello`.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Idle cutoff for established connections. Heartbeats (every ~5s)
/// keep an otherwise quiet bidder alive well within this.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Drop guard that releases a participant's connection resources when
/// the handler exits: message delivery detaches from their rooms and
/// the session's reconnect grace period starts.
///
/// Cleanup runs even if the handler errors or panics. Since `Drop` is
/// synchronous, the async work is spawned fire-and-forget.
struct ConnectionGuard<C: Codec> {
    participant_id: ParticipantId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        let participant_id = self.participant_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state
                .directory
                .lock()
                .await
                .detach_participant(participant_id)
                .await;
            let _ = state.sessions.lock().await.disconnect(participant_id);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), GavelError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (out_tx, out_rx) = mpsc::unbounded_channel::<ServerEvent>();
    let start = Instant::now();
    spawn_outbound_pump(conn.clone(), Arc::clone(&state), out_rx, start);

    // --- Step 1: Handshake ---
    let (participant_id, resumed) =
        perform_handshake(&conn, &state, &out_tx, &start).await?;

    tracing::info!(%conn_id, %participant_id, resumed, "participant online");

    let _guard = ConnectionGuard {
        participant_id,
        state: Arc::clone(&state),
    };

    // A resumed participant gets room delivery re-attached without an
    // explicit rejoin; each of their rooms answers with a snapshot.
    if resumed {
        reattach_rooms(&state, participant_id, &out_tx).await;
    }

    // --- Step 2: Action loop ---
    loop {
        let data =
            match tokio::time::timeout(IDLE_TIMEOUT, conn.recv()).await {
                Ok(Ok(Some(data))) => data,
                Ok(Ok(None)) => {
                    tracing::info!(%participant_id, "connection closed cleanly");
                    break;
                }
                Ok(Err(e)) => {
                    tracing::debug!(%participant_id, error = %e, "recv error");
                    break;
                }
                Err(_) => {
                    tracing::info!(%participant_id, "connection timed out");
                    break;
                }
            };

        let envelope: ClientEnvelope = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(
                    %participant_id, error = %e, "failed to decode envelope"
                );
                continue;
            }
        };

        let close = handle_action(
            &state,
            participant_id,
            envelope.action,
            &out_tx,
            &start,
        )
        .await;
        if close {
            break;
        }
    }

    // _guard drops here → detach + session disconnect fire.
    Ok(())
}

/// Performs the initial handshake: receive `Hello`, validate the
/// version, establish identity, send `Welcome`.
///
/// A resume token that fails to resolve (expired, unknown, already
/// connected) falls back to a fresh identity — the client learns which
/// happened from the `resumed` flag.
async fn perform_handshake<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    out: &RoomSender,
    start: &Instant,
) -> Result<(ParticipantId, bool), GavelError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.recv())
        .await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(GavelError::Protocol(ProtocolError::InvalidMessage(
                "connection closed before handshake".into(),
            )));
        }
        Ok(Err(e)) => return Err(GavelError::Transport(e)),
        Err(_) => {
            return Err(GavelError::Protocol(ProtocolError::InvalidMessage(
                "handshake timed out".into(),
            )));
        }
    };

    let envelope: ClientEnvelope = state.codec.decode(&data)?;

    let (version, resume_token) = match envelope.action {
        ClientAction::Hello {
            version,
            resume_token,
        } => (version, resume_token),
        _ => {
            send_violation(out, "first message must be Hello");
            return Err(GavelError::Protocol(ProtocolError::InvalidMessage(
                "first message must be Hello".into(),
            )));
        }
    };

    if version != PROTOCOL_VERSION {
        send_violation(
            out,
            &format!(
                "version mismatch: expected {PROTOCOL_VERSION}, got {version}"
            ),
        );
        return Err(GavelError::Protocol(ProtocolError::InvalidMessage(
            "protocol version mismatch".into(),
        )));
    }

    let mut sessions = state.sessions.lock().await;
    let (participant_id, token, resumed) = match resume_token {
        Some(token) => match sessions.resume(&token) {
            Ok(session) => (
                session.participant_id,
                session.resume_token.clone(),
                true,
            ),
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    "resume failed, issuing fresh identity"
                );
                let session = sessions.register();
                (session.participant_id, session.resume_token.clone(), false)
            }
        },
        None => {
            let session = sessions.register();
            (session.participant_id, session.resume_token.clone(), false)
        }
    };
    drop(sessions);

    send(
        out,
        ServerEvent::Welcome {
            participant_id,
            resume_token: token,
            resumed,
            server_time: elapsed_ms(start),
        },
    );

    Ok((participant_id, resumed))
}

/// Routes one client action. Returns `true` if the connection should
/// close.
///
/// Successful room mutations produce no direct reply — the resulting
/// broadcasts arrive through the outbound pump like everyone else's.
/// Failures come back as `Rejected` with the error's kind.
async fn handle_action<C: Codec>(
    state: &Arc<ServerState<C>>,
    participant_id: ParticipantId,
    action: ClientAction,
    out: &RoomSender,
    start: &Instant,
) -> bool {
    match action {
        ClientAction::Hello { .. } => {
            send_violation(out, "handshake already completed");
        }

        ClientAction::Heartbeat { client_time } => {
            send(
                out,
                ServerEvent::HeartbeatAck {
                    client_time,
                    server_time: elapsed_ms(start),
                },
            );
        }

        ClientAction::CreateRoom {
            name,
            max_participants,
            bid_increment,
        } => {
            let config = RoomConfig {
                name: name.clone(),
                max_participants,
                bid_increment,
            };
            let result = {
                let mut directory = state.directory.lock().await;
                directory.create(config, participant_id, out.clone())
            };
            match result {
                Ok(code) => send(
                    out,
                    ServerEvent::RoomCreated {
                        code,
                        name,
                        bid_increment,
                        max_participants,
                    },
                ),
                Err(e) => send_rejected(out, &e),
            }
        }

        ClientAction::JoinRoom { code, display_name } => {
            let result = {
                let mut directory = state.directory.lock().await;
                directory
                    .join(&code, participant_id, display_name, out.clone())
                    .await
            };
            match result {
                Ok(()) => send(
                    out,
                    ServerEvent::RoomJoined {
                        code,
                        participant_id,
                    },
                ),
                Err(e) => send_rejected(out, &e),
            }
        }

        ClientAction::UploadItem { code, item } => {
            let result = match room_handle(state, &code).await {
                Ok(handle) => handle.upload_item(participant_id, item).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                send_rejected(out, &e);
            }
        }

        ClientAction::StartBidding { code } => {
            let result = match room_handle(state, &code).await {
                Ok(handle) => handle.start_bidding(participant_id).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                send_rejected(out, &e);
            }
        }

        ClientAction::PlaceBid { code } => {
            let result = match room_handle(state, &code).await {
                Ok(handle) => handle.place_bid(participant_id).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                send_rejected(out, &e);
            }
        }

        ClientAction::FinalCall { code } => {
            let result = match room_handle(state, &code).await {
                Ok(handle) => handle.final_call(participant_id).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                send_rejected(out, &e);
            }
        }

        ClientAction::EndRoom { code } => {
            let result = {
                let mut directory = state.directory.lock().await;
                directory.end_room(&code, participant_id).await
            };
            if let Err(e) = result {
                send_rejected(out, &e);
            }
        }

        ClientAction::Disconnect { reason } => {
            tracing::info!(%participant_id, %reason, "client disconnected");
            return true;
        }
    }

    false
}

/// Re-attaches a resumed participant's delivery channel to every room
/// they were in before the drop. Each room answers with a snapshot so
/// the client can rebuild its view.
async fn reattach_rooms<C: Codec>(
    state: &Arc<ServerState<C>>,
    participant_id: ParticipantId,
    out: &RoomSender,
) {
    let directory = state.directory.lock().await;
    for code in directory.rooms_of(&participant_id) {
        if let Ok(handle) = directory.get(&code) {
            if let Err(e) = handle
                .join(participant_id, String::new(), out.clone())
                .await
            {
                tracing::debug!(
                    room = %code,
                    %participant_id,
                    error = %e,
                    "re-attach failed"
                );
            }
        }
    }
}

/// Resolves a room handle without holding the directory lock across
/// the room operation itself.
async fn room_handle<C: Codec>(
    state: &Arc<ServerState<C>>,
    code: &RoomCode,
) -> Result<RoomHandle, AuctionError> {
    let directory = state.directory.lock().await;
    directory.get(code).cloned()
}

/// Spawns the task that drains the outbound channel, wraps each event
/// in a sequenced envelope, and writes it to the socket. Stops when
/// every sender is gone or the socket dies.
fn spawn_outbound_pump<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
    mut out_rx: mpsc::UnboundedReceiver<ServerEvent>,
    start: Instant,
) {
    tokio::spawn(async move {
        let mut seq: u64 = 0;
        while let Some(event) = out_rx.recv().await {
            let envelope = ServerEnvelope {
                seq: next_seq(&mut seq),
                timestamp: elapsed_ms(&start),
                event,
            };
            let bytes = match state.codec.encode(&envelope) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode event");
                    continue;
                }
            };
            if conn.send(&bytes).await.is_err() {
                tracing::debug!(
                    conn_id = %conn.id(),
                    "outbound send failed, stopping pump"
                );
                break;
            }
        }
    });
}

/// Queues an event for the client (fire-and-forget — if the pump is
/// gone, the connection is already dead).
fn send(out: &RoomSender, event: ServerEvent) {
    let _ = out.send(event);
}

/// Queues a `Rejected` reply for a refused auction action.
fn send_rejected(out: &RoomSender, err: &AuctionError) {
    let _ = out.send(ServerEvent::Rejected {
        kind: err.kind(),
        message: err.to_string(),
    });
}

/// Queues a `Rejected` reply for a protocol-level violation.
fn send_violation(out: &RoomSender, message: &str) {
    let _ = out.send(ServerEvent::Rejected {
        kind: RejectKind::ProtocolViolation,
        message: message.to_string(),
    });
}

/// Milliseconds since the connection was accepted.
fn elapsed_ms(start: &Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
