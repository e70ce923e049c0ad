//! `GavelServer` builder and accept loop.
//!
//! This is the entry point for running an auction server. It ties
//! together all the layers: transport → protocol → session → room.

use std::sync::Arc;

use gavel_protocol::{Codec, JsonCodec};
use gavel_room::RoomDirectory;
use gavel_session::{SessionConfig, SessionManager};
use gavel_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::GavelError;

/// The current protocol version. Clients must send this in their
/// `Hello` or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks; the
/// managers get interior mutability via `Mutex`. Per-room work doesn't
/// stay under these locks — handlers clone a `RoomHandle` and talk to
/// the room actor directly.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) directory: Mutex<RoomDirectory>,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Gavel server.
///
/// # Example
///
/// ```rust,no_run
/// use gavel::prelude::*;
///
/// # async fn run() -> Result<(), GavelError> {
/// let server = GavelServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GavelServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl GavelServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration (reconnect grace period).
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Builds and starts the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport` as defaults.
    pub async fn build(self) -> Result<GavelServer<JsonCodec>, GavelError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            directory: Mutex::new(RoomDirectory::new()),
            codec: JsonCodec,
        });

        Ok(GavelServer { transport, state })
    }
}

impl Default for GavelServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gavel auction server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GavelServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C> GavelServer<C>
where
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> GavelServerBuilder {
        GavelServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections, performs the handshake, and spawns
    /// a handler task for each connected participant. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), GavelError> {
        tracing::info!("Gavel server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
