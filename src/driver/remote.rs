//! Driver for a remote debugging endpoint.
//!
//! `connect()` asks the control plane for a new target and opens a
//! WebSocket to the target's `webSocketDebuggerUrl`:
//!
//! ```text
//! GET http://host:port/json/new ──► { webSocketDebuggerUrl }
//!                                        │
//!                                        ▼
//!                              ws://host:port/devtools/page/<id>
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info};

use crate::connection::{Connection, ConnectionState, Multiplexer};
use crate::error::{Error, Result};
use crate::transport::{DiscoveryClient, SocketHandle, TargetDescriptor};

use super::builder::RemoteDriverBuilder;
use super::options::RemoteOptions;

// ============================================================================
// RemoteDriver
// ============================================================================

/// [`Connection`] to a target discovered over the HTTP control plane.
pub struct RemoteDriver {
    /// Configuration this driver was built with.
    options: RemoteOptions,
    /// Control-plane client.
    discovery: DiscoveryClient,
    /// Shared with the socket event loop.
    multiplexer: Arc<Multiplexer>,
    /// Open socket, if any.
    socket: Mutex<Option<SocketHandle>>,
    /// Target of the current connection.
    target: Mutex<Option<TargetDescriptor>>,
    /// Lifecycle state.
    state: Mutex<ConnectionState>,
    /// Held for the whole of `connect()`.
    connecting: AsyncMutex<()>,
}

impl fmt::Debug for RemoteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDriver")
            .field("endpoint", &self.discovery.base_url().as_str())
            .field("state", &self.state())
            .field("multiplexer", &self.multiplexer)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl RemoteDriver {
    /// Creates a disconnected driver.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `options` fail validation
    /// - [`Error::Http`] if the HTTP client can't be built
    pub fn new(options: RemoteOptions) -> Result<Self> {
        options.validate()?;
        let discovery = options.discovery()?;
        let multiplexer = Arc::new(Multiplexer::with_formatter(options.formatter()));

        debug!(host = %options.host, port = options.port, "Remote driver created");

        Ok(Self {
            options,
            discovery,
            multiplexer,
            socket: Mutex::new(None),
            target: Mutex::new(None),
            state: Mutex::new(ConnectionState::Disconnected),
            connecting: AsyncMutex::new(()),
        })
    }

    /// Creates a driver for `localhost:$PORT`.
    ///
    /// # Errors
    ///
    /// Same as [`RemoteDriver::new`].
    pub fn from_env() -> Result<Self> {
        Self::new(RemoteOptions::from_env())
    }

    /// Returns a builder seeded from the environment.
    #[inline]
    #[must_use]
    pub fn builder() -> RemoteDriverBuilder {
        RemoteDriverBuilder::new()
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl RemoteDriver {
    /// Returns the options this driver was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RemoteOptions {
        &self.options
    }

    /// Returns the control-plane client.
    #[inline]
    #[must_use]
    pub fn discovery(&self) -> &DiscoveryClient {
        &self.discovery
    }

    /// Returns the target of the current connection.
    #[must_use]
    pub fn target(&self) -> Option<TargetDescriptor> {
        self.target.lock().clone()
    }
}

// ============================================================================
// Internal
// ============================================================================

impl RemoteDriver {
    /// Discovers a target and opens its socket.
    async fn open(&self) -> Result<(TargetDescriptor, SocketHandle)> {
        let target = self.discovery.new_target().await?;
        let url = target.web_socket_debugger_url.clone().ok_or_else(|| {
            Error::connection(format!("Target {} has no webSocketDebuggerUrl", target.id))
        })?;

        debug!(target_id = %target.id, %url, "Opening target socket");
        let socket = SocketHandle::connect(&url, Arc::clone(&self.multiplexer)).await?;
        Ok((target, socket))
    }

    /// Returns `true` if a socket is open.
    fn socket_open(&self) -> bool {
        self.socket
            .lock()
            .as_ref()
            .is_some_and(|socket| !socket.is_closed())
    }
}

// ============================================================================
// Connection
// ============================================================================

#[async_trait]
impl Connection for RemoteDriver {
    fn multiplexer(&self) -> &Multiplexer {
        &self.multiplexer
    }

    /// A socket closed by the remote reports [`ConnectionState::Disconnected`].
    fn state(&self) -> ConnectionState {
        let state = *self.state.lock();
        if state == ConnectionState::Connected && !self.socket_open() {
            ConnectionState::Disconnected
        } else {
            state
        }
    }

    /// Opens a new target. Already connected is a no-op.
    ///
    /// Concurrent calls are serialized; the later ones return once the
    /// first has finished and share its socket.
    async fn connect(&self) -> Result<()> {
        let _connecting = self.connecting.lock().await;
        if self.socket_open() {
            debug!("Already connected");
            return Ok(());
        }

        *self.state.lock() = ConnectionState::Connecting;

        match self.open().await {
            Ok((target, socket)) => {
                info!(
                    target_id = %target.id,
                    endpoint = %self.discovery.base_url(),
                    "Connected to target"
                );

                let stale = self.socket.lock().replace(socket);
                if let Some(stale) = stale {
                    stale.shutdown();
                }
                *self.target.lock() = Some(target);
                *self.state.lock() = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                *self.state.lock() = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Closes the socket and fails the commands still pending on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotConnected`] if `connect()` never succeeded.
    async fn disconnect(&self) -> Result<()> {
        let socket = self.socket.lock().take();
        let Some(socket) = socket else {
            return Err(Error::not_connected("disconnect"));
        };

        socket.close().await;
        self.target.lock().take();
        *self.state.lock() = ConnectionState::Disconnected;

        info!(endpoint = %self.discovery.base_url(), "Disconnected");
        Ok(())
    }

    fn ensure_transport(&self) -> Result<()> {
        match self.socket.lock().as_ref() {
            None => Err(Error::not_connected("send a command")),
            Some(socket) if socket.is_closed() => Err(Error::ConnectionClosed),
            Some(_) => Ok(()),
        }
    }

    fn send_raw_message(&self, message: String) -> Result<()> {
        match self.socket.lock().as_ref() {
            Some(socket) => socket.send(message),
            None => Err(Error::not_connected("send a command")),
        }
    }

    fn dispose(&self) {
        let socket = self.socket.lock().take();
        if let Some(socket) = socket {
            socket.shutdown();
        }
        *self.state.lock() = ConnectionState::Disconnected;
        self.multiplexer.dispose();
    }
}

impl Drop for RemoteDriver {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.get_mut().take() {
            socket.shutdown();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
