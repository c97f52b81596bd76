//! The connection contract shared by every driver.
//!
//! A driver binds [`Connection`] to one transport. It supplies `connect`,
//! `disconnect` and the raw-send hook; the provided methods run command
//! correlation and notification routing through the driver's
//! [`Multiplexer`].
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect()──► Connecting ──ready──► Connected
//!      ▲                          │                    │
//!      └────────── failure ───────┘                    │
//!      └──────────────── disconnect() / dispose() ─────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use devtools_connection::{Connection, RemoteDriver};
//!
//! let driver = RemoteDriver::from_env()?;
//! driver.connect().await?;
//! driver.on_notification(|event| println!("{}", event.method))?;
//! let tree = driver.send_command("Page.getFrameTree", None).await?;
//! driver.disconnect().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Pending-request table, correlation and fan-out.
pub mod multiplexer;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::timeout;
use tracing::warn;

use crate::error::{Error, Result};
use crate::protocol::Notification;

pub use multiplexer::{CommandHandle, Multiplexer, NotificationListener};

// ============================================================================
// ConnectionState
// ============================================================================

/// Transport lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport. Initial and final state.
    #[default]
    Disconnected,
    /// `connect()` in progress.
    Connecting,
    /// Transport ready for commands.
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(name)
    }
}

// ============================================================================
// EventCategory
// ============================================================================

/// Event categories accepted by [`Connection::on`].
///
/// Only notifications can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    /// Unsolicited events from the target.
    Notification,
}

impl EventCategory {
    /// Returns the name used with [`Connection::on`].
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Notification => "notification",
        }
    }
}

impl FromStr for EventCategory {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "notification" => Ok(Self::Notification),
            other => Err(Error::invalid_argument(format!(
                "Only supports \"notification\" events, got \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Connection
// ============================================================================

/// A command/response channel to an instrumented target.
///
/// Implementors provide [`Connection::multiplexer`], [`Connection::state`]
/// and override `connect`, `disconnect` and `send_raw_message`; the
/// defaults of those three fail with [`Error::NotImplemented`].
#[async_trait]
pub trait Connection: Send + Sync {
    /// Returns the shared correlation state.
    fn multiplexer(&self) -> &Multiplexer;

    /// Returns the current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// Establishes the transport.
    async fn connect(&self) -> Result<()> {
        Err(Error::not_implemented("connect"))
    }

    /// Tears down the transport.
    async fn disconnect(&self) -> Result<()> {
        Err(Error::not_implemented("disconnect"))
    }

    /// Writes one serialized frame to the transport.
    fn send_raw_message(&self, _message: String) -> Result<()> {
        Err(Error::not_implemented("send_raw_message"))
    }

    /// Checks that a command can be sent right now.
    ///
    /// Runs before an ID is allocated. The default accepts.
    fn ensure_transport(&self) -> Result<()> {
        Ok(())
    }

    /// Sends a command and returns a handle to its outcome.
    ///
    /// The frame is written before this returns; awaiting the handle only
    /// waits for the response. `params` defaults to `{}`.
    ///
    /// There is no timeout: if the target never answers, the handle stays
    /// pending and the entry stays in the table. Use
    /// [`Connection::send_command_with_timeout`] to bound the wait.
    fn send_command(&self, method: &str, params: Option<Value>) -> CommandHandle {
        if let Err(e) = self.ensure_transport() {
            return CommandHandle::failed(method, e);
        }
        self.multiplexer()
            .send_with(method, params, |message| self.send_raw_message(message))
    }

    /// Sends a command and waits at most `limit` for the response.
    ///
    /// On expiry the pending entry is removed.
    ///
    /// # Errors
    ///
    /// - [`Error::CommandTimeout`] if no response arrives within `limit`
    /// - any error [`Connection::send_command`] can produce
    async fn send_command_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        limit: Duration,
    ) -> Result<Value> {
        let handle = self.send_command(method, params);
        let Some(id) = handle.id() else {
            return handle.await;
        };

        match timeout(limit, handle).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.multiplexer().forget(id);
                let timeout_ms = saturating_millis(limit);
                warn!(%id, method, timeout_ms, "Command timed out");
                Err(Error::command_timeout(id, method, timeout_ms))
            }
        }
    }

    /// Registers a listener for `event_name`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] unless `event_name` is `"notification"`
    /// - [`Error::ConnectionClosed`] after [`Connection::dispose`]
    fn on(&self, event_name: &str, listener: NotificationListener) -> Result<()> {
        let category: EventCategory = event_name.parse()?;
        match category {
            EventCategory::Notification => self.multiplexer().add_listener(listener),
        }
    }

    /// Registers a notification listener from a closure.
    fn on_notification<F>(&self, listener: F) -> Result<()>
    where
        F: Fn(&Notification) + Send + Sync + 'static,
        Self: Sized,
    {
        self.multiplexer().add_listener(Box::new(listener))
    }

    /// Routes one inbound frame. Drivers call this for every text frame.
    fn handle_raw_message(&self, message: &str) {
        self.multiplexer().dispatch(message);
    }

    /// Releases all listeners and fails every pending command.
    ///
    /// Notifications arriving afterwards are discarded.
    fn dispose(&self) {
        self.multiplexer().dispose();
    }

    /// Returns the number of commands awaiting a response.
    fn pending_count(&self) -> usize {
        self.multiplexer().pending_count()
    }
}

/// Converts `limit` to whole milliseconds, capped at `u64::MAX`.
fn saturating_millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================
