//! Error types for devtools connections.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use devtools_connection::{Connection, Result};
//!
//! async fn example(connection: &impl Connection) -> Result<()> {
//!     connection.connect().await?;
//!     connection.send_command("Network.enable", None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Transport unavailable | [`Error::NotConnected`], [`Error::NotImplemented`] |
//! | Discovery | [`Error::Discovery`], [`Error::Http`], [`Error::Url`] |
//! | Transport | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::WebSocket`] |
//! | Remote command | [`Error::Remote`], [`Error::CommandTimeout`] |
//! | Contract | [`Error::InvalidArgument`], [`Error::Protocol`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when driver options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Availability Errors
    // ========================================================================
    /// Operation requires a connected transport.
    #[error("connect() must be called before attempting to {operation}.")]
    NotConnected {
        /// What the caller tried to do.
        operation: &'static str,
    },

    /// The connection does not implement this operation.
    #[error("Not implemented: {operation}")]
    NotImplemented {
        /// The missing operation.
        operation: &'static str,
    },

    // ========================================================================
    // Discovery Errors
    // ========================================================================
    /// Control-plane request returned a non-200 status.
    #[error("Unable to fetch, status: {status}")]
    Discovery {
        /// HTTP status code returned by the endpoint.
        status: u16,
    },

    /// HTTP client error during discovery.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Malformed endpoint or socket URL.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Connection could not be established or used.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed while the operation was outstanding.
    #[error("Connection closed")]
    ConnectionClosed,

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    // ========================================================================
    // Remote Command Errors
    // ========================================================================
    /// The remote end answered a command with an error frame.
    #[error("Remote error for {method}: {message}")]
    Remote {
        /// Method of the failed command.
        method: String,
        /// Human-readable message extracted from the payload.
        message: String,
        /// The raw `error` payload from the response frame.
        payload: Value,
    },

    /// Caller-imposed deadline elapsed before a response arrived.
    #[error("Command {id} ({method}) timed out after {timeout_ms}ms")]
    CommandTimeout {
        /// The command that timed out.
        id: CommandId,
        /// Method of the command.
        method: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Contract Errors
    // ========================================================================
    /// Invalid argument passed to the connection contract.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// Malformed frame or unexpected message shape.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a not-connected error for `operation`.
    #[inline]
    pub fn not_connected(operation: &'static str) -> Self {
        Self::NotConnected { operation }
    }

    /// Creates a not-implemented error.
    #[inline]
    pub fn not_implemented(operation: &'static str) -> Self {
        Self::NotImplemented { operation }
    }

    /// Creates a discovery error from an HTTP status.
    #[inline]
    pub fn discovery(status: u16) -> Self {
        Self::Discovery { status }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a remote command error from a response frame's `error` payload.
    ///
    /// The message is taken from `payload.message` when the payload is an
    /// object, or the payload itself when it is a string.
    pub fn remote(method: impl Into<String>, payload: Value) -> Self {
        let message = match &payload {
            Value::String(text) => text.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| payload.to_string()),
            other => other.to_string(),
        };

        Self::Remote {
            method: method.into(),
            message,
            payload,
        }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn command_timeout(id: CommandId, method: impl Into<String>, timeout_ms: u64) -> Self {
        Self::CommandTimeout {
            id,
            method: method.into(),
            timeout_ms,
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::CommandTimeout { .. })
    }

    /// Returns `true` if the remote end rejected the command.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected { .. }
                | Self::Discovery { .. }
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
                | Self::Http(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed when the caller retries.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CommandTimeout { .. } | Self::Discovery { .. } | Self::Remote { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
