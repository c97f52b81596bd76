//! Bounded-length log lines for protocol traffic.
//!
//! Each command, response and notification produces one line:
//!
//! ```text
//! method => browser Network.enable {}
//! method <= browser OK Network.enable {}
//! method <= browser EVENT Page.loadEventFired {"timestamp":1.5}
//! ```
//!
//! The serialized params are cut so the line fits the terminal width,
//! keeping [`LOGGING_BUFFER_COLUMNS`] spare. Without a known width the
//! params are never cut.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, error};

// ============================================================================
// Constants
// ============================================================================

/// Columns reserved for the subscriber's own decoration (time, level, target).
pub const LOGGING_BUFFER_COLUMNS: usize = 25;

/// Bulk-read method whose payloads are never logged.
pub const BULK_READ_METHOD: &str = "IO.read";

/// Placeholder when a frame has no method.
const UNKNOWN_METHOD: &str = "?????";

// ============================================================================
// Traffic
// ============================================================================

/// Direction and outcome of one logged frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traffic {
    /// Command frame sent to the target.
    Outgoing,
    /// Success response.
    ResponseOk,
    /// Error response.
    ResponseErr,
    /// Notification.
    Event,
}

impl Traffic {
    /// Returns the fixed line prefix.
    #[inline]
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Outgoing => "method => browser",
            Self::ResponseOk => "method <= browser OK",
            Self::ResponseErr => "method <= browser ERR",
            Self::Event => "method <= browser EVENT",
        }
    }

    /// Returns `true` if this traffic logs at error severity.
    #[inline]
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::ResponseErr)
    }
}

// ============================================================================
// ProtocolFormatter
// ============================================================================

/// Formats and emits protocol log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolFormatter {
    /// Output width, `None` when unknown.
    columns: Option<usize>,
}

impl Default for ProtocolFormatter {
    fn default() -> Self {
        Self::from_terminal()
    }
}

impl ProtocolFormatter {
    /// Creates a formatter with a fixed width.
    #[inline]
    #[must_use]
    pub const fn with_columns(columns: usize) -> Self {
        Self {
            columns: Some(columns),
        }
    }

    /// Creates a formatter that never truncates.
    #[inline]
    #[must_use]
    pub const fn unbounded() -> Self {
        Self { columns: None }
    }

    /// Creates a formatter sized to the current terminal.
    ///
    /// Falls back to unbounded when stdout is not a terminal.
    #[must_use]
    pub fn from_terminal() -> Self {
        match crossterm::terminal::size() {
            Ok((columns, _)) if columns > 0 => Self::with_columns(usize::from(columns)),
            _ => Self::unbounded(),
        }
    }

    /// Returns the configured width.
    #[inline]
    #[must_use]
    pub const fn columns(&self) -> Option<usize> {
        self.columns
    }

    /// Renders the params snippet for `method`.
    #[must_use]
    pub fn snippet(&self, prefix: &str, method: &str, params: Option<&Value>) -> String {
        let Some(params) = params else {
            return String::new();
        };
        if method == BULK_READ_METHOD {
            return String::new();
        }

        let text = params.to_string();
        match self.columns {
            None => text,
            Some(columns) => {
                let max_len = columns
                    .saturating_sub(method.len())
                    .saturating_sub(prefix.len())
                    .saturating_sub(LOGGING_BUFFER_COLUMNS);
                text.chars().take(max_len).collect()
            }
        }
    }

    /// Renders the full line.
    #[must_use]
    pub fn format(&self, traffic: Traffic, method: Option<&str>, params: Option<&Value>) -> String {
        let prefix = traffic.prefix();
        let method = method.unwrap_or(UNKNOWN_METHOD);
        let snippet = self.snippet(prefix, method, params);

        if snippet.is_empty() {
            format!("{prefix} {method}")
        } else {
            format!("{prefix} {method} {snippet}")
        }
    }

    /// Emits the line through `tracing`.
    ///
    /// Failures log at `error`, everything else at `debug`.
    pub fn log(&self, traffic: Traffic, method: Option<&str>, params: Option<&Value>) {
        if traffic.is_failure() {
            error!(target: "devtools_connection::protocol", "{}", self.format(traffic, method, params));
        } else if tracing::enabled!(target: "devtools_connection::protocol", tracing::Level::DEBUG) {
            debug!(target: "devtools_connection::protocol", "{}", self.format(traffic, method, params));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
