//! Minimal transport capability set for the generic-port driver.
//!
//! Any channel that can send text, report inbound text and closure, and
//! be closed can carry the protocol. See [`crate::transport::pipe`] for an
//! in-process implementation.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Types
// ============================================================================

/// Callback registered with [`Port::on`].
///
/// Receives the frame text for [`PortEvent::Message`] and `None` (or a
/// close reason) for [`PortEvent::Closed`].
pub type PortCallback = Box<dyn Fn(Option<&str>) + Send + Sync>;

// ============================================================================
// PortEvent
// ============================================================================

/// Events a [`Port`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortEvent {
    /// One inbound text frame.
    Message,
    /// The channel is closed.
    Closed,
}

impl PortEvent {
    /// Returns the event name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for PortEvent {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "message" => Ok(Self::Message),
            "closed" => Ok(Self::Closed),
            other => Err(Error::invalid_argument(format!(
                "Unknown port event \"{other}\", expected \"message\" or \"closed\""
            ))),
        }
    }
}

impl fmt::Display for PortEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Port
// ============================================================================

/// A bidirectional text channel owned by a [`crate::PortDriver`].
pub trait Port: Send + Sync {
    /// Subscribes `callback` to `event`.
    fn on(&self, event: PortEvent, callback: PortCallback);

    /// Sends one text frame.
    fn send(&self, message: String) -> Result<()>;

    /// Closes the channel.
    fn close(&self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
