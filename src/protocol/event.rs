//! Notification frames and inbound frame classification.
//!
//! Notifications are pushed by the target without a prior command. They
//! never carry an `id`; any frame that does is a response.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::request::{Response, empty_params};

// ============================================================================
// Notification
// ============================================================================

/// An unsolicited event from the target.
///
/// # Format
///
/// ```json
/// {
///   "method": "Domain.eventName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default = "empty_params")]
    pub params: Value,
}

impl Notification {
    /// Creates a notification.
    #[inline]
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Returns the domain part of the method.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let event = Notification::new("Page.loadEventFired", json!({}));
    /// assert_eq!(event.domain(), "Page");
    /// ```
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns the event name part of the method.
    #[inline]
    #[must_use]
    pub fn event_name(&self) -> &str {
        self.method.split_once('.').map(|(_, name)| name).unwrap_or_default()
    }
}

// ============================================================================
// IncomingMessage
// ============================================================================

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMessage {
    /// Frame with an `id`, answering a command.
    Response(Response),
    /// Frame without an `id`.
    Notification(Notification),
}

impl IncomingMessage {
    /// Decodes and classifies one wire frame.
    ///
    /// The presence of an `id` key decides the shape; a malformed `id` is
    /// an error, never a fallback to notification.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not JSON
    /// - [`Error::Protocol`] if the frame is not an object, or its fields
    ///   don't match the selected shape
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;

        let Some(object) = value.as_object() else {
            return Err(Error::protocol("frame is not a JSON object"));
        };

        if object.contains_key("id") {
            let response = serde_json::from_value(value)
                .map_err(|e| Error::protocol(format!("invalid response frame: {e}")))?;
            return Ok(Self::Response(response));
        }

        let notification = serde_json::from_value(value)
            .map_err(|e| Error::protocol(format!("invalid notification frame: {e}")))?;
        Ok(Self::Notification(notification))
    }
}

// ============================================================================
// Tests
// ============================================================================
