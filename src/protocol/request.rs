//! Command and response frames.
//!
//! A command frame carries a correlation `id`; the response frame echoes
//! it back with either a `result` or an `error`.

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::identifiers::CommandId;

// ============================================================================
// Request
// ============================================================================

/// A command frame sent from the controller to the target.
///
/// # Format
///
/// ```json
/// {
///   "id": 1,
///   "method": "Domain.methodName",
///   "params": { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Correlation ID, unique per connection.
    pub id: CommandId,

    /// Command name in `Domain.methodName` format.
    pub method: String,

    /// Command parameters. Always an object on the wire.
    pub params: Value,
}

impl Request {
    /// Creates a command frame.
    ///
    /// Missing or `null` params become an empty object.
    #[must_use]
    pub fn new(id: CommandId, method: impl Into<String>, params: Option<Value>) -> Self {
        let params = match params {
            None | Some(Value::Null) => empty_params(),
            Some(params) => params,
        };

        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Serializes the frame to wire text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if params fail to serialize.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Returns the `{}` value used when a command has no parameters.
#[inline]
#[must_use]
pub fn empty_params() -> Value {
    Value::Object(Map::new())
}

// ============================================================================
// Response
// ============================================================================

/// A response frame correlated to an earlier [`Request`].
///
/// # Format
///
/// Success:
/// ```json
/// { "id": 1, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": 1, "error": { "code": -32000, "message": "..." } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Matches the command `id`.
    pub id: CommandId,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error payload (if error).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl Response {
    /// Creates a success response.
    #[inline]
    #[must_use]
    pub fn success(id: CommandId, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error response.
    #[inline]
    #[must_use]
    pub fn failure(id: CommandId, error: Value) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Returns `true` if the frame carries an `error` field.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Splits the frame into its outcome.
    ///
    /// A frame carrying `error` is a failure even if it also carries
    /// `result`. A success without `result` yields `null`.
    pub fn into_outcome(self) -> StdResult<Value, Value> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
