//! Type-safe identifiers for protocol traffic.
//!
//! [`CommandId`] wraps the positive integer carried in the `id` field of
//! command and response frames. [`CommandIdSequence`] hands them out per
//! connection.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CommandId
// ============================================================================

/// Correlation ID of a command frame and its response.
///
/// Always positive. Serialized as a bare JSON integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(NonZeroU64);

impl CommandId {
    /// Creates a command ID, returning `None` for zero.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Option<Self> {
        match NonZeroU64::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the raw integer value.
    #[inline]
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CommandIdSequence
// ============================================================================

/// Monotonically increasing ID source scoped to one connection.
///
/// The first ID issued is `1`.
#[derive(Debug, Default)]
pub struct CommandIdSequence {
    last: AtomicU64,
}

impl CommandIdSequence {
    /// Creates a sequence whose next ID is `1`.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Returns the next ID.
    #[must_use]
    pub fn next_id(&self) -> CommandId {
        let id = self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        // Zero only after wrapping past u64::MAX.
        CommandId::new(id).unwrap_or(CommandId(NonZeroU64::MIN))
    }

    /// Returns the most recently issued ID, if any.
    #[inline]
    #[must_use]
    pub fn last_id(&self) -> Option<CommandId> {
        CommandId::new(self.last.load(Ordering::Relaxed))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_id_rejects_zero() {
        assert!(CommandId::new(0).is_none());
        assert_eq!(CommandId::new(3).map(|id| id.as_u64()), Some(3));
    }

    #[test]
    fn test_command_id_serializes_as_integer() {
        let id = CommandId::new(42).expect("valid id");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "42");

        let parsed: CommandId = serde_json::from_str("42").expect("parse");
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<CommandId>("0").is_err());
    }

    #[test]
    fn test_sequence_starts_at_one() {
        let sequence = CommandIdSequence::new();
        assert!(sequence.last_id().is_none());
        assert_eq!(sequence.next_id().as_u64(), 1);
        assert_eq!(sequence.next_id().as_u64(), 2);
        assert_eq!(sequence.last_id().map(|id| id.as_u64()), Some(2));
    }

    #[test]
    fn test_sequences_are_independent() {
        let first = CommandIdSequence::new();
        let second = CommandIdSequence::new();

        let _ = first.next_id();
        let _ = first.next_id();
        assert_eq!(second.next_id().as_u64(), 1);
    }
}
