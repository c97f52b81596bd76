//! Wire message types.
//!
//! This module defines the JSON frames exchanged between the controller
//! and the instrumented target.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command frame, carries `id` |
//! | `Response` | Remote → Local | Answer to a command, same `id` |
//! | `Notification` | Remote → Local | Unsolicited event, no `id` |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | Notification type and inbound classification |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Notification frames and inbound classification.
pub mod event;

/// Request and Response frames.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{IncomingMessage, Notification};
pub use request::{Request, Response, empty_params};
