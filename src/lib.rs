//! DevTools Connection - command/response channel to a debugging target.
//!
//! This library speaks the JSON remote debugging protocol: numbered
//! commands go out, responses come back matched by ID, and unsolicited
//! notifications fan out to listeners.
//!
//! # Architecture
//!
//! - **[`Connection`]**: the contract every driver implements
//! - **[`Multiplexer`]**: ID allocation, pending table, listener registry
//! - **Drivers**: [`RemoteDriver`] (HTTP discovery + WebSocket) and
//!   [`PortDriver`] (any injected [`Port`])
//!
//! Key design principles:
//!
//! - One ID sequence per connection, starting at 1
//! - Responses are matched by ID, never by order
//! - A command without a response stays pending
//! - Event-driven: the transport pushes frames, nothing polls
//!
//! # Quick Start
//!
//! ```no_run
//! use devtools_connection::{Connection, RemoteDriver, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Target on localhost:$PORT (default 9222)
//!     let driver = RemoteDriver::from_env()?;
//!     driver.connect().await?;
//!
//!     driver.on_notification(|event| println!("{}", event.method))?;
//!     driver.send_command("Page.enable", None).await?;
//!
//!     driver.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connection`] | [`Connection`] trait and [`Multiplexer`] |
//! | [`diagnostics`] | Protocol traffic log lines |
//! | [`driver`] | [`RemoteDriver`] and [`PortDriver`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Command ID newtype and sequence |
//! | [`protocol`] | Wire frame types |
//! | [`transport`] | Discovery, WebSocket and port plumbing |

// ============================================================================
// Modules
// ============================================================================

/// Connection contract and correlation state.
pub mod connection;

/// Protocol traffic formatting.
pub mod diagnostics;

/// Concrete drivers and their configuration.
///
/// Use [`RemoteDriver::builder()`] to configure a remote driver.
pub mod driver;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Command identifiers.
pub mod identifiers;

/// Wire frame types.
pub mod protocol;

/// Transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{
    CommandHandle, Connection, ConnectionState, EventCategory, Multiplexer, NotificationListener,
};

// Diagnostics
pub use diagnostics::{ProtocolFormatter, Traffic};

// Driver types
pub use driver::{PortDriver, RemoteDriver, RemoteDriverBuilder, RemoteOptions};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, CommandIdSequence};

// Protocol types
pub use protocol::{IncomingMessage, Notification, Request, Response};

// Transport types
pub use transport::{
    BrowserVersion, DiscoveryClient, PipeEnd, PipePort, Port, PortCallback, PortEvent,
    SocketHandle, TargetDescriptor, pipe,
};
