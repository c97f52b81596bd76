//! Concrete connection drivers.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RemoteDriver`] | Discovers a target over HTTP, talks over WebSocket |
//! | [`RemoteDriverBuilder`] | Fluent configuration builder |
//! | [`RemoteOptions`] | Host, port and logging options |
//! | [`PortDriver`] | Talks over any injected [`crate::transport::Port`] |
//!
//! # Example
//!
//! ```no_run
//! use devtools_connection::{Connection, RemoteDriver, Result};
//!
//! # async fn example() -> Result<()> {
//! let driver = RemoteDriver::builder().port(9222).build()?;
//! driver.connect().await?;
//!
//! let version = driver.send_command("Browser.getVersion", None).await?;
//! println!("{version}");
//!
//! driver.disconnect().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for the remote driver.
pub mod builder;

/// Remote-endpoint configuration.
pub mod options;

/// Generic-port driver.
pub mod port;

/// Remote-endpoint driver.
pub mod remote;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::RemoteDriverBuilder;
pub use options::{DEFAULT_HOST, DEFAULT_PORT, RemoteOptions};
pub use port::PortDriver;
pub use remote::RemoteDriver;
