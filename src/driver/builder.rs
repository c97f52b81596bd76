//! Builder for [`RemoteDriver`].
//!
//! # Example
//!
//! ```ignore
//! use devtools_connection::RemoteDriver;
//!
//! let driver = RemoteDriver::builder()
//!     .host("127.0.0.1")
//!     .port(9333)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;

use super::options::RemoteOptions;
use super::remote::RemoteDriver;

// ============================================================================
// RemoteDriverBuilder
// ============================================================================

/// Fluent configuration for a [`RemoteDriver`].
///
/// Use [`RemoteDriver::builder()`] to create one. Starts from
/// [`RemoteOptions::from_env`].
#[derive(Debug, Clone)]
pub struct RemoteDriverBuilder {
    options: RemoteOptions,
}

impl Default for RemoteDriverBuilder {
    fn default() -> Self {
        Self {
            options: RemoteOptions::from_env(),
        }
    }
}

impl RemoteDriverBuilder {
    /// Creates a builder seeded from the environment.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the control-plane host.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    /// Sets the control-plane port, overriding `PORT`.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Sets the per-request control-plane limit.
    #[inline]
    #[must_use]
    pub fn discovery_timeout(mut self, limit: Duration) -> Self {
        self.options.discovery_timeout = limit;
        self
    }

    /// Fixes the log line width.
    #[inline]
    #[must_use]
    pub fn log_columns(mut self, columns: usize) -> Self {
        self.options.log_columns = Some(columns);
        self
    }

    /// Replaces all options.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: RemoteOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates the options and creates the driver.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Config`] if the options are invalid
    /// - [`crate::Error::Http`] if the HTTP client can't be built
    pub fn build(self) -> Result<RemoteDriver> {
        RemoteDriver::new(self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================
