//! Remote-endpoint configuration.
//!
//! # Example
//!
//! ```ignore
//! use devtools_connection::RemoteOptions;
//!
//! let options = RemoteOptions::from_env()
//!     .with_host("127.0.0.1")
//!     .with_log_columns(120);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::diagnostics::ProtocolFormatter;
use crate::error::{Error, Result};
use crate::transport::DiscoveryClient;

// ============================================================================
// Constants
// ============================================================================

/// Control-plane host when none is given.
pub const DEFAULT_HOST: &str = "localhost";

/// Control-plane port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 9222;

/// Environment variable selecting the control-plane port.
pub const PORT_ENV_VAR: &str = "PORT";

/// Per-request limit for control-plane calls.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// RemoteOptions
// ============================================================================

/// Where and how to reach a remote debugging endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOptions {
    /// Control-plane host.
    pub host: String,

    /// Control-plane port.
    pub port: u16,

    /// Limit for each control-plane HTTP request.
    pub discovery_timeout: Duration,

    /// Log line width. `None` uses the terminal width.
    pub log_columns: Option<usize>,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            log_columns: None,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl RemoteOptions {
    /// Creates options with defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with the port taken from `PORT`.
    ///
    /// An unset or unparsable value falls back to [`DEFAULT_PORT`].
    #[must_use]
    pub fn from_env() -> Self {
        let value = env::var(PORT_ENV_VAR).ok();
        Self {
            port: port_from_env_value(value.as_deref()),
            ..Self::default()
        }
    }
}

/// Resolves a raw `PORT` value.
pub(crate) fn port_from_env_value(value: Option<&str>) -> u16 {
    let Some(raw) = value else {
        return DEFAULT_PORT;
    };

    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            warn!(value = raw, default = DEFAULT_PORT, "Ignoring invalid PORT");
            DEFAULT_PORT
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl RemoteOptions {
    /// Sets the control-plane host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the control-plane port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request control-plane limit.
    #[inline]
    #[must_use]
    pub fn with_discovery_timeout(mut self, limit: Duration) -> Self {
        self.discovery_timeout = limit;
        self
    }

    /// Fixes the log line width.
    #[inline]
    #[must_use]
    pub fn with_log_columns(mut self, columns: usize) -> Self {
        self.log_columns = Some(columns);
        self
    }
}

// ============================================================================
// Conversion Methods
// ============================================================================

impl RemoteOptions {
    /// Checks the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty host, port 0 or a zero
    /// discovery timeout.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("Host must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("Port must be greater than zero"));
        }
        if self.discovery_timeout.is_zero() {
            return Err(Error::config("Discovery timeout must be greater than zero"));
        }
        Ok(())
    }

    /// Builds the control-plane client.
    ///
    /// # Errors
    ///
    /// See [`DiscoveryClient::new`].
    pub fn discovery(&self) -> Result<DiscoveryClient> {
        DiscoveryClient::new(&self.host, self.port, self.discovery_timeout)
    }

    /// Builds the traffic formatter.
    #[must_use]
    pub fn formatter(&self) -> ProtocolFormatter {
        match self.log_columns {
            Some(columns) => ProtocolFormatter::with_columns(columns),
            None => ProtocolFormatter::from_terminal(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
