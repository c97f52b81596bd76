//! HTTP control plane of a debugging endpoint.
//!
//! The endpoint exposes JSON commands under `/json/`:
//!
//! | Command | Result |
//! |---------|--------|
//! | `new` | Descriptor of a freshly opened target |
//! | `list` | Descriptors of all targets |
//! | `version` | Browser and protocol versions |
//! | `close/<id>` | Closes a target |
//!
//! Every command is a `GET`; anything but `200 OK` is a
//! [`Error::Discovery`] carrying the status.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// TargetDescriptor
// ============================================================================

/// One debuggable target as reported by the control plane.
///
/// # Format
///
/// ```json
/// {
///   "id": "A1B2C3",
///   "type": "page",
///   "title": "about:blank",
///   "url": "about:blank",
///   "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/A1B2C3"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetDescriptor {
    /// Target ID.
    #[serde(default)]
    pub id: String,

    /// Target kind (`page`, `service_worker`, ...).
    #[serde(rename = "type", default)]
    pub target_type: String,

    /// Page title.
    #[serde(default)]
    pub title: String,

    /// Current URL.
    #[serde(default)]
    pub url: String,

    /// Socket URL for the protocol channel.
    ///
    /// Absent when another client is already attached.
    #[serde(default)]
    pub web_socket_debugger_url: Option<String>,

    /// Front-end URL for manual inspection.
    #[serde(default)]
    pub devtools_frontend_url: Option<String>,
}

// ============================================================================
// BrowserVersion
// ============================================================================

/// Result of `/json/version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserVersion {
    /// Product name and version.
    #[serde(rename = "Browser")]
    pub browser: String,

    /// Protocol version.
    #[serde(rename = "Protocol-Version", default)]
    pub protocol_version: String,

    /// User agent string.
    #[serde(rename = "User-Agent", default)]
    pub user_agent: String,

    /// Browser-level socket URL.
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub web_socket_debugger_url: Option<String>,
}

// ============================================================================
// DiscoveryClient
// ============================================================================

/// Client for the `/json/` control plane.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    /// `http://host:port/`
    base: Url,
    /// Shared HTTP client.
    http: reqwest::Client,
}

impl DiscoveryClient {
    /// Creates a client for `http://{host}:{port}/`.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if host and port don't form a valid URL
    /// - [`Error::Http`] if the HTTP client can't be built
    pub fn new(host: &str, port: u16, request_timeout: Duration) -> Result<Self> {
        let base = Url::parse(&format!("http://{host}:{port}/"))?;
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self { base, http })
    }

    /// Returns the control-plane base URL.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Returns the URL for a `/json/` command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if `command` is not a valid path.
    pub fn command_url(&self, command: &str) -> Result<Url> {
        Ok(self.base.join(&format!("json/{command}"))?)
    }

    /// Opens a new target.
    ///
    /// # Errors
    ///
    /// - [`Error::Discovery`] on a non-200 status
    /// - [`Error::Http`] on transport or decoding failure
    pub async fn new_target(&self) -> Result<TargetDescriptor> {
        self.run_json_command("new").await
    }

    /// Lists all targets.
    ///
    /// # Errors
    ///
    /// Same as [`DiscoveryClient::new_target`].
    pub async fn list_targets(&self) -> Result<Vec<TargetDescriptor>> {
        self.run_json_command("list").await
    }

    /// Fetches browser and protocol versions.
    ///
    /// # Errors
    ///
    /// Same as [`DiscoveryClient::new_target`].
    pub async fn version(&self) -> Result<BrowserVersion> {
        self.run_json_command("version").await
    }

    /// Closes the target with `id`.
    ///
    /// # Errors
    ///
    /// - [`Error::Discovery`] on a non-200 status
    /// - [`Error::Http`] on transport failure
    pub async fn close_target(&self, id: &str) -> Result<()> {
        let response = self.get(&format!("close/{id}")).await?;
        let body = response.text().await?;
        debug!(id, body = %body.trim(), "Target close requested");
        Ok(())
    }

    /// Runs a command and decodes its JSON body.
    async fn run_json_command<T: DeserializeOwned>(&self, command: &str) -> Result<T> {
        let response = self.get(command).await?;
        Ok(response.json::<T>().await?)
    }

    /// Issues `GET /json/{command}` and checks for `200 OK`.
    async fn get(&self, command: &str) -> Result<reqwest::Response> {
        let url = self.command_url(command)?;
        debug!(%url, "Control-plane request");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::discovery(status.as_u16()));
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> DiscoveryClient {
        let address = server.address();
        DiscoveryClient::new(
            &address.ip().to_string(),
            address.port(),
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[test]
    fn test_command_url() {
        let client =
            DiscoveryClient::new("localhost", 9222, Duration::from_secs(1)).expect("client");
        assert_eq!(client.base_url().as_str(), "http://localhost:9222/");
        assert_eq!(
            client.command_url("new").expect("url").as_str(),
            "http://localhost:9222/json/new"
        );
    }

    #[test]
    fn test_invalid_host() {
        let err = DiscoveryClient::new("bad host", 9222, Duration::from_secs(1))
            .expect_err("should fail");
        assert!(matches!(err, Error::Url(_)));
    }

    #[test]
    fn test_descriptor_parse() {
        let descriptor: TargetDescriptor = serde_json::from_value(json!({
            "description": "",
            "devtoolsFrontendUrl": "/devtools/inspector.html?ws=localhost:9222/devtools/page/AB",
            "id": "AB",
            "title": "about:blank",
            "type": "page",
            "url": "about:blank",
            "webSocketDebuggerUrl": "ws://localhost:9222/devtools/page/AB"
        }))
        .expect("parse");

        assert_eq!(descriptor.id, "AB");
        assert_eq!(descriptor.target_type, "page");
        assert_eq!(
            descriptor.web_socket_debugger_url.as_deref(),
            Some("ws://localhost:9222/devtools/page/AB")
        );
    }

    #[tokio::test]
    async fn test_new_target() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "T1",
                "type": "page",
                "webSocketDebuggerUrl": "ws://127.0.0.1:1/devtools/page/T1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let target = client_for(&server).new_target().await.expect("target");
        assert_eq!(target.id, "T1");
        assert_eq!(
            target.web_socket_debugger_url.as_deref(),
            Some("ws://127.0.0.1:1/devtools/page/T1")
        );
    }

    #[tokio::test]
    async fn test_non_200_is_discovery_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/new"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;

        let err = client_for(&server).new_target().await.expect_err("should fail");
        assert!(matches!(err, Error::Discovery { status: 405 }));
        assert_eq!(err.to_string(), "Unable to fetch, status: 405");
    }

    #[tokio::test]
    async fn test_list_version_and_close() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "A", "type": "page", "webSocketDebuggerUrl": "ws://h/devtools/page/A"},
                {"id": "B", "type": "service_worker"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/json/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Browser": "HeadlessChrome/120.0.0.0",
                "Protocol-Version": "1.3",
                "User-Agent": "Mozilla/5.0",
                "webSocketDebuggerUrl": "ws://h/devtools/browser/X"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/json/close/A"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Target is closing"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);

        let targets = client.list_targets().await.expect("list");
        assert_eq!(targets.len(), 2);
        assert!(targets[1].web_socket_debugger_url.is_none());

        let version = client.version().await.expect("version");
        assert_eq!(version.protocol_version, "1.3");
        assert_eq!(version.browser, "HeadlessChrome/120.0.0.0");

        client.close_target("A").await.expect("close");
    }
}
