//! Driver over an injected [`Port`].
//!
//! The port is already open when handed over, so the driver starts
//! [`ConnectionState::Connected`] and `connect()` does nothing. Inbound
//! `message` events go straight to dispatch. A `closed` event, or
//! `disconnect()`, fails what is in flight and leaves the driver
//! [`ConnectionState::Disconnected`] for good.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::connection::{Connection, ConnectionState, Multiplexer};
use crate::diagnostics::ProtocolFormatter;
use crate::error::{Error, Result};
use crate::transport::{Port, PortEvent};

// ============================================================================
// PortDriver
// ============================================================================

/// [`Connection`] over any [`Port`].
pub struct PortDriver<P: Port> {
    /// The injected channel.
    port: P,
    /// Shared with the port callbacks.
    multiplexer: Arc<Multiplexer>,
    /// Shared with the `closed` callback.
    state: Arc<Mutex<ConnectionState>>,
}

impl<P: Port> fmt::Debug for PortDriver<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortDriver")
            .field("state", &*self.state.lock())
            .field("multiplexer", &self.multiplexer)
            .finish_non_exhaustive()
    }
}

impl<P: Port> PortDriver<P> {
    /// Wraps `port` and subscribes to its events.
    #[must_use]
    pub fn new(port: P) -> Self {
        Self::with_closed_handler(port, |_| {})
    }

    /// Wraps `port`, running `on_closed` after the built-in close handling.
    pub fn with_closed_handler<F>(port: P, on_closed: F) -> Self
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        Self::with_formatter(port, ProtocolFormatter::from_terminal(), on_closed)
    }

    /// Wraps `port` with a specific log formatter.
    pub fn with_formatter<F>(port: P, formatter: ProtocolFormatter, on_closed: F) -> Self
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let multiplexer = Arc::new(Multiplexer::with_formatter(formatter));
        let state = Arc::new(Mutex::new(ConnectionState::Connected));

        let inbound = Arc::clone(&multiplexer);
        port.on(
            PortEvent::Message,
            Box::new(move |message: Option<&str>| {
                if let Some(text) = message {
                    inbound.dispatch(text);
                }
            }),
        );

        let closed_mux = Arc::clone(&multiplexer);
        let closed_state = Arc::clone(&state);
        port.on(
            PortEvent::Closed,
            Box::new(move |reason: Option<&str>| {
                *closed_state.lock() = ConnectionState::Disconnected;
                let rejected = closed_mux.reject_all();
                debug!(reason, rejected, "Port closed");
                on_closed(reason);
            }),
        );

        Self {
            port,
            multiplexer,
            state,
        }
    }

    /// Returns the underlying port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> &P {
        &self.port
    }
}

// ============================================================================
// Connection
// ============================================================================

#[async_trait]
impl<P: Port> Connection for PortDriver<P> {
    fn multiplexer(&self) -> &Multiplexer {
        &self.multiplexer
    }

    fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Always succeeds; the port is open on arrival.
    ///
    /// A closed port stays [`ConnectionState::Disconnected`].
    async fn connect(&self) -> Result<()> {
        if *self.state.lock() == ConnectionState::Disconnected {
            debug!("Port already closed, connect has no effect");
        }
        Ok(())
    }

    /// Closes the port and fails every pending command.
    async fn disconnect(&self) -> Result<()> {
        self.port.close()?;
        *self.state.lock() = ConnectionState::Disconnected;
        self.multiplexer.reject_all();
        Ok(())
    }

    fn ensure_transport(&self) -> Result<()> {
        match *self.state.lock() {
            ConnectionState::Disconnected => Err(Error::ConnectionClosed),
            _ => Ok(()),
        }
    }

    fn send_raw_message(&self, message: String) -> Result<()> {
        self.port.send(message)
    }

    fn dispose(&self) {
        if let Err(e) = self.port.close() {
            debug!(error = %e, "Port close failed during dispose");
        }
        *self.state.lock() = ConnectionState::Disconnected;
        self.multiplexer.dispose();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready, task};

    use crate::protocol::{Notification, Response};
    use crate::transport::{PipeEnd, PipePort, pipe};

    fn driver() -> (PortDriver<PipePort>, PipeEnd) {
        let (port, target) = pipe();
        let driver = PortDriver::with_formatter(port, ProtocolFormatter::unbounded(), |_| {});
        (driver, target)
    }

    #[test]
    fn test_connect_resolves_immediately() {
        let (driver, _target) = driver();
        let mut connect = task::spawn(driver.connect());

        assert!(assert_ready!(connect.poll()).is_ok());
        drop(connect);
        assert_eq!(driver.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_state_follows_port_lifetime() {
        let (driver, target) = driver();
        assert_eq!(driver.state(), ConnectionState::Connected);

        target.close(None);
        assert_eq!(driver.state(), ConnectionState::Disconnected);

        driver.connect().await.expect("connect");
        assert_eq!(driver.state(), ConnectionState::Disconnected);
        assert!(matches!(
            driver.send_command("Page.enable", None).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_network_enable_round_trip() {
        let (driver, mut target) = driver();
        driver.connect().await.expect("connect");

        let handle = driver.send_command("Network.enable", None);
        assert_eq!(
            target.recv().await.as_deref(),
            Some(r#"{"id":1,"method":"Network.enable","params":{}}"#)
        );

        target.deliver(r#"{"id":1,"result":{}}"#).expect("deliver");
        assert_eq!(handle.await.expect("resolved"), json!({}));
    }

    #[tokio::test]
    async fn test_out_of_order_responses() {
        let (driver, mut target) = driver();
        driver.connect().await.expect("connect");

        let first = driver.send_command("Runtime.evaluate", Some(json!({"expression": "1"})));
        let second = driver.send_command("Runtime.evaluate", Some(json!({"expression": "2"})));
        let a = target.next_request().await.expect("first");
        let b = target.next_request().await.expect("second");

        target
            .deliver_response(&Response::success(b.id, json!({"value": 2})))
            .expect("deliver");
        target
            .deliver_response(&Response::success(a.id, json!({"value": 1})))
            .expect("deliver");

        assert_eq!(first.await.expect("first"), json!({"value": 1}));
        assert_eq!(second.await.expect("second"), json!({"value": 2}));
    }

    #[tokio::test]
    async fn test_error_response_fails_only_its_command() {
        let (driver, mut target) = driver();
        let bad = driver.send_command("Page.navigate", Some(json!({"url": "bogus"})));
        let good = driver.send_command("Page.enable", None);
        let bad_request = target.next_request().await.expect("bad");
        let good_request = target.next_request().await.expect("good");

        target
            .deliver_response(&Response::failure(
                bad_request.id,
                json!({"code": -32000, "message": "Cannot navigate to invalid URL"}),
            ))
            .expect("deliver");
        target
            .deliver_response(&Response::success(good_request.id, json!({})))
            .expect("deliver");

        let err = bad.await.expect_err("should fail");
        assert!(err.is_remote());
        assert!(err.to_string().contains("Cannot navigate to invalid URL"));
        assert!(good.await.is_ok());
    }

    #[tokio::test]
    async fn test_notifications_reach_listeners_not_commands() {
        let (driver, mut target) = driver();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        driver
            .on(
                "notification",
                Box::new(move |event: &Notification| {
                    seen_clone.lock().push(event.method.clone());
                }),
            )
            .expect("listener");

        let mut handle = task::spawn(driver.send_command("Page.enable", None));
        let request = target.next_request().await.expect("request");

        target
            .deliver_notification(&Notification::new(
                "Page.frameNavigated",
                json!({"frame": {}}),
            ))
            .expect("deliver");
        target
            .deliver_notification(&Notification::new("Page.loadEventFired", json!({})))
            .expect("deliver");

        assert_pending!(handle.poll());
        assert_eq!(
            seen.lock().as_slice(),
            ["Page.frameNavigated", "Page.loadEventFired"]
        );

        target
            .deliver_response(&Response::success(request.id, json!({})))
            .expect("deliver");
        assert!(handle.is_woken());
        assert!(assert_ready!(handle.poll()).is_ok());
    }

    #[tokio::test]
    async fn test_remote_close_fails_pending_and_runs_handler() {
        let (port, target) = pipe();
        let closes = Arc::new(AtomicUsize::new(0));
        let closes_clone = Arc::clone(&closes);
        let driver = PortDriver::with_formatter(port, ProtocolFormatter::unbounded(), move |_| {
            closes_clone.fetch_add(1, Ordering::SeqCst);
        });
        driver.connect().await.expect("connect");

        let handle = driver.send_command("Page.enable", None);
        target.close(Some("target crashed"));

        assert!(matches!(handle.await, Err(Error::ConnectionClosed)));
        assert_eq!(driver.state(), ConnectionState::Disconnected);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(matches!(
            driver.send_command("Page.enable", None).await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_disconnect_closes_port() {
        let (driver, mut target) = driver();
        driver.connect().await.expect("connect");
        let handle = driver.send_command("Page.enable", None);

        driver.disconnect().await.expect("disconnect");

        assert!(target.is_closed());
        assert!(matches!(handle.await, Err(Error::ConnectionClosed)));
        assert_eq!(driver.pending_count(), 0);
        let _ = target.recv().await;
        assert!(target.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_listener_can_issue_commands() {
        let (port, mut target) = pipe();
        let driver = Arc::new(PortDriver::with_formatter(
            port,
            ProtocolFormatter::unbounded(),
            |_| {},
        ));
        let handles = Arc::new(Mutex::new(Vec::new()));

        let reentrant = Arc::downgrade(&driver);
        let handles_clone = Arc::clone(&handles);
        driver
            .on_notification(move |_| {
                if let Some(driver) = reentrant.upgrade() {
                    handles_clone
                        .lock()
                        .push(driver.send_command("Runtime.runIfWaitingForDebugger", None));
                }
            })
            .expect("listener");

        target
            .deliver(r#"{"method":"Target.attachedToTarget","params":{}}"#)
            .expect("deliver");

        let request = target.next_request().await.expect("request");
        assert_eq!(request.method, "Runtime.runIfWaitingForDebugger");
        assert_eq!(handles.lock().len(), 1);
        assert_eq!(driver.pending_count(), 1);
    }
}
