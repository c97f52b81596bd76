//! In-process [`Port`] implementation.
//!
//! [`pipe`] returns two ends: the [`PipePort`] handed to a
//! [`crate::PortDriver`], and a [`PipeEnd`] that plays the target. Frames
//! the driver sends queue up on the `PipeEnd`; frames the `PipeEnd`
//! delivers run the driver's message callbacks synchronously.
//!
//! # Example
//!
//! ```ignore
//! let (port, mut target) = pipe();
//! let driver = PortDriver::new(port);
//!
//! let handle = driver.send_command("Runtime.enable", None);
//! let request = target.next_request().await.expect("frame");
//! target.deliver_response(&Response::success(request.id, json!({})))?;
//! handle.await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{Notification, Request, Response};

use super::port::{Port, PortCallback, PortEvent};

// ============================================================================
// Types
// ============================================================================

/// Shared form of a registered callback.
type SharedCallback = Arc<dyn Fn(Option<&str>) + Send + Sync>;

/// State shared by both ends.
#[derive(Default)]
struct PipeShared {
    /// Callbacks for inbound frames.
    on_message: Mutex<Vec<SharedCallback>>,
    /// Callbacks for closure.
    on_closed: Mutex<Vec<SharedCallback>>,
    /// Outbound queue, taken on close so the reader sees end-of-stream.
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    /// Set once either end closes.
    closed: AtomicBool,
}

impl PipeShared {
    /// Closes the pipe once and notifies `closed` subscribers.
    fn close(&self, reason: Option<&str>) -> bool {
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }

        self.outbound.lock().take();
        let callbacks = self.on_closed.lock().clone();
        for callback in callbacks {
            callback(reason);
        }

        debug!(reason, "Pipe closed");
        true
    }
}

/// Creates a connected pair of pipe ends.
#[must_use]
pub fn pipe() -> (PipePort, PipeEnd) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(PipeShared {
        outbound: Mutex::new(Some(outbound_tx)),
        ..Default::default()
    });

    (
        PipePort {
            shared: Arc::clone(&shared),
        },
        PipeEnd {
            shared,
            outbound: outbound_rx,
        },
    )
}

// ============================================================================
// PipePort
// ============================================================================

/// The controller side of a pipe.
pub struct PipePort {
    shared: Arc<PipeShared>,
}

impl fmt::Debug for PipePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipePort")
            .field("closed", &self.shared.closed.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Port for PipePort {
    fn on(&self, event: PortEvent, callback: PortCallback) {
        let callbacks = match event {
            PortEvent::Message => &self.shared.on_message,
            PortEvent::Closed => &self.shared.on_closed,
        };
        callbacks.lock().push(Arc::from(callback));
    }

    fn send(&self, message: String) -> Result<()> {
        match self.shared.outbound.lock().as_ref() {
            Some(outbound) => outbound.send(message).map_err(|_| Error::ConnectionClosed),
            None => Err(Error::ConnectionClosed),
        }
    }

    fn close(&self) -> Result<()> {
        self.shared.close(None);
        Ok(())
    }
}

// ============================================================================
// PipeEnd
// ============================================================================

/// The target side of a pipe.
pub struct PipeEnd {
    shared: Arc<PipeShared>,
    outbound: mpsc::UnboundedReceiver<String>,
}

impl fmt::Debug for PipeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipeEnd")
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl PipeEnd {
    /// Waits for the next frame sent by the controller.
    ///
    /// Returns `None` once the pipe is closed and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Returns the next queued frame without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Waits for the next frame and decodes it as a command.
    ///
    /// Frames that don't decode are skipped with a warning.
    pub async fn next_request(&mut self) -> Option<Request> {
        while let Some(text) = self.recv().await {
            match serde_json::from_str(&text) {
                Ok(request) => return Some(request),
                Err(e) => warn!(error = %e, "Pipe received non-command frame"),
            }
        }
        None
    }

    /// Delivers one text frame to the controller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the pipe is closed.
    pub fn deliver(&self, message: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let callbacks = self.shared.on_message.lock().clone();
        for callback in callbacks {
            callback(Some(message));
        }
        Ok(())
    }

    /// Serializes and delivers a response frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the pipe is closed.
    pub fn deliver_response(&self, response: &Response) -> Result<()> {
        self.deliver(&serde_json::to_string(response)?)
    }

    /// Serializes and delivers a notification frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the pipe is closed.
    pub fn deliver_notification(&self, notification: &Notification) -> Result<()> {
        self.deliver(&serde_json::to_string(notification)?)
    }

    /// Closes the pipe from the target side.
    pub fn close(&self, reason: Option<&str>) {
        self.shared.close(reason);
    }

    /// Returns `true` once either end has closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Tests
// ============================================================================
