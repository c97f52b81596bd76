//! Command/response multiplexing over one message channel.
//!
//! The [`Multiplexer`] owns the pieces every driver shares:
//!
//! - the per-connection [`CommandIdSequence`]
//! - the pending-request table, keyed by [`CommandId`]
//! - the notification listener registry
//!
//! Drivers feed every inbound text frame to [`Multiplexer::dispatch`] and
//! hand outbound frames to their transport from the closure passed to
//! [`Multiplexer::send_with`].
//!
//! # Dispatch
//!
//! | Frame | Action |
//! |-------|--------|
//! | `id` + `error` | Remove entry, fail its handle with [`Error::Remote`] |
//! | `id` | Remove entry, resolve its handle with `result` |
//! | `id`, no entry | Drop with a warning |
//! | no `id` | Fan out to every listener, in registration order |
//!
//! # Generations
//!
//! Each transport instance opens a generation with
//! [`Multiplexer::advance_generation`]. Commands are tagged with the
//! generation current when they are sent, and a transport that ends fails
//! only its own commands through [`Multiplexer::reject_generation`].

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::diagnostics::{ProtocolFormatter, Traffic};
use crate::error::{Error, Result};
use crate::identifiers::{CommandId, CommandIdSequence};
use crate::protocol::{IncomingMessage, Notification, Request, Response};

// ============================================================================
// Types
// ============================================================================

/// Listener invoked for every notification.
pub type NotificationListener = Box<dyn Fn(&Notification) + Send + Sync>;

/// Shared form of a registered listener.
type SharedListener = Arc<dyn Fn(&Notification) + Send + Sync>;

/// One in-flight command.
struct PendingRequest {
    /// Command name, kept for logging and errors.
    method: String,
    /// Transport generation the command was sent on.
    generation: u64,
    /// Resolved exactly once, when the matching response arrives.
    responder: oneshot::Sender<Result<Value>>,
}

/// Map of command IDs to in-flight commands.
type PendingTable = FxHashMap<CommandId, PendingRequest>;

// ============================================================================
// Multiplexer
// ============================================================================

/// Correlation and fan-out state for one connection.
///
/// All locks are released before user listeners run and before any
/// transport call, so listeners may issue commands or register listeners.
pub struct Multiplexer {
    /// Source of command IDs.
    ids: CommandIdSequence,
    /// Current transport generation.
    generation: AtomicU64,
    /// In-flight commands.
    pending: Mutex<PendingTable>,
    /// Notification listeners. `None` once disposed.
    listeners: Mutex<Option<Vec<SharedListener>>>,
    /// Protocol log line formatter.
    formatter: ProtocolFormatter,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Multiplexer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Multiplexer")
            .field("last_id", &self.ids.last_id())
            .field("pending", &self.pending_count())
            .field("listeners", &self.listener_count())
            .finish_non_exhaustive()
    }
}

impl Multiplexer {
    /// Creates a multiplexer logging at the current terminal width.
    #[must_use]
    pub fn new() -> Self {
        Self::with_formatter(ProtocolFormatter::from_terminal())
    }

    /// Creates a multiplexer with a specific log formatter.
    #[must_use]
    pub fn with_formatter(formatter: ProtocolFormatter) -> Self {
        Self {
            ids: CommandIdSequence::new(),
            generation: AtomicU64::new(0),
            pending: Mutex::new(PendingTable::default()),
            listeners: Mutex::new(Some(Vec::new())),
            formatter,
        }
    }

    /// Returns the number of in-flight commands.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns the number of registered listeners.
    #[inline]
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().as_ref().map_or(0, Vec::len)
    }

    /// Returns `true` once [`Multiplexer::dispose`] has run.
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.listeners.lock().is_none()
    }

    /// Returns the generation new commands are tagged with.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Starts a new transport generation and returns it.
    pub fn advance_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

// ============================================================================
// Multiplexer - Outbound
// ============================================================================

impl Multiplexer {
    /// Registers a command and hands its frame to `send`.
    ///
    /// The entry is inserted before `send` runs, so a response delivered
    /// synchronously by the transport still finds it. If `send` fails the
    /// entry is removed and the returned handle fails with that error.
    /// After [`Multiplexer::dispose`] the handle fails with
    /// [`Error::ConnectionClosed`] and nothing is sent.
    pub fn send_with<F>(&self, method: &str, params: Option<Value>, send: F) -> CommandHandle
    where
        F: FnOnce(String) -> Result<()>,
    {
        if method.is_empty() {
            return CommandHandle::failed(
                method,
                Error::invalid_argument("command method must not be empty"),
            );
        }

        if self.is_disposed() {
            return CommandHandle::failed(method, Error::ConnectionClosed);
        }

        let id = self.ids.next_id();
        let request = Request::new(id, method, params);
        self.formatter
            .log(Traffic::Outgoing, Some(method), Some(&request.params));

        let text = match request.to_json() {
            Ok(text) => text,
            Err(e) => return CommandHandle::failed(method, e),
        };

        let (responder, receiver) = oneshot::channel();
        self.pending.lock().insert(
            id,
            PendingRequest {
                method: method.to_string(),
                generation: self.generation(),
                responder,
            },
        );

        if let Err(e) = send(text) {
            self.pending.lock().remove(&id);
            return CommandHandle::failed(method, e);
        }

        trace!(%id, method, "Command sent");

        CommandHandle {
            id: Some(id),
            method: method.to_string(),
            state: HandleState::Pending(receiver),
        }
    }

    /// Removes an entry without resolving it.
    ///
    /// Returns `true` if the entry existed. The handle, if still held,
    /// fails with [`Error::ConnectionClosed`].
    pub fn forget(&self, id: CommandId) -> bool {
        let removed = self.pending.lock().remove(&id).is_some();
        if removed {
            debug!(%id, "Removed pending command");
        }
        removed
    }

    /// Fails every in-flight command with [`Error::ConnectionClosed`].
    ///
    /// Returns how many commands were failed.
    pub fn reject_all(&self) -> usize {
        let pending: Vec<_> = self.pending.lock().drain().collect();
        let count = pending.len();

        for (_, request) in pending {
            let _ = request.responder.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(count, "Failed pending commands");
        }

        count
    }

    /// Fails the in-flight commands sent on `generation` with
    /// [`Error::ConnectionClosed`], leaving the rest pending.
    ///
    /// Returns how many commands were failed.
    pub fn reject_generation(&self, generation: u64) -> usize {
        let pending: Vec<_> = {
            let mut table = self.pending.lock();
            let ids: Vec<_> = table
                .iter()
                .filter(|(_, request)| request.generation == generation)
                .map(|(id, _)| *id)
                .collect();
            ids.into_iter()
                .filter_map(|id| table.remove(&id))
                .collect()
        };
        let count = pending.len();

        for request in pending {
            let _ = request.responder.send(Err(Error::ConnectionClosed));
        }

        if count > 0 {
            debug!(generation, count, "Failed pending commands");
        }

        count
    }
}

// ============================================================================
// Multiplexer - Inbound
// ============================================================================

impl Multiplexer {
    /// Decodes one inbound frame and routes it.
    ///
    /// Malformed frames are logged and dropped.
    pub fn dispatch(&self, text: &str) {
        match IncomingMessage::parse(text) {
            Ok(IncomingMessage::Response(response)) => self.resolve(response),
            Ok(IncomingMessage::Notification(notification)) => self.notify(&notification),
            Err(e) => warn!(error = %e, text = %text, "Failed to parse incoming message"),
        }
    }

    /// Completes the command matching `response.id`.
    pub fn resolve(&self, response: Response) {
        let id = response.id;
        let Some(request) = self.pending.lock().remove(&id) else {
            warn!(%id, "Response for unknown command");
            return;
        };

        let outcome = match response.into_outcome() {
            Ok(result) => {
                self.formatter
                    .log(Traffic::ResponseOk, Some(&request.method), Some(&result));
                Ok(result)
            }
            Err(payload) => {
                self.formatter
                    .log(Traffic::ResponseErr, Some(&request.method), Some(&payload));
                Err(Error::remote(request.method, payload))
            }
        };

        // Receiver may have been dropped by a caller that stopped waiting.
        let _ = request.responder.send(outcome);
    }

    /// Delivers a notification to every listener.
    pub fn notify(&self, notification: &Notification) {
        self.formatter.log(
            Traffic::Event,
            Some(&notification.method),
            Some(&notification.params),
        );

        let listeners = match self.listeners.lock().as_ref() {
            Some(listeners) => listeners.clone(),
            None => {
                trace!(method = %notification.method, "Notification after dispose dropped");
                return;
            }
        };

        for listener in listeners {
            listener(notification);
        }
    }
}

// ============================================================================
// Multiplexer - Listeners
// ============================================================================

impl Multiplexer {
    /// Appends a notification listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] after [`Multiplexer::dispose`].
    pub fn add_listener(&self, listener: NotificationListener) -> Result<()> {
        match self.listeners.lock().as_mut() {
            Some(listeners) => {
                listeners.push(Arc::from(listener));
                Ok(())
            }
            None => Err(Error::ConnectionClosed),
        }
    }

    /// Drops all listeners and fails every in-flight command.
    ///
    /// Later notifications are discarded. Calling this twice is harmless.
    pub fn dispose(&self) {
        let listeners = self.listeners.lock().take();
        let released = listeners.map_or(0, |l| l.len());
        let rejected = self.reject_all();
        debug!(released, rejected, "Multiplexer disposed");
    }
}

// ============================================================================
// CommandHandle
// ============================================================================

/// Pending outcome of one command.
///
/// Resolves with the response's `result`, or fails with:
///
/// - [`Error::Remote`] if the response carried `error`
/// - [`Error::ConnectionClosed`] if the entry was dropped (teardown,
///   timeout cleanup)
/// - the send-time error, if the command never reached the transport
///
/// A command whose response never arrives stays pending forever unless
/// awaited through a timeout.
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct CommandHandle {
    /// Assigned ID, absent if the command failed before allocation.
    id: Option<CommandId>,
    /// Command name.
    method: String,
    /// Completion state.
    state: HandleState,
}

/// Internal state of a [`CommandHandle`].
enum HandleState {
    /// Waiting for the response.
    Pending(oneshot::Receiver<Result<Value>>),
    /// Failed before reaching the transport.
    Failed(Error),
    /// Outcome already returned.
    Done,
}

impl CommandHandle {
    /// Creates a handle that fails on first poll.
    pub(crate) fn failed(method: &str, error: Error) -> Self {
        Self {
            id: None,
            method: method.to_string(),
            state: HandleState::Failed(error),
        }
    }

    /// Returns the assigned command ID.
    ///
    /// `None` when the command failed before it was sent.
    #[inline]
    #[must_use]
    pub fn id(&self) -> Option<CommandId> {
        self.id
    }

    /// Returns the command name.
    #[inline]
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl fmt::Debug for CommandHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state {
            HandleState::Pending(_) => "pending",
            HandleState::Failed(_) => "failed",
            HandleState::Done => "done",
        };
        f.debug_struct("CommandHandle")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("state", &state)
            .finish()
    }
}

impl Future for CommandHandle {
    type Output = Result<Value>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        match std::mem::replace(&mut this.state, HandleState::Done) {
            HandleState::Pending(mut receiver) => match Pin::new(&mut receiver).poll(cx) {
                Poll::Pending => {
                    this.state = HandleState::Pending(receiver);
                    Poll::Pending
                }
                Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
                Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ConnectionClosed)),
            },
            HandleState::Failed(error) => Poll::Ready(Err(error)),
            HandleState::Done => panic!("CommandHandle polled after completion"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;
    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready, assert_ready_err, assert_ready_ok, task};

    /// Multiplexer plus a record of every frame it sent.
    fn harness() -> (Multiplexer, Arc<Mutex<Vec<String>>>) {
        (
            Multiplexer::with_formatter(ProtocolFormatter::unbounded()),
            Arc::new(Mutex::new(Vec::new())),
        )
    }

    fn send(
        mux: &Multiplexer,
        sent: &Arc<Mutex<Vec<String>>>,
        method: &str,
        params: Option<Value>,
    ) -> CommandHandle {
        let sent = Arc::clone(sent);
        mux.send_with(method, params, move |text| {
            sent.lock().push(text);
            Ok(())
        })
    }

    #[test]
    fn test_network_enable_round_trip() {
        let (mux, sent) = harness();

        let mut handle = task::spawn(send(&mux, &sent, "Network.enable", Some(json!({}))));
        assert_eq!(
            sent.lock().as_slice(),
            [r#"{"id":1,"method":"Network.enable","params":{}}"#]
        );
        assert_pending!(handle.poll());

        mux.dispatch(r#"{"id":1,"result":{}}"#);
        assert!(handle.is_woken());
        assert_eq!(assert_ready_ok!(handle.poll()), json!({}));
        assert_eq!(mux.pending_count(), 0);
    }

    #[test]
    fn test_omitted_params_serialize_as_empty_object() {
        let (mux, sent) = harness();
        let _handle = send(&mux, &sent, "Page.enable", None);

        let frame: Value = serde_json::from_str(&sent.lock()[0]).expect("parse");
        assert_eq!(frame["params"], json!({}));
    }

    #[test]
    fn test_out_of_order_responses() {
        let (mux, sent) = harness();

        let mut navigate = task::spawn(send(
            &mux,
            &sent,
            "Page.navigate",
            Some(json!({"url": "about:blank"})),
        ));
        let mut frame_tree = task::spawn(send(&mux, &sent, "Page.getFrameTree", None));
        assert_eq!(navigate.id().map(|id| id.as_u64()), Some(1));
        assert_eq!(frame_tree.id().map(|id| id.as_u64()), Some(2));

        mux.dispatch(r#"{"id":2,"result":{"frameTree":{"frame":{"id":"main"}}}}"#);
        assert_pending!(navigate.poll());
        assert_eq!(
            assert_ready_ok!(frame_tree.poll()),
            json!({"frameTree": {"frame": {"id": "main"}}})
        );

        mux.dispatch(r#"{"id":1,"result":{"frameId":"main"}}"#);
        assert_eq!(
            assert_ready_ok!(navigate.poll()),
            json!({"frameId": "main"})
        );
    }

    #[test]
    fn test_error_response_fails_handle() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "Page.navigate", None));

        mux.dispatch(r#"{"id":1,"error":{"code":-32000,"message":"Cannot navigate to invalid URL"}}"#);

        match assert_ready_err!(handle.poll()) {
            Error::Remote {
                method,
                message,
                payload,
            } => {
                assert_eq!(method, "Page.navigate");
                assert_eq!(message, "Cannot navigate to invalid URL");
                assert_eq!(payload["code"], json!(-32000));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_id_is_dropped() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "Runtime.enable", None));

        mux.dispatch(r#"{"id":99,"result":{"stray":true}}"#);
        assert_pending!(handle.poll());
        assert_eq!(mux.pending_count(), 1);

        mux.dispatch(r#"{"id":1,"result":{}}"#);
        assert_ready_ok!(handle.poll());
    }

    #[test]
    fn test_duplicate_response_resolves_once() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "DOM.enable", None));

        mux.dispatch(r#"{"id":1,"result":{"first":true}}"#);
        mux.dispatch(r#"{"id":1,"result":{"second":true}}"#);
        assert_eq!(assert_ready_ok!(handle.poll()), json!({"first": true}));
    }

    #[test]
    fn test_notifications_do_not_touch_pending() {
        let (mux, sent) = harness();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        mux.add_listener(Box::new(move |n: &Notification| {
            seen_clone.lock().push(n.method.clone());
        }))
        .expect("listener");

        let mut handle = task::spawn(send(&mux, &sent, "Page.enable", None));
        mux.dispatch(r#"{"method":"Page.frameStartedLoading","params":{"frameId":"1"}}"#);
        mux.dispatch(r#"{"method":"Page.loadEventFired","params":{}}"#);

        assert_pending!(handle.poll());
        assert_eq!(mux.pending_count(), 1);
        assert_eq!(
            seen.lock().as_slice(),
            ["Page.frameStartedLoading", "Page.loadEventFired"]
        );
    }

    #[test]
    fn test_every_listener_sees_each_notification_once() {
        let (mux, _) = harness();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        for counter in [&first, &second] {
            let counter = Arc::clone(counter);
            mux.add_listener(Box::new(move |_: &Notification| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .expect("listener");
        }

        mux.dispatch(r#"{"method":"Network.dataReceived","params":{}}"#);
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_reenter() {
        let mux = Arc::new(Multiplexer::with_formatter(ProtocolFormatter::unbounded()));
        let weak = Arc::downgrade(&mux);
        mux.add_listener(Box::new(move |_: &Notification| {
            if let Some(mux) = weak.upgrade() {
                let _ = mux.add_listener(Box::new(|_: &Notification| {}));
            }
        }))
        .expect("listener");

        mux.dispatch(r#"{"method":"Target.attachedToTarget","params":{}}"#);
        assert_eq!(mux.listener_count(), 2);
    }

    #[test]
    fn test_malformed_frame_is_ignored() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "Page.enable", None));

        mux.dispatch("{not json");
        mux.dispatch(r#"{"id":"one","result":{}}"#);
        assert_pending!(handle.poll());
        assert_eq!(mux.pending_count(), 1);
    }

    #[test]
    fn test_empty_method_is_rejected() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "", None));

        assert!(handle.id().is_none());
        assert!(matches!(
            assert_ready_err!(handle.poll()),
            Error::InvalidArgument { .. }
        ));
        assert!(sent.lock().is_empty());
    }

    #[test]
    fn test_send_failure_removes_entry() {
        let (mux, _) = harness();
        let mut handle = task::spawn(mux.send_with("Page.enable", None, |_| {
            Err(Error::not_connected("send a command"))
        }));

        assert!(matches!(
            assert_ready_err!(handle.poll()),
            Error::NotConnected { .. }
        ));
        assert_eq!(mux.pending_count(), 0);
    }

    #[test]
    fn test_synchronous_transport_reply() {
        let mux = Arc::new(Multiplexer::with_formatter(ProtocolFormatter::unbounded()));
        let echo = Arc::clone(&mux);
        let mut handle = task::spawn(mux.send_with("Browser.getVersion", None, move |text| {
            let frame: Value = serde_json::from_str(&text)?;
            echo.dispatch(&json!({"id": frame["id"], "result": {"product": "Chrome"}}).to_string());
            Ok(())
        }));

        assert_eq!(
            assert_ready_ok!(handle.poll()),
            json!({"product": "Chrome"})
        );
    }

    #[test]
    fn test_dispose_rejects_pending_and_drops_listeners() {
        let (mux, sent) = harness();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        mux.add_listener(Box::new(move |_: &Notification| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        }))
        .expect("listener");
        let mut handle = task::spawn(send(&mux, &sent, "Page.enable", None));

        mux.dispose();
        mux.dispatch(r#"{"method":"Page.loadEventFired","params":{}}"#);

        assert!(mux.is_disposed());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(matches!(
            assert_ready_err!(handle.poll()),
            Error::ConnectionClosed
        ));
        assert!(matches!(
            mux.add_listener(Box::new(|_: &Notification| {})),
            Err(Error::ConnectionClosed)
        ));
    }

    #[test]
    fn test_send_after_dispose_fails_without_sending() {
        let (mux, sent) = harness();
        mux.dispose();

        let mut handle = task::spawn(send(&mux, &sent, "Page.enable", None));

        assert!(handle.id().is_none());
        assert!(matches!(
            assert_ready_err!(handle.poll()),
            Error::ConnectionClosed
        ));
        assert!(sent.lock().is_empty());
        assert_eq!(mux.pending_count(), 0);
    }

    #[test]
    fn test_reject_generation_spares_newer_commands() {
        let (mux, sent) = harness();

        let old = mux.advance_generation();
        let mut stale = task::spawn(send(&mux, &sent, "Page.enable", None));
        let current = mux.advance_generation();
        let mut live = task::spawn(send(&mux, &sent, "Page.enable", None));
        assert_ne!(old, current);
        assert_eq!(mux.generation(), current);

        assert_eq!(mux.reject_generation(old), 1);
        assert!(matches!(
            assert_ready_err!(stale.poll()),
            Error::ConnectionClosed
        ));
        assert_pending!(live.poll());
        assert_eq!(mux.pending_count(), 1);

        mux.dispatch(r#"{"id":2,"result":{}}"#);
        assert_ready_ok!(live.poll());
    }

    #[test]
    fn test_forget_fails_handle() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "Tracing.start", None));
        let id = handle.id().expect("assigned id");

        assert!(mux.forget(id));
        assert!(!mux.forget(id));
        assert!(matches!(
            assert_ready_err!(handle.poll()),
            Error::ConnectionClosed
        ));
    }

    #[test]
    fn test_unanswered_command_stays_pending() {
        let (mux, sent) = harness();
        let mut handle = task::spawn(send(&mux, &sent, "Page.captureScreenshot", None));

        for _ in 0..3 {
            assert_pending!(handle.poll());
        }
        assert_eq!(mux.pending_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_any_response_order_resolves_each_command(
            order in (1usize..24).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        ) {
            let (mux, sent) = harness();
            let mut handles: Vec<_> = (0..order.len())
                .map(|i| task::spawn(send(&mux, &sent, &format!("Test.method{i}"), Some(json!({"i": i})))))
                .collect();

            for &index in &order {
                let id = handles[index].id().expect("assigned id");
                mux.dispatch(&json!({"id": id.as_u64(), "result": {"index": index}}).to_string());
            }

            prop_assert_eq!(mux.pending_count(), 0);
            for (index, handle) in handles.iter_mut().enumerate() {
                let value = assert_ready!(handle.poll()).expect("success");
                prop_assert_eq!(value, json!({"index": index}));
            }
        }
    }
}
