//! WebSocket channel and event loop.
//!
//! [`SocketHandle`] owns a spawned task that:
//!
//! - writes frames queued by [`SocketHandle::send`]
//! - hands every inbound text frame to the [`Multiplexer`]
//! - fails the commands sent on this socket when it ends
//!
//! Each handle opens its own [`Multiplexer`] generation, so a replaced
//! socket winding down never fails commands sent on its successor.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::connection::Multiplexer;
use crate::error::{Error, Result};

// ============================================================================
// SocketCommand
// ============================================================================

/// Internal commands for the event loop.
enum SocketCommand {
    /// Write one text frame.
    Send(String),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// SocketHandle
// ============================================================================

/// Running WebSocket bound to a [`Multiplexer`].
pub struct SocketHandle {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    /// Multiplexer generation of commands sent on this socket.
    generation: u64,
    /// Event loop task.
    task: JoinHandle<()>,
}

impl fmt::Debug for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketHandle")
            .field("generation", &self.generation)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl SocketHandle {
    /// Opens a WebSocket to `url` and starts the event loop.
    ///
    /// Resolves once the opening handshake completes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WebSocket`] if the connection or handshake fails.
    pub async fn connect(url: &str, multiplexer: Arc<Multiplexer>) -> Result<Self> {
        let (ws_stream, response) = tokio_tungstenite::connect_async(url).await?;
        debug!(url, status = %response.status(), "WebSocket opened");
        Ok(Self::from_stream(ws_stream, multiplexer))
    }

    /// Starts the event loop over an already-open stream.
    ///
    /// Commands sent from here on belong to this socket.
    pub fn from_stream<S>(ws_stream: WebSocketStream<S>, multiplexer: Arc<Multiplexer>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let generation = multiplexer.advance_generation();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_event_loop(
            ws_stream,
            command_rx,
            multiplexer,
            generation,
        ));
        Self {
            command_tx,
            generation,
            task,
        }
    }

    /// Returns the multiplexer generation this socket owns.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Queues one text frame for writing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`] if the event loop has stopped.
    pub fn send(&self, message: String) -> Result<()> {
        self.command_tx
            .send(SocketCommand::Send(message))
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    /// Asks the event loop to close the socket, without waiting.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(SocketCommand::Shutdown);
    }

    /// Closes the socket and waits for the event loop to finish.
    pub async fn close(self) {
        self.shutdown();
        if let Err(e) = self.task.await {
            warn!(error = %e, "WebSocket task ended abnormally");
        }
    }
}

// ============================================================================
// Event Loop
// ============================================================================

/// Event loop that handles WebSocket I/O.
async fn run_event_loop<S>(
    ws_stream: WebSocketStream<S>,
    mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    multiplexer: Arc<Multiplexer>,
    generation: u64,
) where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut ws_write, mut ws_read) = ws_stream.split();

    loop {
        tokio::select! {
            // Incoming frames from the target
            message = ws_read.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        multiplexer.dispatch(text.as_str());
                    }

                    Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                        Ok(text) => multiplexer.dispatch(text),
                        Err(_) => warn!(len = data.len(), "Dropped non-UTF-8 binary frame"),
                    },

                    Some(Ok(Message::Close(frame))) => {
                        debug!(?frame, "WebSocket closed by remote");
                        break;
                    }

                    Some(Err(e)) => {
                        error!(error = %e, "WebSocket error");
                        break;
                    }

                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }

                    // Ping/Pong are answered by tungstenite
                    _ => {}
                }
            }

            // Frames and control from the driver
            command = command_rx.recv() => {
                match command {
                    Some(SocketCommand::Send(text)) => {
                        if let Err(e) = ws_write.send(Message::Text(text.into())).await {
                            error!(error = %e, "Failed to write frame");
                            break;
                        }
                        trace!("Frame written");
                    }

                    Some(SocketCommand::Shutdown) => {
                        debug!("Shutdown command received");
                        let _ = ws_write.close().await;
                        break;
                    }

                    None => {
                        debug!("Command channel closed");
                        let _ = ws_write.close().await;
                        break;
                    }
                }
            }
        }
    }

    // Stop accepting frames before failing what is in flight.
    command_rx.close();
    multiplexer.reject_generation(generation);

    debug!(generation, "Event loop terminated");
}

// ============================================================================
// Tests
// ============================================================================
