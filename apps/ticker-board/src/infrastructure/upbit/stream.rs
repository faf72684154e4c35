//! Ticker Stream Client
//!
//! Connects to the exchange's WebSocket endpoint, subscribes to realtime
//! tickers for a fixed market universe and forwards decoded records as
//! [`StreamEvent`]s. Connectivity is published on a `watch` channel so it
//! is never lost behind queued tickers.
//!
//! # Stream URL
//!
//! - Production: `wss://api.upbit.com/websocket/v1`
//!
//! # Session Lifecycle
//!
//! Every `start()` / `reconnect()` spawns one session task owning the
//! socket. The task opens the connection, waits the settle delay, sends the
//! subscribe request and then reads frames until the socket fails. Failures
//! are fed to the [`ConnectionMachine`], which either schedules another
//! attempt after the fixed reconnect delay or gives up and emits
//! [`StreamEvent::Unavailable`]. `stop()` cancels the session token, which
//! also cancels a pending reconnect sleep.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use super::codec::TickerCodec;
use super::connection::{ConnectionMachine, ConnectionState, FailureAction};
use super::messages::SubscribeRequest;
use super::reconnect::ReconnectConfig;
use crate::application::ports::TickerFeed;
pub use crate::application::ports::StreamEvent;
use crate::infrastructure::metrics::{self, FrameKind};

// =============================================================================
// Error Type
// =============================================================================

/// Errors that end a stream session.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Subscribe request could not be serialized.
    #[error("failed to encode subscribe request: {0}")]
    Encode(#[from] serde_json::Error),

    /// Server closed the connection or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,

    /// Event receiver was dropped.
    #[error("event channel closed")]
    ChannelClosed,
}

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the stream client.
#[derive(Debug, Clone)]
pub struct StreamClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// Ticket tag sent with the subscribe request.
    pub ticket: String,
    /// Market symbols to subscribe to.
    pub markets: Vec<String>,
    /// Delay between opening the socket and sending the subscribe request.
    pub subscribe_delay: Duration,
    /// Reconnection behavior.
    pub reconnect: ReconnectConfig,
}

impl StreamClientConfig {
    /// Create a configuration with default timings.
    #[must_use]
    pub fn new(url: impl Into<String>, markets: Vec<String>) -> Self {
        Self {
            url: url.into(),
            ticket: "ticker-board".to_string(),
            markets,
            subscribe_delay: Duration::from_secs(2),
            reconnect: ReconnectConfig::default(),
        }
    }
}

// =============================================================================
// Stream Client
// =============================================================================

struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Inner {
    config: StreamClientConfig,
    codec: TickerCodec,
    event_tx: mpsc::Sender<StreamEvent>,
    connected_tx: watch::Sender<bool>,
    machine: RwLock<ConnectionMachine>,
    session: Mutex<Option<Session>>,
}

/// WebSocket client for the realtime ticker stream.
///
/// Must be driven from within a Tokio runtime. Dropping the client stops
/// the active session.
pub struct StreamClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamClient")
            .field("url", &self.inner.config.url)
            .field("state", &self.state())
            .field("retry_count", &self.retry_count())
            .finish_non_exhaustive()
    }
}

impl StreamClient {
    /// Create a new, disconnected client.
    #[must_use]
    pub fn new(config: StreamClientConfig, event_tx: mpsc::Sender<StreamEvent>) -> Self {
        let machine = ConnectionMachine::new(config.reconnect);
        Self {
            inner: Arc::new(Inner {
                config,
                codec: TickerCodec::new(),
                event_tx,
                connected_tx: watch::Sender::new(false),
                machine: RwLock::new(machine),
                session: Mutex::new(None),
            }),
        }
    }

    /// Open a new session, replacing any existing one.
    pub fn connect(&self) {
        let previous = self.inner.machine.read().state();
        self.inner.machine.write().begin_connect();
        self.spawn_session(previous);
    }

    /// Close the session and cancel any pending reconnect.
    pub fn disconnect(&self) {
        self.cancel_session();
        let previous = self.inner.machine.write().disconnect();
        if previous != ConnectionState::Disconnected {
            tracing::info!(previous = %previous, "Ticker stream disconnected");
        }
        self.inner.notify_connectivity(false);
    }

    /// Reset the retry budget and connect again, regardless of state.
    pub fn reconnect(&self) {
        let previous = self.inner.machine.read().state();
        self.inner.machine.write().reconnect();
        tracing::info!("Manual reconnect requested");
        self.spawn_session(previous);
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.machine.read().state()
    }

    /// Retries spent in the current failure cycle.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.inner.machine.read().retry_count()
    }

    /// Whether the stream is subscribed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_subscribed()
    }

    /// Receiver tracking whether the stream is subscribed.
    #[must_use]
    pub fn connectivity(&self) -> watch::Receiver<bool> {
        self.inner.connected_tx.subscribe()
    }

    /// Subscribed market symbols.
    #[must_use]
    pub fn markets(&self) -> &[String] {
        &self.inner.config.markets
    }

    fn spawn_session(&self, previous: ConnectionState) {
        self.cancel_session();
        if previous.is_subscribed() {
            self.inner.notify_connectivity(false);
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&self.inner).run(cancel.clone()));
        *self.inner.session.lock() = Some(Session { cancel, task });
    }

    fn cancel_session(&self) {
        let session = self.inner.session.lock().take();
        if let Some(session) = session {
            session.cancel.cancel();
            session.task.abort();
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.cancel_session();
    }
}

impl TickerFeed for StreamClient {
    fn start(&self) {
        self.connect();
    }

    fn stop(&self) {
        self.disconnect();
    }

    fn reconnect(&self) {
        Self::reconnect(self);
    }

    fn connectivity(&self) -> watch::Receiver<bool> {
        Self::connectivity(self)
    }
}

// =============================================================================
// Session Task
// =============================================================================

impl Inner {
    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let result = tokio::select! {
                () = cancel.cancelled() => return,
                result = self.connect_and_run() => result,
            };

            let error = match result {
                Ok(()) | Err(StreamError::ChannelClosed) => return,
                Err(e) => e,
            };

            let (was_subscribed, action) = {
                let mut machine = self.machine.write();
                let was_subscribed = machine.state().is_subscribed();
                (was_subscribed, machine.on_failure())
            };

            tracing::warn!(error = %error, "Ticker stream session failed");
            if was_subscribed {
                self.notify_connectivity(false);
            }

            match action {
                FailureAction::Retry { attempt, delay } => {
                    tracing::info!(
                        attempt,
                        max_retries = self.config.reconnect.max_retries,
                        delay_ms = delay.as_millis(),
                        "Reconnecting to ticker stream"
                    );
                    metrics::record_reconnect();

                    tokio::select! {
                        () = cancel.cancelled() => {
                            tracing::debug!("Ticker stream cancelled during reconnect delay");
                            return;
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                    self.machine.write().begin_connect();
                }
                FailureAction::GiveUp { attempts } => {
                    tracing::warn!(attempts, "Ticker stream unavailable, giving up");
                    metrics::record_stream_unavailable();
                    let _ = self.event_tx.send(StreamEvent::Unavailable { attempts }).await;
                    return;
                }
                FailureAction::Ignore => return,
            }
        }
    }

    /// Connect, subscribe and read frames until the session fails.
    ///
    /// Returns `Ok(())` only if the machine was stopped before the
    /// subscription went out.
    async fn connect_and_run(&self) -> Result<(), StreamError> {
        tracing::info!(url = %self.config.url, "Connecting to ticker stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        tokio::time::sleep(self.config.subscribe_delay).await;

        let request = SubscribeRequest::ticker(&self.config.ticket, self.config.markets.clone());
        write.send(Message::Text(request.to_json()?.into())).await?;

        let subscribed = self.machine.write().on_subscribed();
        if !subscribed {
            return Ok(());
        }
        tracing::info!(
            markets = request.codes().len(),
            "Ticker stream subscribed"
        );
        self.notify_connectivity(true);

        loop {
            match read.next().await {
                Some(Ok(Message::Binary(data))) => {
                    self.handle_frame(FrameKind::Binary, &data).await?;
                }
                Some(Ok(Message::Text(text))) => {
                    self.handle_frame(FrameKind::Text, text.as_bytes()).await?;
                }
                Some(Ok(Message::Ping(data))) => {
                    write.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(frame = ?frame, "Server sent close frame");
                    return Err(StreamError::ConnectionClosed);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => {
                    tracing::info!("Ticker stream ended");
                    return Err(StreamError::ConnectionClosed);
                }
            }
        }
    }

    async fn handle_frame(&self, kind: FrameKind, payload: &[u8]) -> Result<(), StreamError> {
        let record = match self.codec.decode(payload) {
            Ok(record) => record,
            Err(e) => {
                metrics::record_decode_failure(kind);
                tracing::warn!(
                    error = %e,
                    raw = %String::from_utf8_lossy(&payload[..payload.len().min(200)]),
                    "Dropping undecodable ticker frame"
                );
                return Ok(());
            }
        };

        metrics::record_frame_received(kind);
        let first = self.machine.write().on_frame();
        if first {
            tracing::info!(market = %record.market, "First ticker received");
        } else {
            tracing::trace!(market = %record.market, price = record.trade_price, "Ticker");
        }

        self.event_tx
            .send(StreamEvent::Ticker(record))
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }

    fn notify_connectivity(&self, connected: bool) {
        metrics::set_stream_connected(connected);
        self.connected_tx.send_if_modified(|current| {
            let changed = *current != connected;
            *current = connected;
            changed
        });
    }
}
