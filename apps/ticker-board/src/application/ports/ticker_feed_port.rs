//! Ticker Feed Port (Driven Port)
//!
//! Interface for the realtime ticker stream. Implementations push
//! [`StreamEvent`]s into a channel handed to them at construction and
//! publish connectivity on a `watch` channel they own, so the latest
//! connectivity survives a full event queue. The methods here only steer
//! the session lifecycle.

use tokio::sync::watch;

use crate::domain::ticker::TickerRecord;

/// Events emitted by a ticker feed.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A decoded ticker.
    Ticker(TickerRecord),
    /// Reconnection gave up after `attempts` connection attempts.
    Unavailable {
        /// Connection attempts made before giving up.
        attempts: u32,
    },
}

/// Port for controlling the realtime ticker feed.
#[cfg_attr(test, mockall::automock)]
pub trait TickerFeed: Send + Sync {
    /// Open a session, replacing any existing one.
    fn start(&self);

    /// Close the session and cancel any pending reconnect.
    fn stop(&self);

    /// Reset the retry budget and connect again.
    fn reconnect(&self);

    /// Whether the feed is subscribed (`true`) or has lost its session.
    fn connectivity(&self) -> watch::Receiver<bool>;
}
