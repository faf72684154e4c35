//! Board Output Hub
//!
//! Output channels the board publishes on, fanned out to any number of
//! consumers.
//!
//! # Architecture
//!
//! The `BoardHub` owns one channel per output:
//! - Views: `watch`, latest sorted table (late subscribers see the current one)
//! - Deltas: `broadcast`, each applied ticker update
//! - Connectivity: `watch`, whether the stream is subscribed
//! - Errors: `broadcast`, snapshot failures and stream give-ups
//!
//! Broadcast channels have configurable capacity; slow receivers lag and
//! skip ahead rather than blocking the board.

use tokio::sync::{broadcast, watch};

use super::board::{BoardError, BoardView};
use crate::domain::ticker::TickerRecord;

// =============================================================================
// Broadcast Hub
// =============================================================================

/// Configuration for broadcast channel capacities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastConfig {
    /// Capacity for the delta channel.
    pub delta_capacity: usize,
    /// Capacity for the error channel.
    pub error_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            delta_capacity: 1_024,
            error_capacity: 64,
        }
    }
}

/// Central hub for the board's output channels.
///
/// # Example
///
/// ```rust
/// use ticker_board::application::services::hub::{BoardHub, BroadcastConfig};
///
/// let hub = BoardHub::new(BroadcastConfig::default());
///
/// let views = hub.views_rx();
/// assert!(views.borrow().records.is_empty());
/// assert!(!hub.is_connected());
/// ```
#[derive(Debug)]
#[allow(clippy::struct_field_names)]
pub struct BoardHub {
    views_tx: watch::Sender<BoardView>,
    deltas_tx: broadcast::Sender<TickerRecord>,
    connectivity_tx: watch::Sender<bool>,
    errors_tx: broadcast::Sender<BoardError>,
}

impl BoardHub {
    /// Create a new hub with the given configuration.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            views_tx: watch::Sender::new(BoardView::default()),
            deltas_tx: broadcast::channel(config.delta_capacity.max(1)).0,
            connectivity_tx: watch::Sender::new(false),
            errors_tx: broadcast::channel(config.error_capacity.max(1)).0,
        }
    }

    /// Create a new hub with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BroadcastConfig::default())
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Replace the current view. Stored even with no receivers.
    pub fn publish_view(&self, view: BoardView) {
        self.views_tx.send_replace(view);
    }

    /// Current view.
    #[must_use]
    pub fn latest_view(&self) -> BoardView {
        self.views_tx.borrow().clone()
    }

    /// Get a new receiver for views.
    #[must_use]
    pub fn views_rx(&self) -> watch::Receiver<BoardView> {
        self.views_tx.subscribe()
    }

    // =========================================================================
    // Deltas
    // =========================================================================

    /// Send an applied update to all subscribers.
    ///
    /// Returns the number of receivers that received the message, or `None`
    /// if there are no active receivers.
    #[must_use]
    pub fn send_delta(&self, record: TickerRecord) -> Option<usize> {
        self.deltas_tx.send(record).ok()
    }

    /// Get a new receiver for deltas.
    #[must_use]
    pub fn deltas_rx(&self) -> broadcast::Receiver<TickerRecord> {
        self.deltas_tx.subscribe()
    }

    // =========================================================================
    // Connectivity
    // =========================================================================

    /// Record stream connectivity. Returns `true` if the value changed.
    pub fn set_connectivity(&self, connected: bool) -> bool {
        self.connectivity_tx.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        })
    }

    /// Whether the stream is subscribed.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.connectivity_tx.borrow()
    }

    /// Get a new receiver for connectivity.
    #[must_use]
    pub fn connectivity_rx(&self) -> watch::Receiver<bool> {
        self.connectivity_tx.subscribe()
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Send an error to all subscribers.
    #[must_use]
    pub fn send_error(&self, error: BoardError) -> Option<usize> {
        self.errors_tx.send(error).ok()
    }

    /// Get a new receiver for errors.
    #[must_use]
    pub fn errors_rx(&self) -> broadcast::Receiver<BoardError> {
        self.errors_tx.subscribe()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::application::ports::FetchError;
    use crate::domain::ticker::ChangeDirection;

    fn record(market: &str) -> TickerRecord {
        TickerRecord {
            market: market.to_string(),
            change: ChangeDirection::Even,
            trade_price: 1.0,
            signed_change_rate: 0.0,
            signed_change_price: 0.0,
            acc_trade_price: 1.0,
        }
    }

    #[test]
    fn hub_creation() {
        let hub = BoardHub::with_defaults();
        assert!(hub.latest_view().is_empty());
        assert!(!hub.is_connected());
    }

    #[test]
    fn view_is_kept_without_receivers() {
        let hub = BoardHub::with_defaults();
        hub.publish_view(BoardView {
            records: Arc::from(vec![record("KRW-BTC")]),
            ..BoardView::default()
        });
        assert_eq!(hub.latest_view().markets(), ["KRW-BTC"]);

        let rx = hub.views_rx();
        assert_eq!(rx.borrow().len(), 1);
    }

    #[tokio::test]
    async fn delta_reaches_every_receiver() {
        let hub = BoardHub::with_defaults();
        let mut rx1 = hub.deltas_rx();
        let mut rx2 = hub.deltas_rx();

        assert_eq!(hub.send_delta(record("KRW-ETH")), Some(2));
        assert_eq!(rx1.recv().await.unwrap().market, "KRW-ETH");
        assert_eq!(rx2.recv().await.unwrap().market, "KRW-ETH");
    }

    #[test]
    fn send_with_no_receivers_returns_none() {
        let hub = BoardHub::with_defaults();
        assert!(hub.send_delta(record("KRW-BTC")).is_none());
        assert!(hub.send_error(BoardError::Closed).is_none());
    }

    #[test]
    fn connectivity_reports_changes_only() {
        let hub = BoardHub::with_defaults();
        assert!(!hub.set_connectivity(false));
        assert!(hub.set_connectivity(true));
        assert!(!hub.set_connectivity(true));
        assert!(hub.is_connected());
    }

    #[tokio::test]
    async fn errors_are_broadcast() {
        let hub = BoardHub::with_defaults();
        let mut rx = hub.errors_rx();
        let _ = hub.send_error(BoardError::Snapshot(FetchError::ServerError));
        assert_eq!(
            rx.recv().await.unwrap(),
            BoardError::Snapshot(FetchError::ServerError)
        );
    }
}
