//! Prometheus Metrics Module
//!
//! Exposes board metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Stream**: frames received, decode failures, reconnects, give-ups
//! - **Snapshot**: fetch outcomes and latency
//! - **Board**: updates applied or dropped, table size
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port. Recording
//! functions are no-ops until [`init_metrics`] installs the recorder.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

use crate::application::ports::FetchError;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Repeated calls return the handle installed by the first call.
///
/// # Errors
///
/// Returns an error if the global recorder cannot be installed (for example
/// because another recorder already is).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    register_metrics();
    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle).clone())
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Stream
    describe_counter!(
        "ticker_board_frames_received_total",
        "Total ticker frames decoded from the stream"
    );
    describe_counter!(
        "ticker_board_decode_failures_total",
        "Total stream frames dropped because they failed to decode"
    );
    describe_counter!(
        "ticker_board_reconnects_total",
        "Total stream reconnection attempts"
    );
    describe_counter!(
        "ticker_board_stream_unavailable_total",
        "Times the stream gave up after exhausting its retries"
    );
    describe_gauge!(
        "ticker_board_stream_connected",
        "1 while the stream is subscribed, 0 otherwise"
    );

    // Snapshot
    describe_counter!(
        "ticker_board_snapshot_fetches_total",
        "Total snapshot fetches by outcome"
    );
    describe_histogram!(
        "ticker_board_snapshot_fetch_seconds",
        "Snapshot fetch latency"
    );

    // Board
    describe_counter!(
        "ticker_board_updates_applied_total",
        "Total stream updates applied to the table"
    );
    describe_counter!(
        "ticker_board_updates_dropped_total",
        "Total stream updates dropped by reason"
    );
    describe_gauge!("ticker_board_tickers", "Rows in the ticker table");
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Frame payload kind.
#[derive(Debug, Clone, Copy)]
pub enum FrameKind {
    /// Binary WebSocket frame.
    Binary,
    /// Text WebSocket frame.
    Text,
}

impl FrameKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Text => "text",
        }
    }
}

/// Reasons an update never reaches the table.
#[derive(Debug, Clone, Copy)]
pub enum DropReason {
    /// Symbol is not in the snapshot.
    UnknownSymbol,
    /// Board is not streaming (inactive or polling).
    Inactive,
}

impl DropReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownSymbol => "unknown_symbol",
            Self::Inactive => "inactive",
        }
    }
}

/// Record a decoded ticker frame.
pub fn record_frame_received(kind: FrameKind) {
    counter!("ticker_board_frames_received_total", "frame" => kind.as_str()).increment(1);
}

/// Record a frame that failed to decode.
pub fn record_decode_failure(kind: FrameKind) {
    counter!("ticker_board_decode_failures_total", "frame" => kind.as_str()).increment(1);
}

/// Record a scheduled reconnection attempt.
pub fn record_reconnect() {
    counter!("ticker_board_reconnects_total").increment(1);
}

/// Record the stream giving up.
pub fn record_stream_unavailable() {
    counter!("ticker_board_stream_unavailable_total").increment(1);
}

/// Update the stream connectivity gauge.
pub fn set_stream_connected(connected: bool) {
    gauge!("ticker_board_stream_connected").set(if connected { 1.0 } else { 0.0 });
}

/// Record a snapshot fetch. `error` is `None` on success.
pub fn record_snapshot_fetch(error: Option<&FetchError>, duration: Duration) {
    let outcome = error.map_or("success", FetchError::kind);
    counter!("ticker_board_snapshot_fetches_total", "outcome" => outcome).increment(1);
    histogram!("ticker_board_snapshot_fetch_seconds").record(duration.as_secs_f64());
}

/// Record an update applied to the table.
pub fn record_update_applied() {
    counter!("ticker_board_updates_applied_total").increment(1);
}

/// Record a dropped update.
pub fn record_update_dropped(reason: DropReason) {
    counter!("ticker_board_updates_dropped_total", "reason" => reason.as_str()).increment(1);
}

/// Update the table size gauge.
#[allow(clippy::cast_precision_loss)]
pub fn set_tickers(count: usize) {
    gauge!("ticker_board_tickers").set(count as f64);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values() {
        assert_eq!(FrameKind::Binary.as_str(), "binary");
        assert_eq!(FrameKind::Text.as_str(), "text");
        assert_eq!(DropReason::UnknownSymbol.as_str(), "unknown_symbol");
        assert_eq!(DropReason::Inactive.as_str(), "inactive");
    }

    #[test]
    fn recording_without_recorder_is_noop() {
        record_frame_received(FrameKind::Binary);
        record_snapshot_fetch(Some(&FetchError::RateLimited), Duration::from_millis(5));
        record_snapshot_fetch(None, Duration::from_millis(5));
        set_tickers(3);
    }
}
