#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Ticker Board - Live Market Ticker Reconciliation
//!
//! Keeps a sorted, continuously updated table of exchange tickers. The
//! table is seeded from a REST snapshot and then kept fresh by a WebSocket
//! ticker stream, with sorting re-applied after every change.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Ticker model and table rules
//!   - `ticker`: Ticker records and change direction
//!   - `sort`: Sort column/direction cycling and ordering
//!   - `store`: Snapshot loading and update reconciliation
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Snapshot source and ticker feed interfaces
//!   - `services`: The board orchestrator and its output hub
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `upbit`: REST snapshot client and WebSocket ticker stream
//!   - `config`: Configuration from the environment
//!   - `health`: Health check HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//! REST /v1/ticker/all ──snapshot──┐
//!                                 ├──▶ TickerBoard ──▶ BoardHub ──▶ views / deltas / errors
//! WebSocket ticker stream ──tick──┘     (TickerStore)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Ticker model and table rules with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::sort::{SortColumn, SortDirection, SortState};
pub use domain::store::TickerStore;
pub use domain::ticker::{ChangeDirection, TickerRecord};

// Ports and services
pub use application::ports::{FetchError, SnapshotSource, StreamEvent, TickerFeed};
pub use application::services::{
    BoardError, BoardHandle, BoardHub, BoardMode, BoardView, BroadcastConfig, TickerBoard,
    TickerBoardConfig,
};

// Infrastructure config
pub use infrastructure::config::{
    BoardConfig, BoardSettings, ConfigError, ExchangeSettings, RefreshMode, ServerSettings,
    StreamSettings,
};

// Exchange adapters
pub use infrastructure::upbit::{
    ConnectionState, ReconnectConfig, RestClientConfig, StreamClient, StreamClientConfig,
    UpbitRestClient,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};
