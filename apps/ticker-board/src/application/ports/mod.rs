//! Application Ports (Driven)
//!
//! Interfaces the board uses to reach the exchange. Infrastructure adapters
//! implement them; tests substitute mocks.
//!
//! - `SnapshotSource`: full-table REST fetch
//! - `TickerFeed`: realtime stream lifecycle

mod snapshot_source_port;
mod ticker_feed_port;

pub use snapshot_source_port::{FetchError, SnapshotSource};
pub use ticker_feed_port::{StreamEvent, TickerFeed};

#[cfg(test)]
pub use snapshot_source_port::MockSnapshotSource;
#[cfg(test)]
pub use ticker_feed_port::MockTickerFeed;
