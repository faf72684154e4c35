//! Upbit Exchange Adapters
//!
//! REST snapshot client and WebSocket ticker stream for the Upbit exchange.

pub mod codec;
pub mod connection;
pub mod markets;
pub mod messages;
pub mod reconnect;
pub mod rest;
pub mod stream;

pub use codec::{DecodeError, TickerCodec};
pub use connection::{ConnectionMachine, ConnectionState, FailureAction};
pub use markets::{KRW_MARKETS, dedup_markets, krw_markets};
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use rest::{RestClientConfig, UpbitRestClient};
pub use stream::{StreamClient, StreamClientConfig, StreamError};
