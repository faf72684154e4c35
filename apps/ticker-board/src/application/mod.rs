//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the board orchestrator and the port interfaces
//! that define how it reaches the exchange.

/// Port interfaces for external systems (snapshot source, ticker feed).
pub mod ports;

/// Application services (board orchestration).
pub mod services;
