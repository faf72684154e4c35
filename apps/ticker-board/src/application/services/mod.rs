//! Application Services
//!
//! Services that orchestrate domain logic and coordinate between ports.
//!
//! - `TickerBoard`: owns the reconciliation store and drives the snapshot
//!   and stream adapters
//! - `BoardHub`: the output channels the board publishes on

pub mod board;
pub mod hub;

pub use board::{
    BoardError, BoardHandle, BoardMode, BoardView, TickerBoard, TickerBoardConfig,
};
pub use hub::{BoardHub, BroadcastConfig};
