//! Domain layer: the ticker model, sorting rules and the reconciliation
//! store. Pure types with no I/O.

pub mod sort;
pub mod store;
pub mod ticker;
