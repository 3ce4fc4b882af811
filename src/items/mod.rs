/// Item lifecycle
///
/// Items are the unit of capture: drops (optionally backed by a file
/// asset), links, and notes. This module owns the state machine from
/// creation through pin/trash to terminal purge, and the expiry sweep that
/// drives overdue items through the same purge path.

pub mod models;
pub mod store;

pub use models::*;
pub use store::{ItemStore, ListFilter};
