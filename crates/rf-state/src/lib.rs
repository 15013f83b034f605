//! rf-state: Scene persistence and the spin service
//!
//! Stores per-player scene records behind a TTL store, serializes calls per
//! player and runs engine steps at the host boundary.

mod funds;
mod locks;
mod service;
mod store;

pub use funds::*;
pub use locks::*;
pub use service::*;
pub use store::*;
