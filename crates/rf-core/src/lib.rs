//! rf-core: Shared types for ReelForge cascade engines
//!
//! Error taxonomy used at the service boundary and the identity types that
//! key persisted scene records.

mod error;
mod ids;

pub use error::*;
pub use ids::*;
