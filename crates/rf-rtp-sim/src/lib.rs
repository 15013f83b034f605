//! # rf-rtp-sim: Batch RTP simulator for cascading ways engines
//!
//! - **Simulator**: millions of paid rounds across a rayon pool, reproducible
//!   from a single seed regardless of thread count
//! - **Enumeration**: exact base-game RTP for configs small enough to walk
//!   every strip set and start offset
//! - **Report**: RTP split by base/free, hit and trigger rates, cascade
//!   length histogram, max win

pub mod enumerate;
pub mod error;
pub mod simulator;
pub mod stats;

pub use enumerate::*;
pub use error::*;
pub use simulator::*;
pub use stats::*;
