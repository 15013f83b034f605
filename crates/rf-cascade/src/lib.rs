//! # rf-cascade: Cascading ways engine
//!
//! One parameterized, resumable engine for cascading "ways" slot variants.
//! Variant differences are data ([`GameConfig`]) plus the
//! [`EliminationRule`] enum; per-player progress lives in [`SceneState`].
//!
//! ## Architecture
//!
//! ```text
//! CascadeEngine (Arc<GameConfig>, SymbolTable)
//!     │
//!     ├── ReelSampler     weighted strip set → grid + cursors
//!     ├── WinEvaluator    ways scan → WinRecord / WinMask
//!     ├── Cascade         elimination → gravity → refill → promotion
//!     └── FeatureCounter  triggers → free-round awards
//!           │
//!           v
//!     SpinStepResult + updated SceneState ── SceneCodec ──> bytes
//! ```

pub mod cascade;
pub mod config;
pub mod engine;
pub mod error;
pub mod free_rounds;
pub mod grid;
pub mod paytable;
pub mod presets;
pub mod reels;
pub mod scene;
pub mod symbols;

pub use cascade::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use free_rounds::*;
pub use grid::*;
pub use paytable::*;
pub use reels::*;
pub use scene::*;
pub use symbols::*;
