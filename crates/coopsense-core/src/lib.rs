//! # Cooperative Spectrum Sensing Decision Engine
//!
//! This crate decides, at each discrete timestep, which channel a small set of
//! cooperating sensing units should occupy, using only partial observations of
//! channel occupancy.
//!
//! ## Components
//!
//! - **RadioUnitPool**: N sensing units, each bound to exactly one channel
//! - **ChannelHistory**: bounded log of joint occupancy snapshots, flushed when full
//! - **SwitchController**: conditional-probability estimation, greedy and
//!   exploration channel selection, round-robin fallback
//! - **CoopController**: sequences sense, cache and switch for one step
//!
//! ## Step Flow
//!
//! ```text
//! snapshot → CoopController::sense → ChannelHistory::append
//!          → CoopController::trigger_switch → SwitchController → RadioUnitPool
//! ```
//!
//! ## Example
//!
//! ```rust
//! use coopsense_core::prelude::*;
//!
//! let config = EngineConfig::new(2, 6, 42, 7).with_seed(42);
//! let mut coop = CoopController::new(config).unwrap();
//!
//! let trace = [[1, 0, 0, 1, 0, 1], [0, 1, 0, 0, 1, 1], [1, 0, 0, 1, 1, 1]];
//! for codes in &trace {
//!     let snapshot = snapshot_from_codes(codes).unwrap();
//!     coop.step(&snapshot).unwrap();
//! }
//! assert_eq!(coop.history().size(), 3);
//! ```

pub mod config;
pub mod coop;
pub mod error;
pub mod history;
pub mod observe;
pub mod pool;
pub mod switch;
pub mod types;

// Re-export main types
pub use config::EngineConfig;
pub use coop::{CoopController, StepReport, SwitchMode, SwitchOutcome};
pub use error::{CoopError, CoopResult};
pub use history::ChannelHistory;
pub use pool::{RadioUnitPool, MONITORED_UNIT};
pub use switch::{ChannelChoice, ChoiceKind, SwitchController};
pub use types::{ChannelMap, ChannelState, RadioUnit, Snapshot};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::coop::{CoopController, SwitchMode, SwitchOutcome};
    pub use crate::error::{CoopError, CoopResult};
    pub use crate::types::{snapshot_from_codes, ChannelMap, ChannelState, Snapshot};
}
