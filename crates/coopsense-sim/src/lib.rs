//! # coopsense simulation
//!
//! Feeds occupancy traffic through the [`coopsense_core`] decision engine and
//! scores its channel choices.
//!
//! ## Components
//!
//! - **traffic**: the [`TrafficSource`] trait and [`RecordedTraffic`] replay
//! - **generator**: synthetic biased traffic (fixed, fixed-interval and
//!   random-interval bias switching)
//! - **dataset**: RSSI trace ingestion, one node per channel
//! - **simulator**: the step loop and scoring
//! - **config**: YAML configuration with search path and profiles
//!
//! ## Example
//!
//! ```rust
//! use coopsense_core::EngineConfig;
//! use coopsense_sim::{Simulation, TrafficConfig};
//!
//! let traffic = TrafficConfig { length: 500, seed: Some(7), ..Default::default() }
//!     .build()
//!     .unwrap();
//! let engine = EngineConfig::new(2, 8, 256, 32).with_seed(7);
//!
//! let mut sim = Simulation::new(engine, traffic).unwrap();
//! let stats = sim.run().unwrap();
//! assert_eq!(stats.steps, 500);
//! ```

pub mod config;
pub mod dataset;
pub mod error;
pub mod generator;
pub mod simulator;
pub mod stats;
pub mod traffic;

pub use config::{DatasetConfig, SimulationConfig};
pub use dataset::RssiTraceReader;
pub use error::{ConfigError, SimError, SimResult};
pub use generator::{ChannelBiases, TrafficConfig, TrafficGenerator, TrafficProfile};
pub use simulator::Simulation;
pub use stats::SimulationStats;
pub use traffic::{ExhaustionPolicy, RecordedTraffic, TrafficSource};
