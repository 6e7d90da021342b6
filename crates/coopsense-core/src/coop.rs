//! Cooperative sensing controller.
//!
//! [`CoopController`] owns the radio unit pool, the channel history and the
//! switch controller, and sequences one step:
//!
//! ```text
//! snapshot -> sense -> history.append -> trigger_switch -> pool mutation
//! ```
//!
//! The mode is chosen from the history size alone:
//!
//! - **Fallback** (`history.size < min_channel_cache_size`): every unit advances
//!   one channel, round-robin, and the smart switch counter resets.
//! - **Smart** (`history.size >= min_channel_cache_size`): the counter
//!   increments, then the monitored unit's own channel decides what happens.
//!   OCCUPIED asks the switch controller for a new channel, EMPTY stays put,
//!   and UNKNOWN (the channel was not sensed this step) also stays put.
//!
//! # Example
//!
//! ```
//! use coopsense_core::coop::CoopController;
//! use coopsense_core::config::EngineConfig;
//! use coopsense_core::types::snapshot_from_codes;
//!
//! let config = EngineConfig::new(2, 6, 42, 7).with_seed(1);
//! let mut coop = CoopController::new(config).unwrap();
//!
//! let snapshot = snapshot_from_codes(&[1, 0, 0, 1, 0, 1]).unwrap();
//! let report = coop.step(&snapshot).unwrap();
//!
//! assert!(!report.outcome.is_smart());
//! assert_eq!(coop.pool().channels(), vec![1, 2]);
//! ```

use crate::config::EngineConfig;
use crate::error::{CoopError, CoopResult};
use crate::history::ChannelHistory;
use crate::pool::{RadioUnitPool, MONITORED_UNIT};
use crate::switch::{ChannelChoice, SwitchController};
use crate::types::{ChannelMap, ChannelState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Switching mode, derived from the history size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchMode {
    /// Not enough history: round-robin every unit
    Fallback,
    /// Enough history: predictive or explorative switching
    Smart,
}

/// What [`CoopController::trigger_switch`] did this step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// Every unit advanced one channel
    Fallback,
    /// Monitored channel read EMPTY; no change
    Stayed { channel: usize },
    /// Monitored channel was not sensed this step; no change
    Unsensed { channel: usize },
    /// Monitored channel read OCCUPIED; the switch controller chose a channel
    Switched {
        from: usize,
        choice: ChannelChoice,
        swapped_with: Option<usize>,
    },
}

impl SwitchOutcome {
    /// True when the smart switch path was taken.
    pub fn is_smart(&self) -> bool {
        !matches!(self, SwitchOutcome::Fallback)
    }

    pub fn mode(&self) -> SwitchMode {
        if self.is_smart() {
            SwitchMode::Smart
        } else {
            SwitchMode::Fallback
        }
    }
}

/// Result of one full [`CoopController::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Values the units sensed before switching
    pub sensed: ChannelMap,
    pub outcome: SwitchOutcome,
    /// History size after this step's append
    pub history_size: usize,
}

// ---------------------------------------------------------------------------
// CoopController
// ---------------------------------------------------------------------------

/// Orchestrates sensing, caching and switching for a pool of radio units.
#[derive(Debug, Clone)]
pub struct CoopController<R = StdRng> {
    config: EngineConfig,
    pool: RadioUnitPool,
    history: ChannelHistory,
    switch: SwitchController<R>,
    last_mode: Option<SwitchMode>,
}

impl CoopController<StdRng> {
    /// Build a controller whose exploration RNG comes from `config.seed`,
    /// or from OS entropy when no seed is set.
    pub fn new(config: EngineConfig) -> CoopResult<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: Rng> CoopController<R> {
    /// Build a controller with an injected random source.
    pub fn with_rng(config: EngineConfig, rng: R) -> CoopResult<Self> {
        config.validate()?;

        let pool = RadioUnitPool::new(config.number_of_radio_units, config.number_of_channels)?;
        let history = ChannelHistory::new(config.number_of_channels, config.max_channel_cache_size)?;
        let switch = SwitchController::with_rng(config.exploration_modulus, rng)?;

        debug!(
            units = config.number_of_radio_units,
            channels = config.number_of_channels,
            max_cache = config.max_channel_cache_size,
            min_cache = config.min_channel_cache_size,
            "coop controller ready"
        );

        Ok(Self {
            config,
            pool,
            history,
            switch,
            last_mode: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &RadioUnitPool {
        &self.pool
    }

    pub fn history(&self) -> &ChannelHistory {
        &self.history
    }

    pub fn switch_controller(&self) -> &SwitchController<R> {
        &self.switch
    }

    pub fn num_channels(&self) -> usize {
        self.config.number_of_channels
    }

    /// Index of the monitored unit (always [`MONITORED_UNIT`]).
    pub fn monitored_index(&self) -> usize {
        MONITORED_UNIT
    }

    /// Channel the monitored unit is sensing.
    pub fn monitored_channel(&self) -> usize {
        self.pool.monitored().sensing_channel()
    }

    /// Mode the next `trigger_switch` will run in.
    pub fn mode(&self) -> SwitchMode {
        if self.history.size() >= self.config.min_channel_cache_size {
            SwitchMode::Smart
        } else {
            SwitchMode::Fallback
        }
    }

    /// Read every unit's channel from a full occupancy snapshot.
    pub fn sense(&self, snapshot: &[ChannelState]) -> CoopResult<ChannelMap> {
        self.pool.sense(snapshot)
    }

    /// Append sensed values to the history, `Unknown` elsewhere.
    pub fn record(&mut self, sensed: &ChannelMap) -> CoopResult<()> {
        self.history.append(sensed)
    }

    /// Round-robin every unit one channel up.
    pub fn immediate_switch_all(&mut self) {
        self.switch.immediate_switch_all(&mut self.pool);
    }

    /// Decide and apply this step's channel switch.
    ///
    /// `sensed` must be exactly `number_of_channels` wide.
    pub fn trigger_switch(&mut self, sensed: &ChannelMap) -> CoopResult<SwitchOutcome> {
        if sensed.num_channels() != self.config.number_of_channels {
            return Err(CoopError::WidthMismatch {
                expected: self.config.number_of_channels,
                actual: sensed.num_channels(),
            });
        }

        let joint = sensed.to_joint();
        let mode = self.mode();
        if self.last_mode != Some(mode) {
            debug!(?mode, history = self.history.size(), "switch mode changed");
            self.last_mode = Some(mode);
        }

        let outcome = match mode {
            SwitchMode::Smart => {
                self.switch.record_smart_switch();
                let channel = self.monitored_channel();
                match joint.get(channel) {
                    Some(ChannelState::Occupied) => {
                        let (choice, swapped_with) = self.switch.smart_switch(
                            &mut self.pool,
                            MONITORED_UNIT,
                            &joint,
                            self.history.rows(),
                        )?;
                        SwitchOutcome::Switched {
                            from: channel,
                            choice,
                            swapped_with,
                        }
                    }
                    Some(ChannelState::Empty) => SwitchOutcome::Stayed { channel },
                    // Not sensed this step, so there is nothing to act on
                    Some(ChannelState::Unknown) | None => SwitchOutcome::Unsensed { channel },
                }
            }
            SwitchMode::Fallback => {
                self.switch.reset_smart_switch_count();
                self.switch.immediate_switch_all(&mut self.pool);
                SwitchOutcome::Fallback
            }
        };

        Ok(outcome)
    }

    /// Run one full step: sense, record, switch.
    pub fn step(&mut self, snapshot: &[ChannelState]) -> CoopResult<StepReport> {
        let sensed = self.sense(snapshot)?;
        self.record(&sensed)?;
        let outcome = self.trigger_switch(&sensed)?;
        Ok(StepReport {
            sensed,
            outcome,
            history_size: self.history.size(),
        })
    }
}
