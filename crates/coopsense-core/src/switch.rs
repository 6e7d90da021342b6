//! Channel-switching controller.
//!
//! [`SwitchController`] picks the channel the monitored radio unit should move
//! to once the history is large enough to estimate from. Every
//! `exploration_modulus`-th smart switch is a random exploration move; the
//! rest scan the joint channel map in ascending channel order:
//!
//! ```text
//! joint[c] == EMPTY    -> take c, stop scanning
//! joint[c] == UNKNOWN  -> P(c EMPTY at t+1 | joint at t), keep strict maximum
//! joint[c] == OCCUPIED -> skip
//! ```
//!
//! If nothing beats probability zero the unit stays where it is.
//!
//! Before enough history exists the coop controller uses
//! [`SwitchController::immediate_switch_all`] instead, a round-robin advance of
//! every unit.
//!
//! # Example
//!
//! ```
//! use coopsense_core::switch::conditional_probability;
//! use coopsense_core::types::{snapshot_from_codes, ChannelMap};
//!
//! let rows: Vec<_> = [[1, 0, 1], [0, 0, 1], [0, 1, 0], [1, 0, 1]]
//!     .iter()
//!     .map(|r| snapshot_from_codes(r).unwrap())
//!     .collect();
//! let joint = ChannelMap::from_codes(3, [(1, 0), (2, 1)]).unwrap();
//!
//! let p = conditional_probability(0, &joint, &rows);
//! assert!((p - 2.0 / 3.0).abs() < 1e-12);
//! ```

use crate::error::{CoopError, CoopResult};
use crate::pool::RadioUnitPool;
use crate::types::{ChannelMap, ChannelState, RadioUnit, Snapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Every n-th smart switch explores at random.
pub const DEFAULT_EXPLORATION_MODULUS: u64 = 10;

// ---------------------------------------------------------------------------
// Choice
// ---------------------------------------------------------------------------

/// How a channel was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    /// Random exploration, independent of history
    Explored,
    /// A channel sensed EMPTY this step
    Greedy,
    /// Unsensed channel with the highest estimated probability of being EMPTY
    Predicted { probability: f64 },
    /// Nothing better than the current channel
    Unchanged,
}

/// Result of [`SwitchController::decide`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelChoice {
    pub channel: usize,
    pub kind: ChoiceKind,
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Number of history rows that agree with every entry of `joint`.
pub fn joint_match_count(rows: &[Snapshot], joint: &ChannelMap) -> usize {
    rows.iter().filter(|row| joint.matches(row)).count()
}

/// Probability that `channel` is EMPTY at the next step given `joint` now.
///
/// The denominator counts every row matching `joint`, including the last one,
/// which has no successor and so can never add to the numerator. Returns `0.0`
/// when no row matches.
pub fn conditional_probability(channel: usize, joint: &ChannelMap, rows: &[Snapshot]) -> f64 {
    let mut numerator = 0usize;
    let mut denominator = 0usize;

    for (i, row) in rows.iter().enumerate() {
        if !joint.matches(row) {
            continue;
        }
        denominator += 1;
        if let Some(next) = rows.get(i + 1) {
            if next.get(channel) == Some(&ChannelState::Empty) {
                numerator += 1;
            }
        }
    }

    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Scan the joint map for the best channel to move to from `current`.
///
/// The first EMPTY channel wins outright. Otherwise the UNKNOWN channel with
/// the strictly highest estimate wins, ties going to the lower channel.
pub fn find_best_channel(current: usize, joint: &ChannelMap, rows: &[Snapshot]) -> ChannelChoice {
    let mut best = ChannelChoice {
        channel: current,
        kind: ChoiceKind::Unchanged,
    };
    let mut max_probability = 0.0;

    for channel in 0..joint.num_channels() {
        match joint.get(channel) {
            Some(ChannelState::Empty) => {
                return ChannelChoice {
                    channel,
                    kind: ChoiceKind::Greedy,
                };
            }
            Some(ChannelState::Unknown) => {
                let probability = conditional_probability(channel, joint, rows);
                trace!(channel, probability, "estimated vacancy");
                if probability > max_probability {
                    max_probability = probability;
                    best = ChannelChoice {
                        channel,
                        kind: ChoiceKind::Predicted { probability },
                    };
                }
            }
            Some(ChannelState::Occupied) | None => {}
        }
    }

    best
}

// ---------------------------------------------------------------------------
// SwitchController
// ---------------------------------------------------------------------------

/// Decision state: the smart switch counter and the injected random source.
#[derive(Debug, Clone)]
pub struct SwitchController<R = StdRng> {
    smart_switch_count: u64,
    exploration_modulus: u64,
    rng: R,
}

impl SwitchController<StdRng> {
    /// Controller with a seeded `StdRng`.
    pub fn seeded(exploration_modulus: u64, seed: u64) -> CoopResult<Self> {
        Self::with_rng(exploration_modulus, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SwitchController<R> {
    /// Fails when `exploration_modulus` is zero.
    pub fn with_rng(exploration_modulus: u64, rng: R) -> CoopResult<Self> {
        if exploration_modulus == 0 {
            return Err(CoopError::InvalidParameter {
                name: "exploration_modulus",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            smart_switch_count: 0,
            exploration_modulus,
            rng,
        })
    }

    pub fn smart_switch_count(&self) -> u64 {
        self.smart_switch_count
    }

    pub fn exploration_modulus(&self) -> u64 {
        self.exploration_modulus
    }

    /// Count one pass through the smart switch path.
    pub fn record_smart_switch(&mut self) {
        self.smart_switch_count += 1;
    }

    /// Reset the counter when the fallback path runs.
    pub fn reset_smart_switch_count(&mut self) {
        self.smart_switch_count = 0;
    }

    /// True when the next decision explores at random.
    pub fn is_exploration_due(&self) -> bool {
        self.smart_switch_count % self.exploration_modulus == 0
    }

    /// Choose the channel `active` should move to.
    pub fn decide(&mut self, active: &RadioUnit, joint: &ChannelMap, rows: &[Snapshot]) -> ChannelChoice {
        let current = active.sensing_channel();

        if self.is_exploration_due() {
            let channel = self.random_other_channel(current, joint.num_channels());
            debug!(
                count = self.smart_switch_count,
                from = current,
                to = channel,
                "exploration switch"
            );
            return ChannelChoice {
                channel,
                kind: ChoiceKind::Explored,
            };
        }

        let choice = find_best_channel(current, joint, rows);
        debug!(from = current, to = choice.channel, kind = ?choice.kind, "smart switch");
        choice
    }

    /// Uniform pick over every channel except `current`.
    fn random_other_channel(&mut self, current: usize, num_channels: usize) -> usize {
        if num_channels < 2 {
            return current;
        }
        let pick = self.rng.gen_range(0..num_channels - 1);
        if pick >= current {
            pick + 1
        } else {
            pick
        }
    }

    /// Move unit `active` to `channel`; a passive unit holding it takes the
    /// active unit's previous channel.
    pub fn apply_assignment(
        &self,
        pool: &mut RadioUnitPool,
        active: usize,
        channel: usize,
    ) -> CoopResult<Option<usize>> {
        pool.assign(active, channel)
    }

    /// Round-robin every unit one channel up, ignoring history.
    pub fn immediate_switch_all(&self, pool: &mut RadioUnitPool) {
        pool.advance_all();
    }

    /// Decide for `active` and apply the result to the pool.
    pub fn smart_switch(
        &mut self,
        pool: &mut RadioUnitPool,
        active: usize,
        joint: &ChannelMap,
        rows: &[Snapshot],
    ) -> CoopResult<(ChannelChoice, Option<usize>)> {
        let unit = *pool.get(active).ok_or(CoopError::UnitOutOfRange {
            index: active,
            units: pool.len(),
        })?;
        let choice = self.decide(&unit, joint, rows);
        let swapped = self.apply_assignment(pool, active, choice.channel)?;
        Ok((choice, swapped))
    }
}
