//! Synthetic channel traffic.
//!
//! Channels are biased toward EMPTY or OCCUPIED by thresholding Gaussian draws:
//! a cell is OCCUPIED when `Normal(mean, 0.5)` yields a value `>= 0.5`. A mean
//! of 0.1 gives roughly 21% occupancy, a mean of 0.9 roughly 79%.
//!
//! Output is channel-major (`channels x steps`), ready for
//! [`RecordedTraffic::from_channels`].
//!
//! # Example
//!
//! ```
//! use coopsense_sim::generator::{ChannelBiases, TrafficGenerator};
//!
//! let mut generator = TrafficGenerator::new(7);
//! let channels = generator.fixed_biases(&ChannelBiases::default(), 500).unwrap();
//! assert_eq!(channels.len(), 8);
//! assert_eq!(channels[0].len(), 500);
//! ```

use crate::error::{SimError, SimResult};
use crate::traffic::{ExhaustionPolicy, RecordedTraffic};
use coopsense_core::types::ChannelState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Spread of the Gaussian behind every biased channel.
pub const TRAFFIC_STD_DEV: f64 = 0.5;

/// Draws at or above this level are OCCUPIED.
pub const OCCUPANCY_THRESHOLD: f64 = 0.5;

pub const DEFAULT_TRAFFIC_LENGTH: usize = 10_000;

// ---------------------------------------------------------------------------
// Biases
// ---------------------------------------------------------------------------

/// Channel mix: empty-biased channels come first, occupied-biased after.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelBiases {
    /// Gaussian mean for empty-biased channels
    pub bias_empty: f64,
    /// Gaussian mean for occupied-biased channels
    pub bias_occupied: f64,
    pub empty_biased_channels: usize,
    pub occupied_biased_channels: usize,
}

impl Default for ChannelBiases {
    fn default() -> Self {
        Self {
            bias_empty: 0.1,
            bias_occupied: 0.9,
            empty_biased_channels: 4,
            occupied_biased_channels: 4,
        }
    }
}

impl ChannelBiases {
    pub fn num_channels(&self) -> usize {
        self.empty_biased_channels + self.occupied_biased_channels
    }
}

// ---------------------------------------------------------------------------
// TrafficGenerator
// ---------------------------------------------------------------------------

/// Seeded generator for synthetic occupancy traces.
#[derive(Debug, Clone)]
pub struct TrafficGenerator {
    rng: StdRng,
}

impl TrafficGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fair coin flip per step.
    pub fn random_channel(&mut self, len: usize) -> Vec<ChannelState> {
        (0..len)
            .map(|_| {
                if self.rng.gen_bool(0.5) {
                    ChannelState::Occupied
                } else {
                    ChannelState::Empty
                }
            })
            .collect()
    }

    /// Thresholded Gaussian draws around `mean`.
    pub fn biased_channel(&mut self, len: usize, mean: f64) -> SimResult<Vec<ChannelState>> {
        let normal = Normal::new(mean, TRAFFIC_STD_DEV)
            .map_err(|e| SimError::InvalidTraffic(format!("bias {}: {}", mean, e)))?;
        Ok((0..len)
            .map(|_| {
                if normal.sample(&mut self.rng) >= OCCUPANCY_THRESHOLD {
                    ChannelState::Occupied
                } else {
                    ChannelState::Empty
                }
            })
            .collect())
    }

    /// Channels with a bias that never changes.
    pub fn fixed_biases(&mut self, biases: &ChannelBiases, len: usize) -> SimResult<Vec<Vec<ChannelState>>> {
        let mut channels = Vec::with_capacity(biases.num_channels());
        for _ in 0..biases.empty_biased_channels {
            channels.push(self.biased_channel(len, biases.bias_empty)?);
        }
        for _ in 0..biases.occupied_biased_channels {
            channels.push(self.biased_channel(len, biases.bias_occupied)?);
        }
        Ok(channels)
    }

    /// Every `2 * interval` steps, the next `interval` steps of every channel
    /// are redrawn with the opposite bias.
    pub fn changing_biases_at_fixed_intervals(
        &mut self,
        biases: &ChannelBiases,
        interval: usize,
        len: usize,
    ) -> SimResult<Vec<Vec<ChannelState>>> {
        if interval == 0 {
            return Err(SimError::InvalidTraffic("switch interval must be > 0".to_string()));
        }
        let mut channels = self.fixed_biases(biases, len)?;

        for (idx, channel) in channels.iter_mut().enumerate() {
            let flipped = if idx < biases.empty_biased_channels {
                biases.bias_occupied
            } else {
                biases.bias_empty
            };
            for start in (0..len).step_by(2 * interval) {
                let end = (start + interval).min(len);
                let segment = self.biased_channel(end - start, flipped)?;
                channel[start..end].copy_from_slice(&segment);
            }
        }
        Ok(channels)
    }

    /// Empty-biased channels flip to the occupied bias for runs of random
    /// length (up to `len / 4`) starting at random steps; occupied-biased
    /// channels keep their bias throughout.
    pub fn random_interval_bias_switches(
        &mut self,
        biases: &ChannelBiases,
        len: usize,
    ) -> SimResult<Vec<Vec<ChannelState>>> {
        let mut channels = self.fixed_biases(biases, len)?;

        for channel in channels.iter_mut().take(biases.empty_biased_channels) {
            let mut step = 0;
            while step < len {
                if self.rng.gen_bool(0.5) {
                    let run = self.rng.gen_range(0..=len / 4);
                    if step + run < len {
                        let segment = self.biased_channel(run, biases.bias_occupied)?;
                        channel[step..step + run].copy_from_slice(&segment);
                        // Resume after the run; legacy traces could restart a run at every step.
                        step += run;
                    }
                }
                step += 1;
            }
        }
        Ok(channels)
    }
}

// ---------------------------------------------------------------------------
// TrafficConfig
// ---------------------------------------------------------------------------

/// Shape of a generated trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrafficProfile {
    /// Fair coin flips on every channel
    Uniform,
    /// Fixed per-channel biases
    Fixed,
    /// Biases flip at a fixed interval
    #[default]
    FixedInterval,
    /// Empty-biased channels flip for random runs
    RandomInterval,
}

/// Synthetic traffic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub profile: TrafficProfile,
    #[serde(flatten)]
    pub biases: ChannelBiases,
    /// Half-period of the fixed-interval profile, in steps
    pub switch_interval: usize,
    /// Steps to generate
    pub length: usize,
    /// Generator seed (None = OS entropy)
    pub seed: Option<u64>,
    /// Behavior once the trace is consumed
    pub exhaustion: ExhaustionPolicy,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            profile: TrafficProfile::FixedInterval,
            biases: ChannelBiases::default(),
            switch_interval: 10,
            length: DEFAULT_TRAFFIC_LENGTH,
            seed: None,
            exhaustion: ExhaustionPolicy::Stop,
        }
    }
}

impl TrafficConfig {
    pub fn num_channels(&self) -> usize {
        self.biases.num_channels()
    }

    /// Generate the trace described by this config.
    pub fn build(&self) -> SimResult<RecordedTraffic> {
        if self.length == 0 {
            return Err(SimError::InvalidTraffic("length must be > 0".to_string()));
        }
        if self.num_channels() == 0 {
            return Err(SimError::InvalidTraffic("no channels configured".to_string()));
        }

        let mut generator = match self.seed {
            Some(seed) => TrafficGenerator::new(seed),
            None => TrafficGenerator::from_entropy(),
        };
        let channels = match self.profile {
            TrafficProfile::Uniform => (0..self.num_channels())
                .map(|_| generator.random_channel(self.length))
                .collect(),
            TrafficProfile::Fixed => generator.fixed_biases(&self.biases, self.length)?,
            TrafficProfile::FixedInterval => {
                generator.changing_biases_at_fixed_intervals(&self.biases, self.switch_interval, self.length)?
            }
            TrafficProfile::RandomInterval => generator.random_interval_bias_switches(&self.biases, self.length)?,
        };

        debug!(
            profile = ?self.profile,
            channels = self.num_channels(),
            steps = self.length,
            "generated synthetic traffic"
        );
        Ok(RecordedTraffic::from_channels(channels)?.with_policy(self.exhaustion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traffic::TrafficSource;

    fn occupancy(cells: &[ChannelState]) -> f64 {
        cells.iter().filter(|s| s.is_occupied()).count() as f64 / cells.len() as f64
    }

    #[test]
    fn test_biased_channel_statistics() {
        let mut generator = TrafficGenerator::new(1);
        let low = generator.biased_channel(10_000, 0.1).unwrap();
        let high = generator.biased_channel(10_000, 0.9).unwrap();
        let low_occ = occupancy(&low);
        let high_occ = occupancy(&high);
        assert!(low_occ > 0.15 && low_occ < 0.27, "low occupancy {}", low_occ);
        assert!(high_occ > 0.73 && high_occ < 0.85, "high occupancy {}", high_occ);
    }

    #[test]
    fn test_random_channel_is_balanced() {
        let mut generator = TrafficGenerator::new(2);
        let occ = occupancy(&generator.random_channel(10_000));
        assert!(occ > 0.45 && occ < 0.55);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let biases = ChannelBiases::default();
        let a = TrafficGenerator::new(9).fixed_biases(&biases, 200).unwrap();
        let b = TrafficGenerator::new(9).fixed_biases(&biases, 200).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fixed_biases_layout() {
        let biases = ChannelBiases {
            empty_biased_channels: 2,
            occupied_biased_channels: 3,
            ..Default::default()
        };
        let channels = TrafficGenerator::new(3).fixed_biases(&biases, 4000).unwrap();
        assert_eq!(channels.len(), 5);
        assert!(occupancy(&channels[0]) < 0.5);
        assert!(occupancy(&channels[1]) < 0.5);
        assert!(occupancy(&channels[2]) > 0.5);
        assert!(occupancy(&channels[4]) > 0.5);
    }

    #[test]
    fn test_fixed_interval_flips_bias() {
        let biases = ChannelBiases {
            empty_biased_channels: 1,
            occupied_biased_channels: 1,
            ..Default::default()
        };
        let interval = 10;
        let channels = TrafficGenerator::new(4)
            .changing_biases_at_fixed_intervals(&biases, interval, 4000)
            .unwrap();

        let (flipped, kept): (Vec<_>, Vec<_>) = channels[0]
            .iter()
            .enumerate()
            .partition(|(t, _)| t % (2 * interval) < interval);
        let flipped: Vec<_> = flipped.into_iter().map(|(_, s)| *s).collect();
        let kept: Vec<_> = kept.into_iter().map(|(_, s)| *s).collect();
        assert!(occupancy(&flipped) > 0.6);
        assert!(occupancy(&kept) < 0.4);
    }

    #[test]
    fn test_fixed_interval_rejects_zero() {
        let mut generator = TrafficGenerator::new(0);
        assert!(generator
            .changing_biases_at_fixed_intervals(&ChannelBiases::default(), 0, 10)
            .is_err());
    }

    #[test]
    fn test_random_interval_shape() {
        let biases = ChannelBiases::default();
        let channels = TrafficGenerator::new(5)
            .random_interval_bias_switches(&biases, 1000)
            .unwrap();
        assert_eq!(channels.len(), 8);
        assert!(channels.iter().all(|c| c.len() == 1000));
        for channel in &channels[4..] {
            assert!(occupancy(channel) > 0.6);
        }
    }

    #[test]
    fn test_random_interval_leaves_occupied_channels_alone() {
        let biases = ChannelBiases::default();
        let fixed = TrafficGenerator::new(21).fixed_biases(&biases, 400).unwrap();
        let switched = TrafficGenerator::new(21)
            .random_interval_bias_switches(&biases, 400)
            .unwrap();
        // Same seed: the base draw matches, and only empty-biased channels are redrawn.
        assert_eq!(&switched[4..], &fixed[4..]);
    }

    #[test]
    fn test_config_build() {
        let config = TrafficConfig {
            length: 300,
            seed: Some(12),
            ..Default::default()
        };
        let mut traffic = config.build().unwrap();
        assert_eq!(traffic.num_channels(), 8);
        assert_eq!(traffic.num_steps(), Some(300));
        assert_eq!(traffic.next_snapshot().map(|s| s.len()), Some(8));
    }

    #[test]
    fn test_config_parse_yaml() {
        let yaml = r#"
profile: random_interval
empty_biased_channels: 3
occupied_biased_channels: 2
length: 50
exhaustion: repeat_last
"#;
        let config: TrafficConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.profile, TrafficProfile::RandomInterval);
        assert_eq!(config.num_channels(), 5);
        assert_eq!(config.biases.bias_occupied, 0.9);
        assert_eq!(config.exhaustion, ExhaustionPolicy::RepeatLast);
    }
}
