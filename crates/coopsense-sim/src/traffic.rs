//! Traffic sources.
//!
//! A [`TrafficSource`] hands the simulation one full occupancy snapshot per
//! step. [`RecordedTraffic`] replays an in-memory trace and makes the
//! end-of-trace behavior explicit through [`ExhaustionPolicy`].

use crate::error::{SimError, SimResult};
use coopsense_core::types::{ChannelState, Snapshot};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Supplies one occupancy snapshot per step.
pub trait TrafficSource {
    /// Width of every snapshot.
    fn num_channels(&self) -> usize;

    /// Number of steps the source yields, if bounded.
    fn num_steps(&self) -> Option<usize>;

    /// Next snapshot, or `None` once the source is exhausted.
    fn next_snapshot(&mut self) -> Option<Snapshot>;
}

/// What a recorded trace does after its last step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Yield nothing further
    #[default]
    Stop,
    /// Keep yielding the final snapshot
    RepeatLast,
    /// Start again from the first snapshot
    Wrap,
}

/// An in-memory occupancy trace, replayed step by step.
#[derive(Debug, Clone)]
pub struct RecordedTraffic {
    rows: Vec<Snapshot>,
    num_channels: usize,
    time_step: usize,
    policy: ExhaustionPolicy,
    warned: bool,
}

impl RecordedTraffic {
    /// Build from step-major rows (`steps x channels`).
    pub fn from_rows(rows: Vec<Snapshot>) -> SimResult<Self> {
        let num_channels = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| SimError::InvalidTraffic("trace has no steps".to_string()))?;
        if num_channels == 0 {
            return Err(SimError::InvalidTraffic("trace has no channels".to_string()));
        }
        for (step, row) in rows.iter().enumerate() {
            if row.len() != num_channels {
                return Err(SimError::InvalidTraffic(format!(
                    "step {} has {} channels, expected {}",
                    step,
                    row.len(),
                    num_channels
                )));
            }
            if let Some(channel) = row.iter().position(|s| !s.is_known()) {
                return Err(SimError::InvalidTraffic(format!(
                    "step {} channel {} is UNKNOWN; traffic must be fully observed",
                    step, channel
                )));
            }
        }
        Ok(Self {
            rows,
            num_channels,
            time_step: 0,
            policy: ExhaustionPolicy::Stop,
            warned: false,
        })
    }

    /// Build from channel-major data (`channels x steps`), the layout of
    /// per-node dataset files and of the synthetic generators.
    pub fn from_channels(channels: Vec<Vec<ChannelState>>) -> SimResult<Self> {
        let steps = channels
            .first()
            .map(Vec::len)
            .ok_or_else(|| SimError::InvalidTraffic("trace has no channels".to_string()))?;
        if let Some(bad) = channels.iter().position(|c| c.len() != steps) {
            return Err(SimError::InvalidTraffic(format!(
                "channel {} has {} steps, expected {}",
                bad,
                channels[bad].len(),
                steps
            )));
        }
        let rows = (0..steps)
            .map(|t| channels.iter().map(|c| c[t]).collect())
            .collect();
        Self::from_rows(rows)
    }

    /// Set the end-of-trace behavior.
    pub fn with_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    /// Steps consumed so far (saturates at the trace length).
    pub fn time_step(&self) -> usize {
        self.time_step
    }

    /// Recorded steps not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len().saturating_sub(self.time_step)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Snapshot] {
        &self.rows
    }

    /// Rewind to the first step.
    pub fn reset(&mut self) {
        self.time_step = 0;
        self.warned = false;
    }
}

impl TrafficSource for RecordedTraffic {
    fn num_channels(&self) -> usize {
        self.num_channels
    }

    fn num_steps(&self) -> Option<usize> {
        match self.policy {
            ExhaustionPolicy::Stop => Some(self.rows.len()),
            ExhaustionPolicy::RepeatLast | ExhaustionPolicy::Wrap => None,
        }
    }

    fn next_snapshot(&mut self) -> Option<Snapshot> {
        if let Some(row) = self.rows.get(self.time_step) {
            self.time_step += 1;
            return Some(row.clone());
        }

        if !self.warned && self.policy != ExhaustionPolicy::Stop {
            warn!(steps = self.rows.len(), policy = ?self.policy, "recorded traffic exhausted, replaying");
            self.warned = true;
        }
        match self.policy {
            ExhaustionPolicy::Stop => None,
            ExhaustionPolicy::RepeatLast => self.rows.last().cloned(),
            ExhaustionPolicy::Wrap => {
                self.time_step = 1;
                self.rows.first().cloned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coopsense_core::types::snapshot_from_codes;
    use ChannelState::*;

    fn trace() -> RecordedTraffic {
        let rows = [[1, 0, 1], [0, 0, 1], [1, 1, 0]]
            .iter()
            .map(|r| snapshot_from_codes(r).unwrap())
            .collect();
        RecordedTraffic::from_rows(rows).unwrap()
    }

    #[test]
    fn test_from_channels_transposes() {
        let traffic = RecordedTraffic::from_channels(vec![
            vec![Occupied, Empty],
            vec![Empty, Empty],
            vec![Occupied, Occupied],
        ])
        .unwrap();
        assert_eq!(traffic.num_channels(), 3);
        assert_eq!(traffic.len(), 2);
        assert_eq!(traffic.rows()[0], vec![Occupied, Empty, Occupied]);
        assert_eq!(traffic.rows()[1], vec![Empty, Empty, Occupied]);
    }

    #[test]
    fn test_rejects_bad_traces() {
        assert!(RecordedTraffic::from_rows(vec![]).is_err());
        assert!(RecordedTraffic::from_rows(vec![vec![Empty], vec![Empty, Occupied]]).is_err());
        assert!(RecordedTraffic::from_rows(vec![vec![Empty, Unknown]]).is_err());
        assert!(RecordedTraffic::from_channels(vec![vec![Empty], vec![]]).is_err());
    }

    #[test]
    fn test_stop_policy() {
        let mut traffic = trace();
        assert_eq!(traffic.num_steps(), Some(3));
        for _ in 0..3 {
            assert!(traffic.next_snapshot().is_some());
        }
        assert_eq!(traffic.remaining(), 0);
        assert_eq!(traffic.next_snapshot(), None);
        assert_eq!(traffic.time_step(), 3);
    }

    #[test]
    fn test_repeat_last_policy() {
        let mut traffic = trace().with_policy(ExhaustionPolicy::RepeatLast);
        assert_eq!(traffic.num_steps(), None);
        for _ in 0..3 {
            traffic.next_snapshot();
        }
        let last = vec![Occupied, Occupied, Empty];
        assert_eq!(traffic.next_snapshot(), Some(last.clone()));
        assert_eq!(traffic.next_snapshot(), Some(last));
    }

    #[test]
    fn test_wrap_policy() {
        let mut traffic = trace().with_policy(ExhaustionPolicy::Wrap);
        let first = traffic.next_snapshot();
        traffic.next_snapshot();
        traffic.next_snapshot();
        assert_eq!(traffic.next_snapshot(), first);
        assert_eq!(traffic.next_snapshot(), Some(vec![Empty, Empty, Occupied]));
    }

    #[test]
    fn test_reset() {
        let mut traffic = trace();
        traffic.next_snapshot();
        traffic.reset();
        assert_eq!(traffic.time_step(), 0);
        assert_eq!(traffic.remaining(), 3);
    }
}
