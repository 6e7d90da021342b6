//! Bounded occupancy history with flush-on-full.
//!
//! [`ChannelHistory`] is the cache the switch controller estimates from. Each
//! step appends one full-width [`Snapshot`] holding the sensed values and
//! [`ChannelState::Unknown`] for every channel nobody sensed.
//!
//! The history is not a sliding window: appending to a full history discards
//! every row first, so the new row becomes the only entry. Joint statistics
//! therefore restart from scratch once per `max_size` steps.

use crate::error::{CoopError, CoopResult};
use crate::types::{ChannelMap, ChannelState, Snapshot};
use tracing::debug;

/// Append-only log of joint occupancy snapshots, `size <= max_size`.
#[derive(Debug, Clone)]
pub struct ChannelHistory {
    num_channels: usize,
    max_size: usize,
    rows: Vec<Snapshot>,
    flushes: u64,
}

impl ChannelHistory {
    /// Create an empty history for `num_channels` channels.
    pub fn new(num_channels: usize, max_size: usize) -> CoopResult<Self> {
        if max_size == 0 {
            return Err(CoopError::InvalidParameter {
                name: "max_channel_cache_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(Self {
            num_channels,
            max_size,
            rows: Vec::new(),
            flushes: 0,
        })
    }

    /// Append this step's sensed values.
    ///
    /// Channels absent from `sensed` are recorded as `Unknown`. A full history
    /// is flushed before the append, leaving size 1 afterwards.
    pub fn append(&mut self, sensed: &ChannelMap) -> CoopResult<()> {
        if sensed.num_channels() != self.num_channels {
            return Err(CoopError::WidthMismatch {
                expected: self.num_channels,
                actual: sensed.num_channels(),
            });
        }

        if self.rows.len() == self.max_size {
            debug!(max_size = self.max_size, "channel history full, flushing");
            self.flush();
            self.flushes += 1;
        }

        self.rows.push(sensed.to_snapshot());
        Ok(())
    }

    /// Discard every row.
    pub fn flush(&mut self) {
        self.rows.clear();
    }

    /// Current number of rows.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() == self.max_size
    }

    /// `(rows, channels)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.num_channels)
    }

    /// Rows in chronological order.
    pub fn rows(&self) -> &[Snapshot] {
        &self.rows
    }

    /// Most recent row.
    pub fn last(&self) -> Option<&[ChannelState]> {
        self.rows.last().map(Vec::as_slice)
    }

    /// Number of automatic flushes triggered by appending to a full history.
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ChannelState::*;

    fn sensed(pairs: &[(usize, u8)]) -> ChannelMap {
        ChannelMap::from_codes(6, pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_history_init() {
        let history = ChannelHistory::new(6, 42).unwrap();
        assert_eq!(history.shape(), (0, 6));
        assert_eq!(history.size(), 0);
        assert!(history.is_empty());
        assert!(ChannelHistory::new(6, 0).is_err());
    }

    #[test]
    fn test_append_fills_unknown() {
        let mut history = ChannelHistory::new(6, 42).unwrap();
        history.append(&sensed(&[(0, 1), (1, 1)])).unwrap();
        assert_eq!(history.size(), 1);
        assert_eq!(
            history.last().unwrap(),
            &[Occupied, Occupied, Unknown, Unknown, Unknown, Unknown]
        );

        history.append(&sensed(&[(4, 0)])).unwrap();
        assert_eq!(history.size(), 2);
        assert_eq!(history.rows()[1][4], Empty);
        assert_eq!(history.rows()[1].iter().filter(|s| !s.is_known()).count(), 5);
    }

    #[test]
    fn test_append_rejects_width_mismatch() {
        let mut history = ChannelHistory::new(6, 42).unwrap();
        let narrow = ChannelMap::from_codes(4, [(0, 1)]).unwrap();
        assert_eq!(
            history.append(&narrow),
            Err(CoopError::WidthMismatch { expected: 6, actual: 4 })
        );
        assert!(history.is_empty());
    }

    #[test]
    fn test_auto_flush_when_full() {
        let mut history = ChannelHistory::new(6, 42).unwrap();
        for _ in 0..42 {
            history.append(&sensed(&[(0, 1), (1, 1)])).unwrap();
        }
        assert!(history.is_full());
        assert_eq!(history.flush_count(), 0);

        history.append(&sensed(&[(2, 0)])).unwrap();
        assert_eq!(history.size(), 1);
        assert_eq!(history.flush_count(), 1);
        assert_eq!(history.rows()[0][2], Empty);

        for _ in 0..10 {
            history.append(&sensed(&[(0, 1)])).unwrap();
        }
        assert!(history.size() < history.max_size());
    }

    #[test]
    fn test_manual_flush() {
        let mut history = ChannelHistory::new(6, 12).unwrap();
        history.append(&sensed(&[(0, 0)])).unwrap();
        history.flush();
        assert_eq!(history.size(), 0);
        assert_eq!(history.shape(), (0, 6));
        assert_eq!(history.flush_count(), 0);
    }
}
