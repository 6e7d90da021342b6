//! RSSI trace ingestion.
//!
//! Each node file holds one RSSI reading per line, the value in the first
//! comma-separated column. Comment lines (`#`) and non-numeric header lines
//! are skipped. A reading below the threshold marks the node's channel
//! OCCUPIED for that step, anything else EMPTY.
//!
//! Node files are not guaranteed to be the same length, so a multi-node load
//! truncates every node to the shortest one; steps near the end of the longer
//! files may be misaligned with the others.

use crate::error::{SimError, SimResult};
use crate::traffic::RecordedTraffic;
use coopsense_core::types::ChannelState;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Readings strictly below this are OCCUPIED.
pub const DEFAULT_RSSI_THRESHOLD: i64 = 30;

/// Readings kept per node.
pub const DEFAULT_MAX_LENGTH: usize = 100_000;

/// Converts per-node RSSI traces into occupancy traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RssiTraceReader {
    pub threshold: i64,
    pub max_length: Option<usize>,
}

impl Default for RssiTraceReader {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RSSI_THRESHOLD,
            max_length: Some(DEFAULT_MAX_LENGTH),
        }
    }
}

impl RssiTraceReader {
    pub fn new(threshold: i64) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Keep at most `max_length` readings per node (None = all).
    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Occupancy for a single reading.
    pub fn classify(&self, rssi: i64) -> ChannelState {
        if rssi < self.threshold {
            ChannelState::Occupied
        } else {
            ChannelState::Empty
        }
    }

    /// Parse one node trace.
    pub fn parse_trace<R: BufRead>(&self, reader: R) -> SimResult<Vec<ChannelState>> {
        let mut states = Vec::new();
        let mut skipped = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            if self.max_length.is_some_and(|max| states.len() >= max) {
                break;
            }
            let line = line.map_err(|e| SimError::Parse {
                line: idx + 1,
                reason: e.to_string(),
            })?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let field = trimmed.split(',').next().unwrap_or_default().trim();
            match field.parse::<f64>() {
                Ok(value) if value.is_finite() => states.push(self.classify(value.round() as i64)),
                _ if states.is_empty() => skipped += 1,
                _ => {
                    return Err(SimError::Parse {
                        line: idx + 1,
                        reason: format!("expected an RSSI reading, found '{}'", field),
                    })
                }
            }
        }

        if skipped > 0 {
            warn!(skipped, "skipped non-numeric lines before the first reading");
        }
        Ok(states)
    }

    /// Read one node trace from disk.
    pub fn read_node(&self, path: &Path) -> SimResult<Vec<ChannelState>> {
        let file = File::open(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let states = self.parse_trace(BufReader::new(file))?;
        debug!(path = %path.display(), readings = states.len(), "read RSSI trace");
        Ok(states)
    }

    /// Load one channel per node file.
    pub fn load_nodes<P: AsRef<Path>>(&self, paths: &[P]) -> SimResult<RecordedTraffic> {
        let mut channels = Vec::with_capacity(paths.len());
        for path in paths {
            channels.push(self.read_node(path.as_ref())?);
        }
        self.align(channels)
    }

    /// Truncate every node to the shortest and build the trace.
    pub fn align(&self, mut channels: Vec<Vec<ChannelState>>) -> SimResult<RecordedTraffic> {
        let shortest = channels
            .iter()
            .map(Vec::len)
            .min()
            .ok_or_else(|| SimError::InvalidTraffic("no node traces given".to_string()))?;
        if shortest == 0 {
            return Err(SimError::InvalidTraffic("a node trace has no readings".to_string()));
        }
        for channel in &mut channels {
            channel.truncate(shortest);
        }
        info!(nodes = channels.len(), steps = shortest, "loaded RSSI dataset");
        RecordedTraffic::from_channels(channels)
    }
}
