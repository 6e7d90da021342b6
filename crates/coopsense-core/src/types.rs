//! Core data types for cooperative channel sensing.
//!
//! - [`ChannelState`]: observed or inferred occupancy of one channel
//! - [`Snapshot`]: one full-width row of channel states for a single step
//! - [`ChannelMap`]: a bounded `channel -> state` map, used both for the values
//!   sensed this step and for the joint view that fills the rest with
//!   [`ChannelState::Unknown`]
//! - [`RadioUnit`]: a sensing unit bound to one channel

use crate::error::{CoopError, CoopResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ChannelState
// ---------------------------------------------------------------------------

/// Occupancy state of a channel at a given step.
///
/// The integer codes (`0`, `1`, `2`) are the ones used by recorded traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ChannelState {
    /// No primary user observed
    Empty = 0,
    /// Primary user observed
    Occupied = 1,
    /// Not sensed this step
    Unknown = 2,
}

impl ChannelState {
    /// Integer code of this state.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse an integer code.
    pub fn from_code(code: u8) -> CoopResult<Self> {
        match code {
            0 => Ok(ChannelState::Empty),
            1 => Ok(ChannelState::Occupied),
            2 => Ok(ChannelState::Unknown),
            other => Err(CoopError::InvalidStateCode(other)),
        }
    }

    pub fn is_empty(self) -> bool {
        self == ChannelState::Empty
    }

    pub fn is_occupied(self) -> bool {
        self == ChannelState::Occupied
    }

    /// True for sensed values (`Empty` or `Occupied`).
    pub fn is_known(self) -> bool {
        self != ChannelState::Unknown
    }
}

impl TryFrom<u8> for ChannelState {
    type Error = CoopError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelState::Empty => write!(f, "EMPTY"),
            ChannelState::Occupied => write!(f, "OCCUPIED"),
            ChannelState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One row of channel states, indexed by channel.
pub type Snapshot = Vec<ChannelState>;

/// Build a snapshot from integer codes.
pub fn snapshot_from_codes(codes: &[u8]) -> CoopResult<Snapshot> {
    codes.iter().map(|&c| ChannelState::from_code(c)).collect()
}

// ---------------------------------------------------------------------------
// ChannelMap
// ---------------------------------------------------------------------------

/// Bounded `channel -> state` map over `[0, num_channels)`.
///
/// Stored as a fixed-width optional array, so lookups are O(1) and an
/// out-of-range channel is rejected instead of silently widening the map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMap {
    values: Vec<Option<ChannelState>>,
}

impl ChannelMap {
    /// Create a map with no entries.
    pub fn new(num_channels: usize) -> Self {
        Self {
            values: vec![None; num_channels],
        }
    }

    /// Create a map from `(channel, state)` pairs.
    pub fn from_pairs<I>(num_channels: usize, pairs: I) -> CoopResult<Self>
    where
        I: IntoIterator<Item = (usize, ChannelState)>,
    {
        let mut map = Self::new(num_channels);
        for (channel, state) in pairs {
            map.insert(channel, state)?;
        }
        Ok(map)
    }

    /// Create a map from `(channel, code)` pairs.
    pub fn from_codes<I>(num_channels: usize, pairs: I) -> CoopResult<Self>
    where
        I: IntoIterator<Item = (usize, u8)>,
    {
        let mut map = Self::new(num_channels);
        for (channel, code) in pairs {
            map.insert(channel, ChannelState::from_code(code)?)?;
        }
        Ok(map)
    }

    /// Insert a value, returning the previous one.
    pub fn insert(&mut self, channel: usize, state: ChannelState) -> CoopResult<Option<ChannelState>> {
        let channels = self.values.len();
        let slot = self
            .values
            .get_mut(channel)
            .ok_or(CoopError::ChannelOutOfRange { channel, channels })?;
        Ok(slot.replace(state))
    }

    /// Value for `channel`, if present.
    pub fn get(&self, channel: usize) -> Option<ChannelState> {
        self.values.get(channel).copied().flatten()
    }

    pub fn contains(&self, channel: usize) -> bool {
        self.get(channel).is_some()
    }

    /// Width of the map (number of channels it can address).
    pub fn num_channels(&self) -> usize {
        self.values.len()
    }

    /// Number of channels that carry a value.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Iterate over present `(channel, state)` entries in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ChannelState)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(channel, v)| v.map(|state| (channel, state)))
    }

    /// Joint view: every absent channel becomes [`ChannelState::Unknown`].
    pub fn to_joint(&self) -> ChannelMap {
        Self {
            values: self
                .values
                .iter()
                .map(|v| Some(v.unwrap_or(ChannelState::Unknown)))
                .collect(),
        }
    }

    /// Full-width snapshot, `Unknown` where the map has no value.
    pub fn to_snapshot(&self) -> Snapshot {
        self.values
            .iter()
            .map(|v| v.unwrap_or(ChannelState::Unknown))
            .collect()
    }

    /// True when `row` agrees with every entry present in the map.
    ///
    /// A row too short to hold one of the entries does not match.
    pub fn matches(&self, row: &[ChannelState]) -> bool {
        self.iter().all(|(channel, state)| row.get(channel) == Some(&state))
    }
}

// ---------------------------------------------------------------------------
// RadioUnit
// ---------------------------------------------------------------------------

/// A sensing unit bound to exactly one channel at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioUnit {
    index: usize,
    sensing_channel: usize,
}

impl RadioUnit {
    /// Units start on the channel matching their index.
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            sensing_channel: index,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Channel this unit is currently sensing.
    pub fn sensing_channel(&self) -> usize {
        self.sensing_channel
    }

    pub(crate) fn set_sensing_channel(&mut self, channel: usize) {
        self.sensing_channel = channel;
    }
}
