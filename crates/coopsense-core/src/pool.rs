//! Radio unit pool.

use crate::error::{CoopError, CoopResult};
use crate::types::{ChannelMap, ChannelState, RadioUnit};

/// Index of the monitored radio unit. Fixed for the lifetime of a pool; only
/// the channel held at this index changes.
pub const MONITORED_UNIT: usize = 0;

/// Owns every radio unit. Unit `i` starts on channel `i`.
#[derive(Debug, Clone)]
pub struct RadioUnitPool {
    units: Vec<RadioUnit>,
    num_channels: usize,
}

impl RadioUnitPool {
    pub fn new(num_units: usize, num_channels: usize) -> CoopResult<Self> {
        if num_units == 0 {
            return Err(CoopError::InvalidParameter {
                name: "number_of_radio_units",
                reason: "at least one radio unit is required".to_string(),
            });
        }
        if num_units > num_channels {
            return Err(CoopError::TooManyRadioUnits {
                units: num_units,
                channels: num_channels,
            });
        }
        Ok(Self {
            units: (0..num_units).map(RadioUnit::new).collect(),
            num_channels,
        })
    }

    pub fn units(&self) -> &[RadioUnit] {
        &self.units
    }

    pub fn get(&self, index: usize) -> Option<&RadioUnit> {
        self.units.get(index)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// The unit at [`MONITORED_UNIT`].
    pub fn monitored(&self) -> &RadioUnit {
        &self.units[MONITORED_UNIT]
    }

    /// Channel of every unit, in unit order.
    pub fn channels(&self) -> Vec<usize> {
        self.units.iter().map(RadioUnit::sensing_channel).collect()
    }

    /// Read each unit's channel out of a full occupancy snapshot.
    pub fn sense(&self, snapshot: &[ChannelState]) -> CoopResult<ChannelMap> {
        if snapshot.len() != self.num_channels {
            return Err(CoopError::WidthMismatch {
                expected: self.num_channels,
                actual: snapshot.len(),
            });
        }
        let mut sensed = ChannelMap::new(self.num_channels);
        for unit in &self.units {
            let channel = unit.sensing_channel();
            sensed.insert(channel, snapshot[channel])?;
        }
        Ok(sensed)
    }

    /// Move unit `active` to `channel`, swapping with whichever other unit
    /// currently holds it. Returns the index of the swapped unit.
    pub fn assign(&mut self, active: usize, channel: usize) -> CoopResult<Option<usize>> {
        if channel >= self.num_channels {
            return Err(CoopError::ChannelOutOfRange {
                channel,
                channels: self.num_channels,
            });
        }
        let previous = self
            .units
            .get(active)
            .ok_or(CoopError::UnitOutOfRange {
                index: active,
                units: self.units.len(),
            })?
            .sensing_channel();

        let passive = self
            .units
            .iter()
            .position(|u| u.index() != active && u.sensing_channel() == channel);
        if let Some(p) = passive {
            self.units[p].set_sensing_channel(previous);
        }
        self.units[active].set_sensing_channel(channel);
        Ok(passive)
    }

    /// Advance every unit to `(channel + 1) mod num_channels`.
    pub fn advance_all(&mut self) {
        let n = self.num_channels;
        for unit in &mut self.units {
            unit.set_sensing_channel((unit.sensing_channel() + 1) % n);
        }
    }

    #[cfg(test)]
    pub(crate) fn set_channel(&mut self, index: usize, channel: usize) {
        self.units[index].set_sensing_channel(channel);
    }
}
