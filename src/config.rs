//! Construction-time settings for `TinyHash`.

use crate::error::TableError;

/// Load threshold used by `TinyHash::new`.
pub const DEFAULT_LOAD_THRESHOLD: f32 = 0.75;

/// Sizing and growth policy of a table.
///
/// `load_threshold == 0.0` disables proportional growth. An insertion that
/// finds no free slot rebuilds the table when either policy is active: with
/// `grow_when_full` it doubles once at least half full, otherwise it is
/// rehashed at its current size to reclaim vacated slots. A table with
/// threshold 0 and no `grow_when_full` fails such an insertion with
/// `TableError::CapacityExhausted`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub initial_capacity: usize,
    pub load_threshold: f32,
    pub grow_when_full: bool,
}

impl Config {
    /// A fixed-size table: no automatic growth of any kind.
    pub const fn new(initial_capacity: usize) -> Self {
        Self {
            initial_capacity,
            load_threshold: 0.0,
            grow_when_full: false,
        }
    }

    pub const fn load_threshold(mut self, load_threshold: f32) -> Self {
        self.load_threshold = load_threshold;
        self
    }

    pub const fn grow_when_full(mut self, grow_when_full: bool) -> Self {
        self.grow_when_full = grow_when_full;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), TableError> {
        if self.initial_capacity == 0 {
            return Err(TableError::InvalidCapacity);
        }
        // Also rejects NaN.
        if !(0.0f32..=1.0).contains(&self.load_threshold) {
            return Err(TableError::InvalidLoadThreshold(self.load_threshold));
        }
        Ok(())
    }

    /// Whether holding `len + 1` entries in `capacity` slots crosses the threshold.
    pub(crate) fn exceeded_by(&self, len: usize, capacity: usize) -> bool {
        self.load_threshold > 0.0 && (len + 1) as f32 / capacity as f32 > self.load_threshold
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(16)
            .load_threshold(DEFAULT_LOAD_THRESHOLD)
            .grow_when_full(true)
    }
}
