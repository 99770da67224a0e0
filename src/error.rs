//! Error taxonomy shared by every table operation.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// Lookup or removal of a key that is not in the table.
    #[error("key not found")]
    NotFound,
    /// The free-slot cursor ran out while placing a new key in a table with
    /// threshold 0 and no `grow_when_full`, or doubling would overflow.
    #[error("no free slot left in a table of capacity {capacity}")]
    CapacityExhausted { capacity: usize },
    #[error("cannot resize to {requested} slots while holding {len} entries")]
    InvalidResize { requested: usize, len: usize },
    #[error("table capacity must be at least 1")]
    InvalidCapacity,
    #[error("load threshold {0} is outside [0, 1]")]
    InvalidLoadThreshold(f32),
}
