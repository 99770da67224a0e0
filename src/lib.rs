//! tinyhash: a fixed-capacity, array-backed hash table that chains
//! colliding keys through free slots of the same array.
//!
//! Internal Design:
//!
//! Summary
//! - One array of slots, each either vacant or holding a node
//!   `(key, value, hash, next)`. `next` is a slot index, so chains are
//!   links inside the array rather than heap pointers.
//! - A key's home slot is `hash % capacity`. A node in its home slot is an
//!   anchor and the only entry point of its chain; lookup walks that chain
//!   and nothing else.
//! - Layers:
//!   - `slots::Slots<K, V>`: the array, the free-slot cursor, placement,
//!     and unlinking. Knows hashes, never calls user code except the
//!     equality closure handed to a lookup.
//!   - `TinyHash<K, V, H, E>`: public map. Runs the injected `KeyHasher`
//!     and `KeyEquals`, counts entries, and applies the growth policy from
//!     `Config`.
//!
//! Placement
//! - Vacant home slot: the node becomes its anchor.
//! - Home slot held by an anchor: the node takes a free slot and is linked
//!   right after the anchor.
//! - Home slot held by a node parked there for another chain: that node
//!   moves to a free slot, its predecessor is relinked, and the new node
//!   becomes the anchor.
//!
//! Removal
//! - A non-anchor is spliced out of its chain.
//! - An anchor with a successor absorbs the successor into the anchor slot,
//!   so the chain stays addressable from its home slot.
//!
//! Free-slot cursor
//! - Starts one past the last slot and only moves down. Slots vacated above
//!   it are not reused until a rehash or `clear`. An exhausted cursor
//!   rebuilds the table: doubled under `Config::grow_when_full` when at least
//!   half full, same size otherwise. Only a table with threshold 0 and no
//!   `grow_when_full` fails the insertion with `TableError::CapacityExhausted`,
//!   leaving the table intact.
//!
//! Rehashing
//! - `resize` and automatic growth build a fresh array and replay placement
//!   in ascending slot order of the old one. Hashes are cached per node, so
//!   `KeyHasher` is never invoked during a rehash.
//!
//! Notes and non-goals
//! - Single-threaded; callers needing shared mutation wrap the table in a
//!   lock of their choosing.
//! - The table owns only what it is given. Borrowed keys and values
//!   (`&str`, `&T`) make it a pure index over caller-owned payloads.
//! - Lookup compares cached hashes before calling `KeyEquals`, so keys the
//!   predicate calls equal are only matched when their hashes agree too.
//! - `dump()` renders `(slot,hash,next)` per occupied slot for tests; it is
//!   not a stable format.

mod config;
mod error;
pub mod hashing;
mod slots;
mod tiny_hash;
mod tiny_hash_proptest;

// Public surface
pub use config::{Config, DEFAULT_LOAD_THRESHOLD};
pub use error::TableError;
pub use hashing::{DefaultKeyHasher, KeyEquals, KeyHasher, NulTerminatedEq};
pub use tiny_hash::{IntoIter, Iter, IterMut, TinyHash};
