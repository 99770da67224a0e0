//! TinyHash: the public table over the slot store.

use crate::config::{Config, DEFAULT_LOAD_THRESHOLD};
use crate::error::TableError;
use crate::hashing::{DefaultKeyHasher, KeyEquals, KeyHasher, NulTerminatedEq};
use crate::slots::{Node, Slots};
use core::fmt;
use core::iter::FusedIterator;

/// Array-backed map from `K` to `V` with caller-supplied hashing and equality.
///
/// Keys and values are stored as given. Use borrowed or shared types
/// (`&str`, `&T`, `Rc<T>`) when the table should only hold handles to
/// payloads owned elsewhere; dropping the table then releases nothing but
/// the slot array.
pub struct TinyHash<K, V, H = DefaultKeyHasher, E = NulTerminatedEq> {
    slots: Slots<K, V>,
    len: usize,
    hasher: H,
    equals: E,
    config: Config,
}

impl<K, V> TinyHash<K, V>
where
    K: AsRef<[u8]>,
{
    /// Table with the default hasher and equality, growing at 75% load and
    /// whenever it runs out of free slots.
    pub fn new(capacity: usize) -> Result<Self, TableError> {
        let config = Config::new(capacity)
            .load_threshold(DEFAULT_LOAD_THRESHOLD)
            .grow_when_full(true);
        Self::with_hasher_and_eq(config, DefaultKeyHasher::new(), NulTerminatedEq)
    }
}

impl<K, V, H> TinyHash<K, V, H>
where
    K: AsRef<[u8]>,
    H: KeyHasher<K>,
{
    /// Custom hasher, default NUL-terminated byte equality.
    pub fn with_hasher(config: Config, hasher: H) -> Result<Self, TableError> {
        Self::with_hasher_and_eq(config, hasher, NulTerminatedEq)
    }
}

impl<K, V, H, E> TinyHash<K, V, H, E> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Empties the table, keeping its capacity.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.len = 0;
    }

    /// Entries in ascending slot order (not chain order).
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            nodes: self.slots.nodes(),
            cursor: 0,
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.slots.nodes_mut().iter_mut(),
            remaining: self.len,
        }
    }

    /// `(slot,hash,next)` for every occupied slot in ascending order, with
    /// `next = -1` at a chain's end. Meant for tests and debugging; the
    /// format is not a stable interface.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.slots.write_dump(&mut out);
        out
    }
}

impl<K, V, H, E> TinyHash<K, V, H, E>
where
    H: KeyHasher<K>,
    E: KeyEquals<K>,
{
    pub fn with_hasher_and_eq(config: Config, hasher: H, equals: E) -> Result<Self, TableError> {
        config.validate()?;
        Ok(Self {
            slots: Slots::with_capacity(config.initial_capacity),
            len: 0,
            hasher,
            equals,
            config,
        })
    }

    fn locate(&self, key: &K) -> Option<usize> {
        let hash = self.hasher.hash_key(key);
        self.slots.find(hash, |k| self.equals.keys_equal(k, key))
    }

    /// Inserts `key -> value`, overwriting the value of an equal key already
    /// present and returning the previous value.
    ///
    /// A new key may first grow or rebuild the table (see `Config`). On
    /// `CapacityExhausted`, only possible for a table with no growth policy,
    /// the table is unchanged and `key`/`value` are dropped.
    #[doc(alias = "put")]
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>, TableError> {
        let hash = self.hasher.hash_key(&key);
        let equals = &self.equals;
        if let Some(idx) = self.slots.find(hash, |k| equals.keys_equal(k, &key)) {
            let node = self.slots.node_mut(idx);
            return Ok(Some(core::mem::replace(&mut node.value, value)));
        }

        if self.config.exceeded_by(self.len, self.capacity()) {
            self.grow()?;
        }

        let node = match self.slots.place(Node::new(key, value, hash)) {
            Ok(_) => {
                self.len += 1;
                return Ok(None);
            }
            Err(node) => node,
        };

        self.make_room()?;
        match self.slots.place(node) {
            Ok(_) => {
                self.len += 1;
                Ok(None)
            }
            Err(_) => Err(TableError::CapacityExhausted {
                capacity: self.capacity(),
            }),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.locate(key).map(|idx| &self.slots.node(idx).value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = self.locate(key)?;
        Some(&mut self.slots.node_mut(idx).value)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.locate(key).map(|idx| {
            let node = self.slots.node(idx);
            (&node.key, &node.value)
        })
    }

    #[doc(alias = "exists")]
    pub fn contains_key(&self, key: &K) -> bool {
        self.locate(key).is_some()
    }

    /// Removes `key`, returning the stored key and value.
    pub fn remove(&mut self, key: &K) -> Result<(K, V), TableError> {
        let hash = self.hasher.hash_key(key);
        let equals = &self.equals;
        let node = self
            .slots
            .unlink(hash, |k| equals.keys_equal(k, key))
            .ok_or(TableError::NotFound)?;
        self.len -= 1;
        Ok((node.key, node.value))
    }

    /// Rebuilds the table with `new_capacity` slots, replaying placement for
    /// every entry in ascending slot order.
    ///
    /// Rejects a capacity of zero or one below `len()` with
    /// `InvalidResize`; the table is left as it was.
    pub fn resize(&mut self, new_capacity: usize) -> Result<(), TableError> {
        if new_capacity == 0 || new_capacity < self.len {
            return Err(TableError::InvalidResize {
                requested: new_capacity,
                len: self.len,
            });
        }
        self.rehash(new_capacity);
        Ok(())
    }

    fn grow(&mut self) -> Result<(), TableError> {
        let doubled = self
            .capacity()
            .checked_mul(2)
            .ok_or(TableError::CapacityExhausted {
                capacity: self.capacity(),
            })?;
        self.rehash(doubled);
        Ok(())
    }

    /// Called when the free-slot cursor ran out.
    ///
    /// With `grow_when_full`, a table at least half full doubles. Otherwise
    /// the table is rebuilt at its current size, reclaiming the slots vacated
    /// above the cursor; the threshold check already guaranteed one of them
    /// is free. Only a table with neither policy reports exhaustion.
    fn make_room(&mut self) -> Result<(), TableError> {
        let capacity = self.capacity();
        if self.config.grow_when_full && self.len >= capacity / 2 {
            self.grow()
        } else if self.config.grow_when_full || self.config.load_threshold > 0.0 {
            self.rehash(capacity);
            Ok(())
        } else {
            Err(TableError::CapacityExhausted { capacity })
        }
    }

    fn rehash(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.len);
        let old = core::mem::replace(&mut self.slots, Slots::with_capacity(new_capacity));
        let mut placed = 0;
        for node in old.into_nodes() {
            // Hashes are cached: no user code runs while the old array is
            // being drained.
            if self.slots.place(node).is_err() {
                unreachable!("fresh array with capacity >= len always has a free slot");
            }
            placed += 1;
        }
        // Post-condition of every resize: the entry count is preserved.
        assert_eq!(placed, self.len, "rehash must preserve every entry");
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let live = self.slots.check_invariants()?;
        if live != self.len {
            return Err(format!("len {} but {} occupied slots", self.len, live));
        }
        for (k, _) in self.iter() {
            if self.locate(k).is_none() {
                let hash = self.hasher.hash_key(k);
                return Err(format!("entry with hash {hash} is not found by lookup"));
            }
        }
        Ok(())
    }
}

impl<K, V, H, E> fmt::Debug for TinyHash<K, V, H, E>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Iterator over entries, driven by an explicit slot cursor.
pub struct Iter<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    cursor: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while self.cursor < nodes.len() {
            let slot = &nodes[self.cursor];
            self.cursor += 1;
            if let Some(n) = slot {
                self.remaining -= 1;
                return Some((&n.key, &n.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

pub struct IterMut<'a, K, V> {
    it: core::slice::IterMut<'a, Option<Node<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.it.by_ref() {
            if let Some(n) = slot {
                self.remaining -= 1;
                return Some((&n.key, &mut n.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Owning iterator, ascending slot order.
pub struct IntoIter<K, V> {
    it: std::vec::IntoIter<Option<Node<K, V>>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        for slot in self.it.by_ref() {
            if let Some(n) = slot {
                self.remaining -= 1;
                return Some((n.key, n.value));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, H, E> IntoIterator for TinyHash<K, V, H, E> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            remaining: self.len,
            it: self.slots.into_slot_vec().into_iter(),
        }
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a TinyHash<K, V, H, E> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, H, E> IntoIterator for &'a mut TinyHash<K, V, H, E> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}
