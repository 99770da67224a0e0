//! Slot store: the node array, its free-slot cursor, and the placement and
//! unlinking algorithms that keep every chain reachable from its anchor.
//!
//! A node's home slot is `hash % capacity`. A node sitting in its home slot
//! is an anchor; every other node hangs off exactly one predecessor's `next`
//! in the chain of the anchor that shares its home slot. Links are slot
//! indices into the same array, never references.

use core::fmt;

#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u32,
    pub(crate) next: Option<usize>,
}

impl<K, V> Node<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u32) -> Self {
        Self {
            key,
            value,
            hash,
            next: None,
        }
    }
}

pub(crate) struct Slots<K, V> {
    nodes: Box<[Option<Node<K, V>>]>,
    // Counts down from `capacity`; never rewinds until the array is rebuilt
    // or cleared.
    free_cursor: usize,
}

/// Walks a chain by following `next` links.
pub(crate) struct Chain<'a, K, V> {
    nodes: &'a [Option<Node<K, V>>],
    next: Option<usize>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = (usize, &'a Node<K, V>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let node = self.nodes[idx].as_ref()?;
        self.next = node.next;
        Some((idx, node))
    }
}

impl<K, V> Slots<K, V> {
    /// `capacity` must be non-zero; callers validate it.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            nodes: (0..capacity).map(|_| None).collect(),
            free_cursor: capacity,
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn home(&self, hash: u32) -> usize {
        hash as usize % self.nodes.len()
    }

    #[inline]
    pub(crate) fn nodes(&self) -> &[Option<Node<K, V>>] {
        &self.nodes
    }

    #[inline]
    pub(crate) fn nodes_mut(&mut self) -> &mut [Option<Node<K, V>>] {
        &mut self.nodes
    }

    pub(crate) fn node(&self, idx: usize) -> &Node<K, V> {
        self.nodes[idx]
            .as_ref()
            .expect("linked slot must be occupied")
    }

    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut Node<K, V> {
        self.nodes[idx]
            .as_mut()
            .expect("linked slot must be occupied")
    }

    /// The chain anchored at `mp`; empty if `mp` is vacant or holds a node
    /// parked there on behalf of another home slot.
    pub(crate) fn anchored_chain(&self, mp: usize) -> Chain<'_, K, V> {
        let start = match &self.nodes[mp] {
            Some(n) if self.home(n.hash) == mp => Some(mp),
            _ => None,
        };
        Chain {
            nodes: &self.nodes,
            next: start,
        }
    }

    /// Slot holding the node with `hash` for which `eq` holds.
    pub(crate) fn find(&self, hash: u32, mut eq: impl FnMut(&K) -> bool) -> Option<usize> {
        self.anchored_chain(self.home(hash))
            .find(|(_, n)| n.hash == hash && eq(&n.key))
            .map(|(idx, _)| idx)
    }

    /// Next vacant slot below the cursor, scanning downward.
    fn take_free_slot(&mut self) -> Option<usize> {
        while self.free_cursor > 0 {
            self.free_cursor -= 1;
            if self.nodes[self.free_cursor].is_none() {
                return Some(self.free_cursor);
            }
        }
        None
    }

    /// Places a node whose key is known to be absent.
    ///
    /// Returns the slot the node landed in, or hands the node back untouched
    /// when a free slot was needed and the cursor is exhausted; in that case
    /// no other slot has been modified.
    pub(crate) fn place(&mut self, mut node: Node<K, V>) -> Result<usize, Node<K, V>> {
        let mp = self.home(node.hash);
        let Some(occupant_hash) = self.nodes[mp].as_ref().map(|n| n.hash) else {
            node.next = None;
            self.nodes[mp] = Some(node);
            return Ok(mp);
        };

        let Some(free) = self.take_free_slot() else {
            return Err(node);
        };

        let owner = self.home(occupant_hash);
        if owner == mp {
            // Collides with an anchor: become the second link of its chain.
            let anchor = self.node_mut(mp);
            node.next = anchor.next.replace(free);
            self.nodes[free] = Some(node);
            Ok(free)
        } else {
            // The occupant is parked here for another chain; move it out and
            // claim its home slot.
            let pred = self
                .anchored_chain(owner)
                .find(|(_, n)| n.next == Some(mp))
                .map(|(idx, _)| idx)
                .expect("parked node must have a predecessor in its chain");
            self.nodes[free] = self.nodes[mp].take();
            self.node_mut(pred).next = Some(free);
            node.next = None;
            self.nodes[mp] = Some(node);
            Ok(mp)
        }
    }

    /// Removes the node with `hash` for which `eq` holds, keeping the rest of
    /// its chain reachable from the home slot.
    pub(crate) fn unlink(
        &mut self,
        hash: u32,
        mut eq: impl FnMut(&K) -> bool,
    ) -> Option<Node<K, V>> {
        let mut pred = None;
        let mut found = None;
        for (idx, n) in self.anchored_chain(self.home(hash)) {
            if n.hash == hash && eq(&n.key) {
                found = Some(idx);
                break;
            }
            pred = Some(idx);
        }
        let idx = found?;
        let next = self.node(idx).next;

        match (pred, next) {
            (Some(p), next) => {
                self.node_mut(p).next = next;
                self.nodes[idx].take()
            }
            (None, None) => self.nodes[idx].take(),
            (None, Some(succ)) => {
                // The anchor slot is the chain's only entry point: pull the
                // successor into it and vacate the successor's slot instead.
                let successor = self.nodes[succ].take();
                core::mem::replace(&mut self.nodes[idx], successor)
            }
        }
    }

    /// Empties every slot and rewinds the cursor.
    pub(crate) fn clear(&mut self) {
        for slot in self.nodes.iter_mut() {
            *slot = None;
        }
        self.free_cursor = self.nodes.len();
    }

    pub(crate) fn into_slot_vec(self) -> Vec<Option<Node<K, V>>> {
        self.nodes.into_vec()
    }

    /// Live nodes in ascending slot order.
    pub(crate) fn into_nodes(self) -> impl Iterator<Item = Node<K, V>> {
        self.into_slot_vec().into_iter().flatten()
    }

    /// Writes `(slot,hash,next)` for each occupied slot, `-1` ending a chain.
    pub(crate) fn write_dump(&self, out: &mut impl fmt::Write) -> fmt::Result {
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Some(n) = node {
                match n.next {
                    Some(next) => write!(out, "({},{},{})", idx, n.hash, next)?,
                    None => write!(out, "({},{},-1)", idx, n.hash)?,
                }
            }
        }
        Ok(())
    }

    /// Verifies the structural invariants; returns the number of live nodes.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<usize, String> {
        let cap = self.capacity();
        let mut in_degree = vec![0usize; cap];
        let mut live = 0;
        for (idx, slot) in self.nodes.iter().enumerate() {
            let Some(n) = slot else { continue };
            live += 1;
            if let Some(next) = n.next {
                if next >= cap {
                    return Err(format!("slot {idx} links outside the array to {next}"));
                }
                let Some(succ) = &self.nodes[next] else {
                    return Err(format!("slot {idx} links to vacant slot {next}"));
                };
                if self.home(succ.hash) != self.home(n.hash) {
                    return Err(format!("slot {idx} links across home slots to {next}"));
                }
                if self.home(succ.hash) == next {
                    return Err(format!("anchor at {next} has a predecessor {idx}"));
                }
                in_degree[next] += 1;
            }
        }
        for (idx, slot) in self.nodes.iter().enumerate() {
            let Some(n) = slot else { continue };
            if in_degree[idx] > 1 {
                return Err(format!("slot {idx} has {} predecessors", in_degree[idx]));
            }
            let mp = self.home(n.hash);
            if mp != idx && in_degree[idx] == 0 {
                return Err(format!("slot {idx} is neither an anchor nor linked"));
            }
            let reachable = self.anchored_chain(mp).take(cap).any(|(at, _)| at == idx);
            if !reachable {
                return Err(format!("slot {idx} is unreachable from home slot {mp}"));
            }
        }
        Ok(live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dump<K, V>(s: &Slots<K, V>) -> String {
        let mut out = String::new();
        s.write_dump(&mut out).unwrap();
        out
    }

    fn place(s: &mut Slots<u32, ()>, hash: u32) -> usize {
        s.place(Node::new(hash, (), hash)).ok().expect("free slot")
    }

    fn unlink(s: &mut Slots<u32, ()>, hash: u32) -> Option<u32> {
        s.unlink(hash, |&k| k == hash).map(|n| n.key)
    }

    #[test]
    fn anchor_collision_and_relocation() {
        let mut s = Slots::with_capacity(4);
        assert_eq!(place(&mut s, 1), 1);
        assert_eq!(place(&mut s, 5), 3);
        assert_eq!(dump(&s), "(1,1,3)(3,5,-1)");
        assert_eq!(place(&mut s, 17), 2);
        assert_eq!(dump(&s), "(1,1,2)(2,17,3)(3,5,-1)");
        // 2's home is held by 17 on behalf of chain 1: 17 moves to slot 0.
        assert_eq!(place(&mut s, 2), 2);
        assert_eq!(dump(&s), "(0,17,3)(1,1,0)(2,2,-1)(3,5,-1)");
        assert_eq!(s.check_invariants(), Ok(4));
    }

    #[test]
    fn full_array_hands_the_node_back() {
        let mut s = Slots::with_capacity(2);
        place(&mut s, 0);
        place(&mut s, 2);
        let before = dump(&s);
        let rejected = s.place(Node::new(4, (), 4)).err().expect("no room");
        assert_eq!(rejected.key, 4);
        assert_eq!(dump(&s), before);
    }

    #[test]
    fn cursor_does_not_rewind_after_removal() {
        let mut s = Slots::with_capacity(4);
        place(&mut s, 0);
        place(&mut s, 4); // slot 3
        assert_eq!(unlink(&mut s, 4), Some(4));
        // Slot 3 is vacant again but above the cursor; 8 lands in slot 2.
        assert_eq!(place(&mut s, 8), 2);
        s.clear();
        assert_eq!(dump(&s), "");
        place(&mut s, 0);
        assert_eq!(place(&mut s, 4), 3);
    }

    #[test]
    fn unlink_head_inner_and_tail() {
        let mut s = Slots::with_capacity(8);
        for h in [1, 9, 17, 25] {
            place(&mut s, h);
        }
        assert_eq!(dump(&s), "(1,1,5)(5,25,6)(6,17,7)(7,9,-1)");
        assert_eq!(unlink(&mut s, 17), Some(17));
        assert_eq!(dump(&s), "(1,1,5)(5,25,7)(7,9,-1)");
        assert_eq!(unlink(&mut s, 1), Some(1));
        assert_eq!(dump(&s), "(1,25,7)(7,9,-1)");
        assert_eq!(unlink(&mut s, 9), Some(9));
        assert_eq!(dump(&s), "(1,25,-1)");
        assert_eq!(unlink(&mut s, 33), None);
        assert_eq!(unlink(&mut s, 25), Some(25));
        assert_eq!(dump(&s), "");
        assert_eq!(s.check_invariants(), Ok(0));
    }

    #[test]
    fn lookup_ignores_parked_foreign_nodes() {
        let mut s = Slots::with_capacity(4);
        place(&mut s, 1);
        place(&mut s, 5); // parked in slot 3, whose home chain is empty
        assert_eq!(s.find(3, |_| true), None);
        assert_eq!(s.find(5, |&k| k == 5), Some(3));
    }
}
