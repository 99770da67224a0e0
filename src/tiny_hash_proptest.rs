#![cfg(test)]

// Property tests for TinyHash kept inside the crate so they can reach the
// structural invariant checker.

use crate::config::Config;
use crate::error::TableError;
use crate::hashing::{DefaultKeyHasher, KeyHasher};
use crate::tiny_hash::TinyHash;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(String),
    Mutate(usize, i32),
    Resize(usize),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            2 => idx.clone().prop_map(OpI::Get),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => (0usize..24).prop_map(OpI::Resize),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn arb_config() -> impl Strategy<Value = Config> {
    let threshold = prop_oneof![Just(0.0f32), Just(0.5f32), Just(0.75f32), Just(1.0f32)];
    (1usize..=8, threshold, any::<bool>())
        .prop_map(|(cap, t, full)| Config::new(cap).load_threshold(t).grow_when_full(full))
}

// State-machine equivalence against std::collections::HashMap.
// Invariants exercised after every op:
// - every live key is reachable from its home slot; no slot has two predecessors;
// - `len` equals the number of occupied slots and the model's size;
// - insert/get round-trips, overwrites keep `len`;
// - removing an absent key reports NotFound and leaves the dump unchanged;
// - resize preserves every entry or is rejected without change;
// - only a fixed table (threshold 0, no grow_when_full) ever reports exhaustion,
//   and it rejects the new key without disturbing the rest.
fn run_scenario<H>(
    mut sut: TinyHash<String, i32, H>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    H: KeyHasher<String>,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                let before = sut.dump();
                match sut.insert(k.clone(), v) {
                    Ok(prev) => {
                        prop_assert_eq!(prev, model.insert(k.clone(), v));
                        prop_assert_eq!(sut.get(&k), Some(&v));
                    }
                    Err(TableError::CapacityExhausted { .. }) => {
                        prop_assert!(!model.contains_key(&k), "overwrite never needs a slot");
                        // Only a table with no growth policy may run out of slots.
                        prop_assert!(!sut.config().grow_when_full);
                        prop_assert_eq!(sut.config().load_threshold, 0.0);
                        prop_assert_eq!(sut.dump(), before);
                    }
                    Err(e) => prop_assert!(false, "unexpected insert error {:?}", e),
                }
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                match model.remove(k) {
                    Some(mv) => {
                        let (kk, vv) = sut.remove(k).expect("present for removal");
                        prop_assert_eq!(&kk, k);
                        prop_assert_eq!(vv, mv);
                        prop_assert!(!sut.contains_key(k));
                    }
                    None => {
                        let before = sut.dump();
                        prop_assert_eq!(sut.remove(k), Err(TableError::NotFound));
                        prop_assert_eq!(sut.dump(), before);
                    }
                }
            }
            OpI::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains_key(&s), model.contains_key(&s));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                if let Some(mv) = model.get_mut(k) {
                    let vr = sut.get_mut(k).expect("live key should resolve");
                    *vr = vr.saturating_add(d);
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(sut.get_mut(k).is_none());
                }
            }
            OpI::Resize(target) => {
                let before = sut.dump();
                let len = sut.len();
                match sut.resize(target) {
                    Ok(()) => {
                        prop_assert!(target >= len && target > 0);
                        prop_assert_eq!(sut.capacity(), target);
                        prop_assert_eq!(sut.len(), len);
                    }
                    Err(TableError::InvalidResize { requested, len: l }) => {
                        prop_assert!(target == 0 || target < len);
                        prop_assert_eq!((requested, l), (target, len));
                        prop_assert_eq!(sut.dump(), before);
                    }
                    Err(e) => prop_assert!(false, "unexpected resize error {:?}", e),
                }
                for (k, v) in &model {
                    prop_assert_eq!(sut.get(k), Some(v));
                }
            }
            OpI::Clear => {
                let cap = sut.capacity();
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap);
                prop_assert_eq!(sut.dump(), "");
            }
            OpI::Iterate => {
                let s: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeMap<_, _> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        // Post-conditions after each op
        if let Err(msg) = sut.check_invariants() {
            prop_assert!(false, "invariant broken: {}\n{}", msg, sut.dump());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.len() <= sut.capacity());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(config in arb_config(), (pool, ops) in arb_scenario()) {
        let sut = TinyHash::with_hasher(config, DefaultKeyHasher::new()).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

// Same invariants under a hasher with only a handful of distinct values:
// chains get long and parked nodes are relocated constantly.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions(config in arb_config(), (pool, ops) in arb_scenario()) {
        let by_len = |k: &String| k.len() as u32;
        let sut = TinyHash::with_hasher(config, by_len).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}

// Worst case: every key hashes identically, so the table is one chain.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_single_chain(config in arb_config(), (pool, ops) in arb_scenario()) {
        let constant = |_: &String| 7u32;
        let sut = TinyHash::with_hasher(config, constant).unwrap();
        run_scenario(sut, &pool, ops)?;
    }
}
