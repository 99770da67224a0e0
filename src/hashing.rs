//! Injected hash and equality functions.
//!
//! The table never looks inside a key on its own: every home-slot
//! computation goes through a `KeyHasher` and every key comparison through a
//! `KeyEquals`. Closures and fn items of the right shape implement both
//! traits, so callers can pass `|k: &&str| ...` directly.

use core::hash::BuildHasher;
use hashbrown::hash_map::DefaultHashBuilder;

/// Maps a key to the 32-bit hash its home slot is derived from.
pub trait KeyHasher<K: ?Sized> {
    fn hash_key(&self, key: &K) -> u32;
}

/// Equality predicate over keys. Must agree with the paired `KeyHasher`:
/// keys that compare equal have to hash equally.
///
/// Chain members are compared by cached hash first, so two keys this
/// predicate calls equal but whose hashes differ are never matched, even
/// when they share a home slot.
pub trait KeyEquals<K: ?Sized> {
    fn keys_equal(&self, a: &K, b: &K) -> bool;
}

impl<K: ?Sized, F> KeyHasher<K> for F
where
    F: Fn(&K) -> u32,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u32 {
        self(key)
    }
}

impl<K: ?Sized, F> KeyEquals<K> for F
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        self(a, b)
    }
}

/// Bytes of `key` up to, not including, the first NUL.
fn until_nul(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|&b| b == 0) {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Default equality: byte-exact comparison of the key's content, read as a
/// NUL-terminated string.
#[derive(Copy, Clone, Debug, Default)]
pub struct NulTerminatedEq;

impl<K> KeyEquals<K> for NulTerminatedEq
where
    K: ?Sized + AsRef<[u8]>,
{
    #[inline]
    fn keys_equal(&self, a: &K, b: &K) -> bool {
        until_nul(a.as_ref()) == until_nul(b.as_ref())
    }
}

/// Default hasher used by `TinyHash::new`.
///
/// Hashes the same NUL-truncated bytes `NulTerminatedEq` compares, using
/// hashbrown's default build-hasher, and folds the 64-bit result into 32
/// bits. Seeds are per instance, so hashes are not stable across tables or
/// processes.
#[derive(Clone, Default)]
pub struct DefaultKeyHasher {
    build: DefaultHashBuilder,
}

impl DefaultKeyHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<K> KeyHasher<K> for DefaultKeyHasher
where
    K: ?Sized + AsRef<[u8]>,
{
    #[inline]
    fn hash_key(&self, key: &K) -> u32 {
        let h = self.build.hash_one(until_nul(key.as_ref()));
        (h ^ (h >> 32)) as u32
    }
}

impl core::fmt::Debug for DefaultKeyHasher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DefaultKeyHasher")
    }
}
