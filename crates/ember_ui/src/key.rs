//! Box identity: key derivation and the cross-frame key cache.
//!
//! A box's key is a 32-bit hash of its identity text. By default the
//! identity is the declared text itself; a `"display###identity"` form
//! hashes only the part after the delimiter, so visible text and identity
//! can differ (two labels reading "Close" with distinct identities, or a
//! label that changes every frame while keeping one identity).
//!
//! The cache is a fixed array of buckets, each an intrusive doubly-linked
//! list threaded through the boxes' `hash_next`/`hash_prev` fields. It maps
//! a key to the most recently declared box carrying it, which is what lets
//! per-identity state survive the full per-frame tree rebuild.

use crate::tree::BoxId;

/// Delimiter separating display text from identity text.
pub const KEY_DELIMITER: &str = "###";

/// Default number of key-cache buckets.
pub const DEFAULT_KEY_BUCKETS: usize = 128;

/// A box identity key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BoxKey {
    /// 32-bit hash of the identity text.
    pub hash: u32,
}

impl BoxKey {
    /// Creates a key from a raw hash.
    #[must_use]
    pub const fn new(hash: u32) -> Self {
        Self { hash }
    }
}

/// Hash function behind box keys.
///
/// Swappable so collision behavior can be tested deterministically with a
/// degenerate hasher.
pub trait KeyHasher {
    /// Hashes an identity byte string to a 32-bit key.
    fn hash_identity(&self, identity: &[u8]) -> u32;
}

/// The default hasher: reflected CRC-32, computed bitwise.
///
/// Cheap, dependency-free, and stable across runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32Hasher;

impl KeyHasher for Crc32Hasher {
    fn hash_identity(&self, identity: &[u8]) -> u32 {
        let mut crc = u32::MAX;
        for &byte in identity {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }
}

/// Splits declared text into `(display, identity)`.
///
/// Without the delimiter both halves are the whole text. An empty identity
/// segment (text ending in the bare delimiter) falls back to hashing the
/// full declared text, which keeps the key deterministic instead of
/// colliding every such box onto the empty hash.
#[must_use]
pub fn split_text(text: &str) -> (&str, &str) {
    match text.split_once(KEY_DELIMITER) {
        Some((display, identity)) if !identity.is_empty() => (display, identity),
        Some((display, _)) => {
            tracing::warn!(text, "empty identity after key delimiter; using full text");
            (display, text)
        }
        None => (text, text),
    }
}

/// Fixed-size bucket array for the key cache.
///
/// Stores only the bucket heads; list links live in the boxes themselves.
#[derive(Debug)]
pub struct KeyMap {
    buckets: Vec<Option<BoxId>>,
}

impl KeyMap {
    /// Creates a map with `bucket_count` buckets (at least one).
    #[must_use]
    pub fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![None; bucket_count.max(1)],
        }
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the bucket index for a key.
    #[must_use]
    pub fn bucket_of(&self, key: BoxKey) -> usize {
        key.hash as usize % self.buckets.len()
    }

    /// Returns the head of a bucket's list.
    #[must_use]
    pub fn head(&self, bucket: usize) -> Option<BoxId> {
        self.buckets[bucket]
    }

    /// Replaces the head of a bucket's list.
    pub fn set_head(&mut self, bucket: usize, head: Option<BoxId>) {
        self.buckets[bucket] = head;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_check_value() {
        // Standard CRC-32 check input.
        assert_eq!(Crc32Hasher.hash_identity(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_crc32_distinguishes_identities() {
        let a = Crc32Hasher.hash_identity(b"panel_a");
        let b = Crc32Hasher.hash_identity(b"panel_b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_split_without_delimiter() {
        assert_eq!(split_text("Close"), ("Close", "Close"));
    }

    #[test]
    fn test_split_with_delimiter() {
        assert_eq!(split_text("Close###dialog_close"), ("Close", "dialog_close"));
    }

    #[test]
    fn test_split_hidden_display() {
        // Identity-only boxes show nothing but still track state.
        assert_eq!(split_text("###spacer_1"), ("", "spacer_1"));
    }

    #[test]
    fn test_split_empty_identity_falls_back_to_full_text() {
        let (display, identity) = split_text("Close###");
        assert_eq!(display, "Close");
        assert_eq!(identity, "Close###");
    }

    #[test]
    fn test_bucket_of_is_modular() {
        let map = KeyMap::new(8);
        assert_eq!(map.bucket_of(BoxKey::new(3)), 3);
        assert_eq!(map.bucket_of(BoxKey::new(11)), 3);
        assert_eq!(map.bucket_of(BoxKey::new(8)), 0);
    }

    #[test]
    fn test_bucket_count_clamps_to_one() {
        let map = KeyMap::new(0);
        assert_eq!(map.bucket_count(), 1);
    }
}
