// Copyright (c) 2025 EmbeDB Contributors
// Licensed under the EmbeDB License. See LICENSE file for details.

//! Stable 64-bit key hashing.
//!
//! Keys are never persisted; only their FNV-1a hash is. The hash must
//! therefore produce the same value for the same key on every platform
//! and in every release, or existing cache files become unreadable.
//! FNV-1a over the UTF-8 bytes of the key satisfies that: it is fully
//! specified by two constants and has no per-process seed.
//!
//! Collisions are treated as identity at the store level: two keys that
//! hash to the same value are the same cache entry. At 64 bits this is
//! an accepted risk for cache-sized data sets.

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashes a text key to the stable 64-bit value used on disk.
///
/// # Examples
///
/// ```rust
/// use embedb::hash::hash_key;
///
/// // Deterministic across runs and platforms
/// assert_eq!(hash_key("hello"), hash_key("hello"));
/// assert_ne!(hash_key("hello"), hash_key("world"));
/// ```
#[inline]
pub fn hash_key(key: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in key.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_offset_basis() {
        assert_eq!(hash_key(""), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn test_reference_vectors() {
        // Published FNV-1a 64 test vectors.
        assert_eq!(hash_key("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(hash_key("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn test_distinct_keys_distinct_hashes() {
        assert_ne!(hash_key("hello"), hash_key("hello "));
        assert_ne!(hash_key("abc"), hash_key("acb"));
    }

    #[test]
    fn test_multibyte_keys() {
        // Hashing runs over UTF-8 bytes, so non-ASCII keys are fine.
        assert_ne!(hash_key("café"), hash_key("cafe"));
        assert_eq!(hash_key("日本語"), hash_key("日本語"));
    }
}
