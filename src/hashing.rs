//! Hash utilities for formatting fingerprints and comparison keys.
//!
//! Provides the consistent hashing used to derive run-format fingerprints and
//! the paragraph/word keys the coarse diff passes align on.

use std::hash::{Hash, Hasher};
use xxhash_rust::xxh64::Xxh64;

use crate::document::RunFormat;

pub(crate) const XXH64_SEED: u64 = 0;
const HASH_MIX_CONSTANT: u64 = 0x9e3779b97f4a7c15;

/// Fingerprint of a run's effective formatting. Used to prefer matches with
/// consistent formatting; never part of content equality.
pub(crate) fn format_fingerprint(format: &RunFormat) -> u64 {
    let mut hasher = Xxh64::new(XXH64_SEED);
    format.bold.hash(&mut hasher);
    format.italic.hash(&mut hasher);
    format.underline.hash(&mut hasher);
    format.style.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn hash_key_str(s: &str) -> u64 {
    let mut hasher = Xxh64::new(XXH64_SEED);
    s.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn mix_hash(hash: u64) -> u64 {
    hash.rotate_left(13) ^ HASH_MIX_CONSTANT
}

pub(crate) fn combine_hashes(current: u64, contribution: u64) -> u64 {
    current.rotate_left(5).wrapping_add(mix_hash(contribution))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_distinguishes_formatting() {
        let plain = RunFormat::default();
        let bold = RunFormat {
            bold: true,
            ..RunFormat::default()
        };
        assert_ne!(format_fingerprint(&plain), format_fingerprint(&bold));
        assert_eq!(format_fingerprint(&plain), format_fingerprint(&plain));
    }

    #[test]
    fn combine_is_order_sensitive() {
        let a = hash_key_str("alpha");
        let b = hash_key_str("beta");
        let ab = combine_hashes(combine_hashes(0, a), b);
        let ba = combine_hashes(combine_hashes(0, b), a);
        assert_ne!(ab, ba);
    }
}
