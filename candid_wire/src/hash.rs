// Copyright 2026 the Candid Wire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Field-label hashing.
//!
//! Named record and variant labels travel on the wire as a 32-bit hash of
//! the name: `h = 0; for byte in name { h = h * 223 + byte }`, all modulo
//! 2^32. Numeric labels use the number itself, so a name and a number that
//! collide denote the same field.

/// Hashes a field name to its wire label.
#[must_use]
pub fn field_hash(name: &str) -> u32 {
    let mut h: u32 = 0;
    for &byte in name.as_bytes() {
        h = h.wrapping_mul(223).wrapping_add(u32::from(byte));
    }
    h
}

/// Returns whether `hashes` is strictly ascending, which is the canonical
/// wire order for record and variant fields.
#[must_use]
pub fn is_strictly_ascending(hashes: &[u32]) -> bool {
    hashes.windows(2).all(|pair| pair[0] < pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hashes() {
        // Spot-checked against the definition by hand.
        assert_eq!(field_hash(""), 0);
        assert_eq!(field_hash("a"), 97);
        assert_eq!(field_hash("age"), 4_846_783);
        assert_eq!(field_hash("name"), 1_224_700_491);
        assert_eq!(field_hash("get"), 5_144_726);
        assert_eq!(field_hash("head"), 1_158_359_328);
        assert_eq!(field_hash("post"), 1_247_577_184);
    }

    #[test]
    fn hash_wraps_modulo_2_pow_32() {
        // Long names must not panic in debug builds.
        let long = "a".repeat(1000);
        let _ = field_hash(&long);
    }

    #[test]
    fn ascending_check() {
        assert!(is_strictly_ascending(&[]));
        assert!(is_strictly_ascending(&[7]));
        assert!(is_strictly_ascending(&[1, 2, 9]));
        assert!(!is_strictly_ascending(&[1, 1]));
        assert!(!is_strictly_ascending(&[2, 1]));
    }
}
