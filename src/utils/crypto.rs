// src/utils/crypto.rs
//! Hashing utilities for Sui compatibility.
//!
//! Sui uses Blake2b with a 256-bit output both for deriving account addresses
//! and for the digest that transaction signatures commit to.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// Computes a Blake2b-256 hash of the concatenation of `parts`.
///
/// # Arguments
/// * `parts` - Byte slices hashed in order, as if they were one buffer
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts_hash_like_one_buffer() {
        assert_eq!(hash_data(&[b"hello ", b"world"]), hash_data(&[b"hello world"]));
    }

    #[test]
    fn test_empty_input_vector() {
        // Blake2b-256 of the empty string
        assert_eq!(
            hex::encode(hash_data(&[])),
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }
}
