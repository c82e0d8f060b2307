//! Digest helpers shared by blocks, validation and mining.

use sha2::{Digest, Sha256};

use crate::constants::{HASH_BITS, HASH_HEX_SIZE};

/// SHA-256 of `bytes`, rendered as 64 lowercase hex characters.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// True for exactly 64 lowercase hex characters.
pub fn is_hex_digest(s: &str) -> bool {
    s.len() == HASH_HEX_SIZE && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

pub fn count_leading_zero_bits(hash: &[u8]) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Whether the binary expansion of `hash_hex` starts with `difficulty` zero bits.
///
/// Difficulty 0 always succeeds. A string that is not a hex digest never meets
/// a non-zero difficulty.
pub fn meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    if difficulty == 0 {
        return true;
    }
    if difficulty > HASH_BITS || !is_hex_digest(hash_hex) {
        return false;
    }
    match hex::decode(hash_hex) {
        Ok(bytes) => count_leading_zero_bits(&bytes) >= difficulty,
        Err(_) => false,
    }
}
