//! Compact-difficulty (`nBits`) encoding and nonce search.
//!
//! `nBits` packs a 256-bit target into 32 bits the way Bitcoin does:
//! the high byte is an exponent, the low 24 bits a coefficient, and
//! `target = coefficient * 256^(exponent - 3)`.

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use crate::error::{Result, SsamError};

/// Ceiling on the nonce search space (spec §4.1).
pub const MAX_NONCE: u64 = u32::MAX as u64;

/// The network's default target when a block is built without an
/// explicit `nbits`: a 256-bit value with five leading zero hex
/// digits (`0x00000FFFF0…0`), matching the original's `MAX_TARGET`.
pub const DEFAULT_TARGET_HEX: &str =
    "00000FFFF0000000000000000000000000000000000000000000000000000000";

pub fn default_target() -> BigUint {
    BigUint::from_str_radix(DEFAULT_TARGET_HEX, 16).expect("DEFAULT_TARGET_HEX is valid hex")
}

pub fn default_nbits() -> String {
    target_to_nbits(&default_target())
}

/// A block header that proof-of-work can be run over: a mutable nonce,
/// the compact difficulty it must satisfy, and its own content hash.
pub trait Minable {
    fn nonce(&self) -> u64;
    fn set_nonce(&mut self, nonce: u64);
    fn nbits(&self) -> &str;
    fn compute_hash(&self) -> String;
}

/// Encodes a 256-bit `target` into the 8-hex-digit, `0x`-prefixed
/// compact form.
pub fn target_to_nbits(target: &BigUint) -> String {
    let mut bytes = target.to_bytes_be();
    while bytes.first() == Some(&0) && bytes.len() > 1 {
        bytes.remove(0);
    }
    if target.is_zero() {
        bytes.clear();
    }

    let mut exponent = bytes.len() as u32;
    let mut coeff_bytes = [0u8; 3];
    let take = bytes.len().min(3);
    coeff_bytes[3 - take..].copy_from_slice(&bytes[..take]);
    let mut coefficient = u32::from_be_bytes([0, coeff_bytes[0], coeff_bytes[1], coeff_bytes[2]]);

    if coefficient >= 0x007F_FFFF {
        coefficient >>= 8;
        exponent += 1;
    }

    let nbits = (exponent << 24) | coefficient;
    format!("0x{:08x}", nbits)
}

/// Parses an `nbits` value (hex string, with or without `0x` prefix,
/// or a raw integer) back into a 256-bit target.
pub fn nbits_to_target(nbits: &str) -> Result<BigUint> {
    let trimmed = nbits.trim_start_matches("0x").trim_start_matches("0X");
    let parsed = u32::from_str_radix(trimmed, 16)
        .map_err(|e| SsamError::Validation(format!("malformed nbits '{}': {}", nbits, e)))?;
    Ok(nbits_u32_to_target(parsed))
}

pub fn nbits_u32_to_target(nbits: u32) -> BigUint {
    let exponent = (nbits >> 24) & 0xFF;
    let coefficient = BigUint::from(nbits & 0x00FF_FFFF);
    if exponent >= 3 {
        coefficient * BigUint::from(256u32).pow(exponent - 3)
    } else {
        coefficient / BigUint::from(256u32).pow(3 - exponent)
    }
}

/// Hex digest, read as an unsigned big-endian integer, compared
/// against `target`.
fn hash_as_int(hash_hex: &str) -> Result<BigUint> {
    BigUint::from_str_radix(hash_hex, 16)
        .map_err(|e| SsamError::Validation(format!("malformed hash '{}': {}", hash_hex, e)))
}

/// `int(block.compute_hash(), 16) < target`.
pub fn is_valid_proof<B: Minable>(block: &B, target: &BigUint) -> Result<bool> {
    Ok(&hash_as_int(&block.compute_hash())? < target)
}

/// Searches for a nonce starting from `block`'s current value, mutating
/// it in place as the search proceeds. Returns the winning nonce, or
/// `None` if the search exhausts [`MAX_NONCE`] first.
pub fn find_valid_nonce<B: Minable>(block: &mut B) -> Result<Option<u64>> {
    let target = nbits_to_target(block.nbits())?;
    loop {
        if block.nonce() >= MAX_NONCE {
            return Ok(None);
        }
        if is_valid_proof(block, &target)? {
            return Ok(Some(block.nonce()));
        }
        block.set_nonce(block.nonce() + 1);
    }
}
