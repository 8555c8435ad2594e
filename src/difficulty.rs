//! Compact difficulty encoding ("nBits")
//!
//! A target T is encoded as `exponent << 24 | coefficient`, where `exponent` is
//! the byte length of T and `coefficient` its three most significant bytes.
//! Bit 23 of the compact form is a sign bit, so a coefficient with its top bit
//! set is shifted down one byte and the exponent grows by one.

use crate::error::{MinerError, Result};
use crate::types::Hash;
use primitive_types::U256;

const SIGN_BIT: u32 = 0x0080_0000;
const COEFFICIENT_MASK: u32 = 0x007f_ffff;

/// TargetToBits: U256 → u32
///
/// `target == 0` encodes to 0; such a target can never be mined against.
pub fn target_to_bits(target: &U256) -> u32 {
    let mut exponent = 0usize;
    let mut remaining = *target;
    while !remaining.is_zero() {
        remaining = remaining >> 8usize;
        exponent += 1;
    }

    let mut coefficient = if exponent >= 3 {
        (*target >> (8 * (exponent - 3))).low_u32()
    } else {
        (*target << (8 * (3 - exponent))).low_u32()
    };

    if coefficient & SIGN_BIT != 0 {
        coefficient >>= 8;
        exponent += 1;
    }

    ((exponent as u32) << 24) | (coefficient & COEFFICIENT_MASK)
}

/// BitsToTarget: u32 → U256
///
/// Expands the compact form to `coefficient * 256^(exponent - 3)`.
pub fn bits_to_target(bits: u32) -> Result<U256> {
    let exponent = (bits >> 24) as usize;
    let coefficient = bits & COEFFICIENT_MASK;

    if bits & SIGN_BIT != 0 && coefficient != 0 {
        return Err(MinerError::InvalidTarget(format!(
            "compact bits {:#010x} encode a negative target",
            bits
        )));
    }

    if exponent <= 3 {
        return Ok(U256::from(coefficient >> (8 * (3 - exponent))));
    }

    let shift = 8 * (exponent - 3);
    let significant_bits = (32 - coefficient.leading_zeros()) as usize;
    if coefficient != 0 && significant_bits + shift > 256 {
        return Err(MinerError::InvalidTarget(format!(
            "compact bits {:#010x} overflow 256 bits",
            bits
        )));
    }

    Ok(U256::from(coefficient) << shift)
}

/// Parse a big-endian hex target of at most 64 digits
pub fn parse_target_hex(s: &str) -> Result<U256> {
    let digits = s.trim().trim_start_matches("0x");
    if digits.is_empty() || digits.len() > 64 {
        return Err(MinerError::InvalidTarget(format!(
            "expected 1 to 64 hex digits, got {}",
            digits.len()
        )));
    }
    let padded = format!("{:0>64}", digits);
    let bytes = hex::decode(padded)?;
    Ok(U256::from_big_endian(&bytes))
}

/// Render a target as 64 big-endian hex digits
pub fn target_to_hex(target: &U256) -> String {
    let mut bytes = [0u8; 32];
    target.to_big_endian(&mut bytes);
    hex::encode(bytes)
}

/// Interpret a header hash as a little-endian 256-bit integer
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_little_endian(hash)
}

/// Proof-of-work predicate: hash ≤ target
pub fn hash_meets_target(hash: &Hash, target: &U256) -> bool {
    hash_to_u256(hash) <= *target
}
