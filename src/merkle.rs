//! Merkle tree construction over transaction identifiers

use crate::error::{MinerError, Result};
use crate::hash::sha256d;
use crate::types::Hash;

fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut combined = [0u8; 64];
    combined[..32].copy_from_slice(left);
    combined[32..].copy_from_slice(right);
    sha256d(&combined)
}

/// ComputeMerkleRoot: ℍ* → ℍ
///
/// Pairwise SHA256d reduction. A level of odd length duplicates its last
/// element before pairing, so a single leaf hashes with itself once.
pub fn compute_merkle_root(leaves: &[Hash]) -> Result<Hash> {
    if leaves.is_empty() {
        return Err(MinerError::EmptyMerkleTree);
    }

    let mut level = leaves.to_vec();
    loop {
        let next: Vec<Hash> = level
            .chunks(2)
            .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
            .collect();

        if next.len() == 1 {
            return Ok(next[0]);
        }
        level = next;
    }
}
