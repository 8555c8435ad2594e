//! Block header assembly

use crate::difficulty::target_to_bits;
use crate::error::{MinerError, Result};
use crate::merkle::compute_merkle_root;
use crate::serialization::compute_txid;
use crate::types::*;
use primitive_types::U256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Source of header timestamps
pub trait Clock {
    /// Seconds since the Unix epoch
    fn now(&self) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs().min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    }
}

/// Always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn now(&self) -> u32 {
        self.0
    }
}

/// A block ready for the nonce search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledBlock {
    pub header: BlockHeader,
    /// Coinbase first
    pub transactions: Vec<Transaction>,
    pub witness_commitment: Hash,
}

impl AssembledBlock {
    pub fn coinbase(&self) -> &Transaction {
        &self.transactions[0]
    }

    /// Non-witness txids in block order
    pub fn txids(&self) -> Vec<Hash> {
        self.transactions.iter().map(compute_txid).collect()
    }
}

/// Fills in every header field except the nonce
#[derive(Debug, Clone)]
pub struct BlockAssembler<C: Clock = SystemClock> {
    version: i32,
    clock: C,
}

impl BlockAssembler<SystemClock> {
    pub fn new(version: i32) -> Self {
        Self::with_clock(version, SystemClock)
    }
}

impl<C: Clock> BlockAssembler<C> {
    pub fn with_clock(version: i32, clock: C) -> Self {
        Self { version, clock }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// Assemble: 𝒯𝒳* × ℍ × U256 × ℍ → ℬ
    pub fn assemble(
        &self,
        transactions: Vec<Transaction>,
        witness_commitment: Hash,
        target: &U256,
        prev_block_hash: Hash,
    ) -> Result<AssembledBlock> {
        if target.is_zero() {
            return Err(MinerError::InvalidTarget("target must be non-zero".to_string()));
        }

        let txids: Vec<Hash> = transactions.iter().map(compute_txid).collect();
        let merkle_root = compute_merkle_root(&txids)?;

        let header = BlockHeader {
            version: self.version,
            prev_block_hash,
            merkle_root,
            timestamp: self.clock.now(),
            bits: target_to_bits(target),
            nonce: 0,
        };

        debug!(
            transactions = transactions.len(),
            merkle_root = %to_display_hex(&merkle_root),
            bits = %format!("{:#010x}", header.bits),
            "Block assembled"
        );

        Ok(AssembledBlock {
            header,
            transactions,
            witness_commitment,
        })
    }
}
