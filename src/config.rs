//! Miner configuration
//!
//! Every field has a default, so a TOML file only needs to name what it
//! changes. Values stay in their textual form until [`MinerConfig::validate`]
//! or one of the typed accessors parses them.

use crate::coinbase::MinerKey;
use crate::constants::*;
use crate::difficulty::parse_target_hex;
use crate::error::{MinerError, Result};
use crate::mining::RetryStrategy;
use crate::selection::SelectionPolicy;
use crate::types::*;
use primitive_types::U256;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Difficulty target, big-endian hex
    pub target: String,
    pub max_fee: Natural,
    pub max_weight: Natural,
    /// Weight set aside for the coinbase before selection starts
    pub reserved_weight: Natural,
    pub block_version: i32,
    /// Previous block hash, display-order hex
    pub prev_block_hash: String,
    /// 32-byte secp256k1 secret key, hex
    pub miner_key: String,
    /// Nonce search threads
    pub workers: usize,
    pub retry: RetryStrategy,
    pub mempool_dir: PathBuf,
    pub output: PathBuf,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET_HEX.to_string(),
            max_fee: DEFAULT_MAX_FEE,
            max_weight: DEFAULT_MAX_WEIGHT,
            reserved_weight: DEFAULT_COINBASE_WEIGHT_RESERVE,
            block_version: DEFAULT_BLOCK_VERSION,
            prev_block_hash: "00".repeat(32),
            miner_key: DEFAULT_MINER_KEY_HEX.to_string(),
            workers: 1,
            retry: RetryStrategy::default(),
            mempool_dir: PathBuf::from("mempool"),
            output: PathBuf::from("out.txt"),
        }
    }
}

impl MinerConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| MinerError::Config(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Check every field that can be wrong independently of the pool
    pub fn validate(&self) -> Result<()> {
        if self.target()?.is_zero() {
            return Err(MinerError::Config("target must be non-zero".to_string()));
        }
        if self.workers == 0 {
            return Err(MinerError::Config("workers must be at least 1".to_string()));
        }
        if self.reserved_weight >= self.max_weight {
            return Err(MinerError::Config(format!(
                "reserved weight {} leaves no room under max weight {}",
                self.reserved_weight, self.max_weight
            )));
        }
        self.prev_block_hash()?;
        self.miner_key()?;
        Ok(())
    }

    pub fn target(&self) -> Result<U256> {
        parse_target_hex(&self.target)
    }

    /// Previous block hash in internal byte order
    pub fn prev_block_hash(&self) -> Result<Hash> {
        from_display_hex(self.prev_block_hash.trim()).ok_or_else(|| {
            MinerError::Config(format!(
                "prev_block_hash must be 64 hex digits, got {:?}",
                self.prev_block_hash
            ))
        })
    }

    pub fn miner_key(&self) -> Result<MinerKey> {
        MinerKey::from_hex(&self.miner_key)
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        SelectionPolicy::new(self.max_fee, self.max_weight)
            .with_reserved_weight(self.reserved_weight)
    }
}
