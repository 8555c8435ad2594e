//! # Block Miner
//!
//! Assembles a candidate Bitcoin block from a pool of pending transactions and
//! searches for a proof-of-work nonce.
//!
//! ## Pipeline
//!
//! - Pool loading: JSON entries are decoded and checked for balance
//! - Selection: first-fit greedy pass under exclusive fee and weight caps
//! - Coinbase: reward output plus BIP141 witness commitment
//! - Assembly: merkle root, compact difficulty bits, timestamp
//! - Mining: nonce search with cancellation and timestamp retry
//!
//! ## Usage
//!
//! ```no_run
//! use block_miner::{BlockMiner, BlockArtifact, CancelToken, MinerConfig, TransactionPool};
//!
//! let config = MinerConfig::default();
//! let miner = BlockMiner::from_config(&config).unwrap();
//! let pool = TransactionPool::load(&config.mempool_dir).unwrap();
//! if let Some(block) = miner.mine_block(&pool, &CancelToken::new()).unwrap() {
//!     BlockArtifact::from_block(&block).write_to(&config.output).unwrap();
//! }
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod hash;
pub mod serialization;
pub mod difficulty;
pub mod merkle;
pub mod script;
pub mod coinbase;
pub mod mempool;
pub mod selection;
pub mod block;
pub mod mining;
pub mod output;
pub mod config;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{MinerError, Result};
pub use block::{AssembledBlock, BlockAssembler, Clock, FixedClock, SystemClock};
pub use coinbase::{Coinbase, CoinbaseBuilder, MinerKey};
pub use config::MinerConfig;
pub use mempool::{LoadReport, TransactionPool, ValidRecord};
pub use mining::{CancelToken, Miner, MiningOutcome, RetryStrategy};
pub use output::BlockArtifact;
pub use selection::{SelectionPolicy, SelectionState};

use primitive_types::U256;
use tracing::{info, warn};

/// Runs the whole pipeline from a loaded pool to a mined block
#[derive(Debug, Clone)]
pub struct BlockMiner<C: Clock = SystemClock> {
    policy: SelectionPolicy,
    coinbase: CoinbaseBuilder,
    assembler: BlockAssembler<C>,
    miner: Miner,
    target: U256,
    prev_block_hash: Hash,
}

impl BlockMiner<SystemClock> {
    pub fn from_config(config: &MinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            policy: config.selection_policy(),
            coinbase: CoinbaseBuilder::new(&config.miner_key()?),
            assembler: BlockAssembler::new(config.block_version),
            miner: Miner::new(config.workers, config.retry),
            target: config.target()?,
            prev_block_hash: config.prev_block_hash()?,
        })
    }
}

impl<C: Clock> BlockMiner<C> {
    /// Swap the header clock
    pub fn with_clock<D: Clock>(self, clock: D) -> BlockMiner<D> {
        BlockMiner {
            policy: self.policy,
            coinbase: self.coinbase,
            assembler: BlockAssembler::with_clock(self.assembler.version(), clock),
            miner: self.miner,
            target: self.target,
            prev_block_hash: self.prev_block_hash,
        }
    }

    pub fn with_miner(mut self, miner: Miner) -> Self {
        self.miner = miner;
        self
    }

    pub fn target(&self) -> &U256 {
        &self.target
    }

    pub fn select(&self, pool: &TransactionPool) -> SelectionState {
        selection::select_with_policy(pool.records(), &self.policy)
    }

    /// Select, build the coinbase and fill in the header; the nonce is left at zero
    pub fn assemble(&self, pool: &TransactionPool) -> Result<AssembledBlock> {
        let state = self.select(pool);
        if state.is_empty() {
            warn!(
                candidates = pool.len(),
                "No transactions selected, block holds only the coinbase"
            );
        }

        let (transactions, coinbase) = self.coinbase.build(state.fee(), state.transactions())?;
        let block = self.assembler.assemble(
            transactions,
            coinbase.witness_commitment,
            &self.target,
            self.prev_block_hash,
        )?;

        info!(
            transactions = block.transactions.len(),
            fee = state.fee(),
            weight = state.weight(),
            coinbase_weight = serialization::transaction_weight(block.coinbase()),
            "Candidate block assembled"
        );
        Ok(block)
    }

    /// Assemble and search for a nonce. Returns `None` if `cancel` fired first.
    ///
    /// Running out of nonces is always an error, never `None`.
    pub fn mine_block(
        &self,
        pool: &TransactionPool,
        cancel: &CancelToken,
    ) -> Result<Option<AssembledBlock>> {
        let mut block = self.assemble(pool)?;
        match self.miner.run(&mut block.header, cancel)? {
            MiningOutcome::Found { .. } => Ok(Some(block)),
            MiningOutcome::Cancelled { .. } => Ok(None),
            MiningOutcome::Exhausted { attempts } => {
                Err(MinerError::NonceSpaceExhausted { attempts })
            }
        }
    }
}
