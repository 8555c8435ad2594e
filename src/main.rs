//! block-miner: assemble and mine a block from a directory of pool entries

use anyhow::{bail, Context, Result};
use block_miner::difficulty::target_to_hex;
use block_miner::{
    BlockArtifact, BlockMiner, CancelToken, MinerConfig, RetryStrategy, TransactionPool,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Assemble a candidate block from pending transactions and search for a nonce
#[derive(Parser, Debug)]
#[command(name = "block-miner")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of JSON pool entries
    #[arg(short, long)]
    mempool_dir: Option<PathBuf>,

    /// Where to write the mined block
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Difficulty target, big-endian hex
    #[arg(long)]
    target: Option<String>,

    /// Exclusive cap on accumulated fees
    #[arg(long)]
    max_fee: Option<u64>,

    /// Exclusive cap on accumulated weight
    #[arg(long)]
    max_weight: Option<u64>,

    /// Previous block hash, display-order hex
    #[arg(long)]
    prev_block_hash: Option<String>,

    /// Nonce search threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Fail instead of bumping the timestamp when the nonce space runs out
    #[arg(long)]
    no_retry: bool,
}

impl Args {
    fn load_config(&self) -> Result<MinerConfig> {
        let mut config = match &self.config {
            Some(path) => MinerConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => MinerConfig::default(),
        };

        // CLI flags win over the file
        if let Some(dir) = &self.mempool_dir {
            config.mempool_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(target) = &self.target {
            config.target = target.clone();
        }
        if let Some(max_fee) = self.max_fee {
            config.max_fee = max_fee;
        }
        if let Some(max_weight) = self.max_weight {
            config.max_weight = max_weight;
        }
        if let Some(prev) = &self.prev_block_hash {
            config.prev_block_hash = prev.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if self.no_retry {
            config.retry = RetryStrategy::Fail;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = args.load_config()?;

    let miner = BlockMiner::from_config(&config)?;
    info!(
        mempool_dir = %config.mempool_dir.display(),
        target = %target_to_hex(miner.target()),
        workers = config.workers,
        "Starting block miner"
    );

    let pool = TransactionPool::load(&config.mempool_dir).with_context(|| {
        format!("Failed to read pool directory {}", config.mempool_dir.display())
    })?;

    let Some(block) = miner.mine_block(&pool, &CancelToken::new())? else {
        bail!("Nonce search stopped before a block was found");
    };

    BlockArtifact::from_block(&block)
        .write_to(&config.output)
        .with_context(|| format!("Failed to write {}", config.output.display()))?;
    Ok(())
}
