//! Proof-of-work nonce search
//!
//! The search is a bounded scan over the 32-bit nonce space that always ends
//! with an explicit signal: a satisfying nonce was found, the range was
//! exhausted, or the caller cancelled. Callers decide what to do on
//! exhaustion; [`Miner`] can bump the header timestamp and scan again.

use crate::constants::{BLOCK_HEADER_SIZE, CANCEL_CHECK_INTERVAL, NONCE_SPACE};
use crate::difficulty::{bits_to_target, hash_meets_target};
use crate::error::{MinerError, Result};
use crate::hash::sha256d;
use crate::serialization::{calculate_block_hash, serialize_header};
use crate::types::*;
use primitive_types::U256;
use serde::Deserialize;
use std::ops::Range;
use std::panic;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Shared flag that stops every search holding a clone of it
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a nonce search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningOutcome {
    Found { nonce: u32, hash: Hash, attempts: u64 },
    Exhausted { attempts: u64 },
    Cancelled { attempts: u64 },
}

impl MiningOutcome {
    pub fn attempts(&self) -> u64 {
        match self {
            MiningOutcome::Found { attempts, .. }
            | MiningOutcome::Exhausted { attempts }
            | MiningOutcome::Cancelled { attempts } => *attempts,
        }
    }
}

/// What to do when a scan exhausts its nonce range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryStrategy {
    /// Surface exhaustion as an error
    Fail,
    /// Advance the timestamp by one second and scan again
    BumpTimestamp { max_retries: u32 },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::BumpTimestamp { max_retries: 16 }
    }
}

/// CheckProofOfWork: ℋ → {true, false}
///
/// SHA256d(header), read as a little-endian integer, must not exceed the
/// target expanded from `header.bits`.
pub fn check_proof_of_work(header: &BlockHeader) -> Result<bool> {
    let target = bits_to_target(header.bits)?;
    Ok(hash_meets_target(&calculate_block_hash(header), &target))
}

fn search_target(header: &BlockHeader) -> Result<U256> {
    let target = bits_to_target(header.bits)?;
    if target.is_zero() {
        return Err(MinerError::InvalidTarget(format!(
            "compact bits {:#010x} expand to a zero target",
            header.bits
        )));
    }
    Ok(target)
}

/// Scan `range` of nonces, polling `should_stop` every CANCEL_CHECK_INTERVAL attempts
fn scan(
    header: &BlockHeader,
    range: Range<u64>,
    target: &U256,
    should_stop: &dyn Fn() -> bool,
) -> MiningOutcome {
    let mut bytes: [u8; BLOCK_HEADER_SIZE] = serialize_header(header);
    let mut attempts = 0u64;

    for nonce in range {
        if attempts % CANCEL_CHECK_INTERVAL == 0 && should_stop() {
            return MiningOutcome::Cancelled { attempts };
        }

        let nonce = nonce as u32;
        bytes[76..80].copy_from_slice(&nonce.to_le_bytes());
        let hash = sha256d(&bytes);
        attempts += 1;

        if hash_meets_target(&hash, target) {
            return MiningOutcome::Found {
                nonce,
                hash,
                attempts,
            };
        }
    }

    MiningOutcome::Exhausted { attempts }
}

/// MineBlock: ℋ → ℕ
///
/// Linear scan of the whole nonce space from zero on the calling thread.
pub fn mine(header: &BlockHeader) -> Result<MiningOutcome> {
    mine_range(header, 0..NONCE_SPACE, &CancelToken::new())
}

/// Scan a sub-range of the nonce space; `range` is clamped to [0, 2^32)
pub fn mine_range(
    header: &BlockHeader,
    range: Range<u64>,
    cancel: &CancelToken,
) -> Result<MiningOutcome> {
    let target = search_target(header)?;
    let range = range.start.min(NONCE_SPACE)..range.end.min(NONCE_SPACE);
    Ok(scan(header, range, &target, &|| cancel.is_cancelled()))
}

/// Scan `[0, limit)` with `workers` threads over disjoint contiguous ranges.
/// The first worker to find a nonce stops the others.
pub fn mine_parallel(
    header: &BlockHeader,
    workers: usize,
    limit: u64,
    cancel: &CancelToken,
) -> Result<MiningOutcome> {
    let target = search_target(header)?;
    let workers = workers.max(1) as u64;
    let limit = limit.min(NONCE_SPACE);
    let found = AtomicBool::new(false);

    debug!(workers, limit, "Starting parallel nonce search");

    let outcomes = run_workers(limit, workers, |worker, range| {
        let stop = || found.load(Ordering::Relaxed) || cancel.is_cancelled();
        let outcome = scan(header, range, &target, &stop);
        if let MiningOutcome::Found { nonce, .. } = outcome {
            found.store(true, Ordering::Relaxed);
            debug!(worker, nonce, "Worker found a nonce");
        }
        outcome
    });

    let attempts: u64 = outcomes.iter().map(MiningOutcome::attempts).sum();
    let winner = outcomes.into_iter().find_map(|outcome| match outcome {
        MiningOutcome::Found { nonce, hash, .. } => Some((nonce, hash)),
        _ => None,
    });

    Ok(match winner {
        Some((nonce, hash)) => MiningOutcome::Found {
            nonce,
            hash,
            attempts,
        },
        None if cancel.is_cancelled() => MiningOutcome::Cancelled { attempts },
        None => MiningOutcome::Exhausted { attempts },
    })
}

/// Run `work` on one scoped thread per contiguous slice of `[0, limit)`.
/// A panicking worker re-raises its panic on the calling thread.
fn run_workers<F>(limit: u64, workers: u64, work: F) -> Vec<MiningOutcome>
where
    F: Fn(u64, Range<u64>) -> MiningOutcome + Sync,
{
    let chunk = (limit + workers - 1) / workers;
    let work = &work;

    thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let start = (worker * chunk).min(limit);
                let end = (start + chunk).min(limit);
                scope.spawn(move || work(worker, start..end))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|payload| panic::resume_unwind(payload)))
            .collect()
    })
}

/// Nonce search driver with a worker count and an exhaustion policy
#[derive(Debug, Clone)]
pub struct Miner {
    workers: usize,
    nonce_limit: u64,
    retry: RetryStrategy,
}

impl Default for Miner {
    fn default() -> Self {
        Self {
            workers: 1,
            nonce_limit: NONCE_SPACE,
            retry: RetryStrategy::default(),
        }
    }
}

impl Miner {
    pub fn new(workers: usize, retry: RetryStrategy) -> Self {
        Self {
            workers: workers.max(1),
            nonce_limit: NONCE_SPACE,
            retry,
        }
    }

    /// Only scan nonces below `limit` on each attempt
    pub fn with_nonce_limit(mut self, limit: u64) -> Self {
        self.nonce_limit = limit.min(NONCE_SPACE);
        self
    }

    fn search(&self, header: &BlockHeader, cancel: &CancelToken) -> Result<MiningOutcome> {
        if self.workers == 1 {
            mine_range(header, 0..self.nonce_limit, cancel)
        } else {
            mine_parallel(header, self.workers, self.nonce_limit, cancel)
        }
    }

    /// Search until a nonce is found, retrying on exhaustion per the strategy.
    /// On success `header.nonce` holds the winning nonce. Never returns
    /// `Exhausted`: running out of retries is `MinerError::NonceSpaceExhausted`.
    pub fn run(&self, header: &mut BlockHeader, cancel: &CancelToken) -> Result<MiningOutcome> {
        let mut total_attempts = 0u64;
        let mut retries = 0u32;

        loop {
            match self.search(header, cancel)? {
                MiningOutcome::Found { nonce, hash, attempts } => {
                    total_attempts += attempts;
                    header.nonce = nonce;
                    info!(
                        nonce,
                        attempts = total_attempts,
                        hash = %to_display_hex(&hash),
                        "Found proof of work"
                    );
                    return Ok(MiningOutcome::Found {
                        nonce,
                        hash,
                        attempts: total_attempts,
                    });
                }
                MiningOutcome::Cancelled { attempts } => {
                    total_attempts += attempts;
                    warn!(attempts = total_attempts, "Nonce search cancelled");
                    return Ok(MiningOutcome::Cancelled {
                        attempts: total_attempts,
                    });
                }
                MiningOutcome::Exhausted { attempts } => {
                    total_attempts += attempts;
                    let can_retry = match self.retry {
                        RetryStrategy::BumpTimestamp { max_retries } => retries < max_retries,
                        RetryStrategy::Fail => false,
                    };
                    let bumped = header.timestamp.checked_add(1);

                    match bumped {
                        Some(timestamp) if can_retry => {
                            retries += 1;
                            warn!(
                                retry = retries,
                                timestamp,
                                "Nonce range exhausted, bumping timestamp"
                            );
                            header.timestamp = timestamp;
                            header.nonce = 0;
                        }
                        _ => {
                            return Err(MinerError::NonceSpaceExhausted {
                                attempts: total_attempts,
                            })
                        }
                    }
                }
            }
        }
    }
}

/// Single-threaded search over the full nonce space with `retry` on exhaustion
pub fn mine_with_retry(
    header: &mut BlockHeader,
    retry: RetryStrategy,
    cancel: &CancelToken,
) -> Result<MiningOutcome> {
    Miner::new(1, retry).run(header, cancel)
}
