//! Transaction pool loading and balance validation
//!
//! Pool entries are JSON documents carrying a raw transaction together with
//! precomputed metadata (fee, weight, spent prevout and output values). An
//! entry is accepted into the pool only if its raw form decodes and its
//! declared values balance: Σ vin prevout values = Σ vout values + fee. The
//! declared values are taken as given; they are not re-derived from the raw form.

use crate::error::{MinerError, Result};
use crate::serialization::{compute_txid, compute_wtxid, deserialize_transaction};
use crate::types::*;
use serde::Deserialize;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// On-disk shape of a pool entry; unknown fields are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct PoolEntry {
    /// Informational; the record's txid is computed from `hex`
    #[serde(default)]
    pub txid: String,
    pub hex: String,
    pub fee: Natural,
    pub weight: Natural,
    pub vin: Vec<EntryInput>,
    pub vout: Vec<EntryOutput>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
    pub prevout: EntryPrevout,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryPrevout {
    pub value: Natural,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntryOutput {
    pub value: Natural,
}

impl TryFrom<PoolEntry> for TransactionRecord {
    type Error = MinerError;

    fn try_from(entry: PoolEntry) -> Result<Self> {
        let raw = hex::decode(entry.hex.trim())?;
        let transaction = deserialize_transaction(&raw)?;

        Ok(TransactionRecord {
            txid: compute_txid(&transaction),
            wtxid: compute_wtxid(&transaction),
            input_values: entry.vin.iter().map(|i| i.prevout.value).collect(),
            output_values: entry.vout.iter().map(|o| o.value).collect(),
            fee: entry.fee,
            weight: entry.weight,
            transaction,
            raw,
        })
    }
}

/// A record whose balance invariant has been checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecord(TransactionRecord);

impl ValidRecord {
    pub fn into_inner(self) -> TransactionRecord {
        self.0
    }
}

impl Deref for ValidRecord {
    type Target = TransactionRecord;

    fn deref(&self) -> &TransactionRecord {
        &self.0
    }
}

/// A record whose inputs do not equal its outputs plus fee
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transaction {txid} is invalid: inputs do not balance outputs plus fee")]
pub struct Rejected {
    pub txid: String,
}

/// Validate: Σ inputs = Σ outputs + fee, without overflow
pub fn validate(record: TransactionRecord) -> std::result::Result<ValidRecord, Rejected> {
    let balanced = match (record.total_input_value(), record.total_output_value()) {
        (Some(inputs), Some(outputs)) => outputs
            .checked_add(record.fee)
            .map_or(false, |spent| spent == inputs),
        _ => false,
    };

    if balanced {
        Ok(ValidRecord(record))
    } else {
        Err(Rejected {
            txid: to_display_hex(&record.txid),
        })
    }
}

/// Outcome counts of a pool load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub malformed: usize,
    pub rejected: usize,
}

/// Valid candidate transactions in priority (iteration) order
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    records: Vec<ValidRecord>,
    report: LoadReport,
}

impl TransactionPool {
    /// Build a pool from already-decoded records, dropping unbalanced ones
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = TransactionRecord>,
    {
        let mut pool = TransactionPool::default();
        for record in records {
            pool.admit(record);
        }
        pool
    }

    /// Load every `*.json` entry in `dir`, in file-name order
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();

        let mut pool = TransactionPool::default();
        for path in &paths {
            match read_entry(path) {
                Ok(record) => pool.admit(record),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping malformed pool entry");
                    pool.report.malformed += 1;
                }
            }
        }

        info!(
            dir = %dir.display(),
            loaded = pool.report.loaded,
            malformed = pool.report.malformed,
            rejected = pool.report.rejected,
            "Transaction pool loaded"
        );
        Ok(pool)
    }

    fn admit(&mut self, record: TransactionRecord) {
        match validate(record) {
            Ok(valid) => {
                self.records.push(valid);
                self.report.loaded += 1;
            }
            Err(rejected) => {
                debug!(txid = %rejected.txid, "Rejecting unbalanced transaction");
                self.report.rejected += 1;
            }
        }
    }

    pub fn records(&self) -> &[ValidRecord] {
        &self.records
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_entry(path: &Path) -> Result<TransactionRecord> {
    let contents = fs::read_to_string(path)?;
    let entry: PoolEntry = serde_json::from_str(&contents)?;
    TransactionRecord::try_from(entry)
}
