//! Greedy first-fit transaction selection under fee and weight caps

use crate::mempool::ValidRecord;
use crate::types::*;
use tracing::{debug, trace};

/// Budget for a single selection pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    /// Accumulated fee must stay strictly below this
    pub max_fee: Natural,
    /// Accumulated weight must stay strictly below this
    pub max_weight: Natural,
    /// Weight counted before the first record, set aside for the coinbase
    pub reserved_weight: Natural,
}

impl SelectionPolicy {
    pub fn new(max_fee: Natural, max_weight: Natural) -> Self {
        Self {
            max_fee,
            max_weight,
            reserved_weight: 0,
        }
    }

    pub fn with_reserved_weight(mut self, reserved_weight: Natural) -> Self {
        self.reserved_weight = reserved_weight;
        self
    }
}

/// Result of a selection pass; immutable once returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    fee: Natural,
    weight: Natural,
    selected: Vec<ValidRecord>,
}

impl SelectionState {
    pub fn fee(&self) -> Natural {
        self.fee
    }

    pub fn weight(&self) -> Natural {
        self.weight
    }

    pub fn selected(&self) -> &[ValidRecord] {
        &self.selected
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected transactions in acceptance order
    pub fn transactions(&self) -> Vec<Transaction> {
        self.selected.iter().map(|r| r.transaction.clone()).collect()
    }
}

/// Select: 𝒯𝒳* × ℕ × ℕ → SelectionState
pub fn select(pool: &[ValidRecord], max_fee: Natural, max_weight: Natural) -> SelectionState {
    select_with_policy(pool, &SelectionPolicy::new(max_fee, max_weight))
}

/// Single greedy pass in pool order. A record is accepted only if the totals
/// after adding it stay strictly below both caps; otherwise it is skipped and
/// the pass continues with the next record.
pub fn select_with_policy(pool: &[ValidRecord], policy: &SelectionPolicy) -> SelectionState {
    let mut fee: Natural = 0;
    let mut weight: Natural = policy.reserved_weight;
    let mut selected = Vec::new();

    for record in pool {
        let next_fee = fee.checked_add(record.fee);
        let next_weight = weight.checked_add(record.weight);

        match (next_fee, next_weight) {
            (Some(f), Some(w)) if f < policy.max_fee && w < policy.max_weight => {
                fee = f;
                weight = w;
                selected.push(record.clone());
            }
            _ => {
                trace!(
                    txid = %to_display_hex(&record.txid),
                    fee = record.fee,
                    weight = record.weight,
                    "Skipping transaction over budget"
                );
            }
        }
    }

    debug!(
        selected = selected.len(),
        candidates = pool.len(),
        fee,
        weight,
        "Selection pass complete"
    );

    SelectionState {
        fee,
        weight,
        selected,
    }
}
