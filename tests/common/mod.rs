//! Shared fixtures for integration tests

#![allow(dead_code)]

use block_miner::serialization::{compute_txid, serialize_transaction};
use block_miner::types::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

pub const TEST_KEY: &str = "39dc0a9f0b185a2ee56349691f34716e6e0cda06a7f9707742ac113c4e2317bf";

/// 1 in 256 header hashes satisfy this target
pub fn easy_target_hex() -> String {
    format!("00ffff{}", "00".repeat(29))
}

/// One-input, one-output spend; segwit spends carry a two-element witness
pub fn create_spend(seed: u8, output_value: Natural, segwit: bool) -> Transaction {
    Transaction {
        version: 2,
        inputs: vec![TransactionInput {
            prevout: OutPoint {
                hash: [seed; 32],
                index: seed as u32,
            },
            script_sig: if segwit { vec![] } else { vec![0x51] },
            sequence: 0xfffffffd,
            witness: if segwit {
                vec![vec![seed; 71], vec![0x02; 33]]
            } else {
                vec![]
            },
        }],
        outputs: vec![TransactionOutput {
            value: output_value,
            script_pubkey: vec![0x00, 0x14, seed, seed, seed, seed],
        }],
        lock_time: 0,
    }
}

/// Pool entry JSON for `tx` with the given declared prevout values, fee and weight
pub fn create_entry(
    tx: &Transaction,
    input_values: &[Natural],
    fee: Natural,
    weight: Natural,
) -> Value {
    json!({
        "txid": to_display_hex(&compute_txid(tx)),
        "version": tx.version,
        "locktime": tx.lock_time,
        "hex": hex::encode(serialize_transaction(tx)),
        "fee": fee,
        "weight": weight,
        "vin": input_values
            .iter()
            .map(|value| json!({ "prevout": { "value": value } }))
            .collect::<Vec<_>>(),
        "vout": tx
            .outputs
            .iter()
            .map(|output| json!({ "value": output.value }))
            .collect::<Vec<_>>(),
    })
}

pub fn write_entry(dir: &Path, name: &str, entry: &Value) {
    fs::write(dir.join(name), entry.to_string()).unwrap();
}

/// A balanced record for `tx`: one prevout worth outputs + fee
pub fn create_record(tx: Transaction, fee: Natural, weight: Natural) -> TransactionRecord {
    let outputs: Vec<Natural> = tx.outputs.iter().map(|o| o.value).collect();
    let txid = compute_txid(&tx);
    TransactionRecord {
        txid,
        wtxid: block_miner::serialization::compute_wtxid(&tx),
        input_values: vec![outputs.iter().sum::<Natural>() + fee],
        output_values: outputs,
        fee,
        weight,
        raw: serialize_transaction(&tx),
        transaction: tx,
    }
}
