//! Coinbase transaction and witness commitment construction

use crate::constants::*;
use crate::error::{MinerError, Result};
use crate::hash::sha256d;
use crate::merkle::compute_merkle_root;
use crate::script::{extract_witness_commitment, p2pkh_script, push_data, witness_commitment_script};
use crate::serialization::compute_wtxid;
use crate::types::*;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use std::fmt;

/// The miner's secp256k1 key; only its public half is ever published
#[derive(Clone)]
pub struct MinerKey {
    secret: SecretKey,
}

impl MinerKey {
    pub fn from_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|e| MinerError::InvalidKey(format!("secret key is not hex: {}", e)))?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|e| MinerError::InvalidKey(e.to_string()))?;
        Ok(Self { secret })
    }

    /// Compressed SEC1 public key
    pub fn public_key(&self) -> [u8; 33] {
        let secp = Secp256k1::signing_only();
        PublicKey::from_secret_key(&secp, &self.secret).serialize()
    }
}

impl fmt::Debug for MinerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinerKey")
            .field("public_key", &hex::encode(self.public_key()))
            .finish()
    }
}

/// The reward transaction and the commitment it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coinbase {
    pub transaction: Transaction,
    pub witness_commitment: Hash,
}

/// Builds the coinbase paying the accumulated fee to the miner
#[derive(Debug, Clone)]
pub struct CoinbaseBuilder {
    reward_script: ByteString,
}

impl CoinbaseBuilder {
    pub fn new(miner_key: &MinerKey) -> Self {
        Self {
            reward_script: p2pkh_script(&miner_key.public_key()),
        }
    }

    pub fn reward_script(&self) -> &[u8] {
        &self.reward_script
    }

    /// Build: ℕ × 𝒯𝒳* → 𝒯𝒳* × ℍ
    ///
    /// Returns the block transaction list with the coinbase at index 0, and the
    /// coinbase itself.
    pub fn build(
        &self,
        reward_amount: Natural,
        selected: Vec<Transaction>,
    ) -> Result<(Vec<Transaction>, Coinbase)> {
        let mut script_sig = Vec::new();
        push_data(&mut script_sig, &self.reward_script);

        let mut coinbase_tx = Transaction {
            version: COINBASE_TX_VERSION,
            inputs: vec![TransactionInput {
                prevout: OutPoint::null(),
                script_sig,
                sequence: SEQUENCE_FINAL,
                witness: vec![WITNESS_RESERVED_VALUE.to_vec()],
            }],
            outputs: Vec::new(),
            lock_time: 0,
        };

        let mut transactions = Vec::with_capacity(selected.len() + 1);
        transactions.push(coinbase_tx.clone());
        transactions.extend(selected);

        let witness_commitment = compute_witness_commitment(&transactions)?;

        coinbase_tx.outputs.push(TransactionOutput {
            value: reward_amount,
            script_pubkey: self.reward_script.clone(),
        });
        coinbase_tx.outputs.push(TransactionOutput {
            value: 0,
            script_pubkey: witness_commitment_script(&witness_commitment),
        });
        transactions[0] = coinbase_tx.clone();

        Ok((
            transactions,
            Coinbase {
                transaction: coinbase_tx,
                witness_commitment,
            },
        ))
    }
}

/// Witness merkle root: coinbase contributes 32 zero bytes, every other
/// transaction its wtxid.
pub fn compute_witness_root(transactions: &[Transaction]) -> Result<Hash> {
    let wtxids: Vec<Hash> = transactions
        .iter()
        .enumerate()
        .map(|(i, tx)| if i == 0 { [0u8; 32] } else { compute_wtxid(tx) })
        .collect();
    compute_merkle_root(&wtxids)
}

/// SHA256d(witness_root || witness_reserved_value)
pub fn compute_witness_commitment(transactions: &[Transaction]) -> Result<Hash> {
    let root = compute_witness_root(transactions)?;
    let reserved = transactions
        .first()
        .and_then(|cb| cb.inputs.first())
        .and_then(|input| input.witness.first())
        .filter(|element| element.len() == 32)
        .map(|element| element.as_slice())
        .unwrap_or(&WITNESS_RESERVED_VALUE[..]);

    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(&root);
    preimage[32..].copy_from_slice(reserved);
    Ok(sha256d(&preimage))
}

/// Check the commitment carried by the coinbase against the block's transactions
pub fn verify_witness_commitment(transactions: &[Transaction]) -> Result<bool> {
    let coinbase = transactions.first().ok_or(MinerError::EmptyMerkleTree)?;
    let Some(committed) = coinbase
        .outputs
        .iter()
        .rev()
        .find_map(|output| extract_witness_commitment(&output.script_pubkey))
    else {
        return Ok(false);
    };
    Ok(committed == compute_witness_commitment(transactions)?)
}
