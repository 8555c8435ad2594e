//! Core block and transaction types

use serde::{Deserialize, Serialize};

/// Hash type: 256-bit hash in internal (little-endian) byte order
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Witness stack of a single input
pub type Witness = Vec<ByteString>;

/// Reference to a previous transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The outpoint a coinbase input spends: zero hash, index 0
    pub fn null() -> Self {
        OutPoint {
            hash: [0u8; 32],
            index: 0,
        }
    }

    /// Zero hash, any index
    pub fn is_null(&self) -> bool {
        self.hash == [0u8; 32]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
    pub witness: Witness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: Natural,
    pub script_pubkey: ByteString,
}

/// A decoded Bitcoin transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// True if any input carries witness data (BIP144 serialization applies)
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_null()
    }
}

/// Block Header: the 80-byte hashed portion of a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

/// A pending transaction together with the metadata the pool entry declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Non-witness transaction id (internal byte order)
    pub txid: Hash,
    /// Witness-inclusive transaction id (internal byte order)
    pub wtxid: Hash,
    /// Values of the previous outputs spent by each input, in input order
    pub input_values: Vec<Natural>,
    /// Values of each output, in output order
    pub output_values: Vec<Natural>,
    pub fee: Natural,
    pub weight: Natural,
    pub transaction: Transaction,
    pub raw: ByteString,
}

impl TransactionRecord {
    pub fn total_input_value(&self) -> Option<Natural> {
        self.input_values
            .iter()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
    }

    pub fn total_output_value(&self) -> Option<Natural> {
        self.output_values
            .iter()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
    }
}

/// Render a hash in the conventional reversed (display) byte order
pub fn to_display_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}

/// Parse a display-order hex hash back into internal byte order
pub fn from_display_hex(s: &str) -> Option<Hash> {
    let bytes = hex::decode(s).ok()?;
    let mut hash: Hash = bytes.try_into().ok()?;
    hash.reverse();
    Some(hash)
}
