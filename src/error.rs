//! Error types for block assembly and mining

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MinerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex decoding failed: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Transaction decoding failed: {0}")]
    Decode(String),

    #[error("Invalid difficulty target: {0}")]
    InvalidTarget(String),

    #[error("Invalid miner key: {0}")]
    InvalidKey(String),

    #[error("Cannot compute merkle root of an empty transaction list")]
    EmptyMerkleTree,

    #[error("Nonce space exhausted after {attempts} attempts")]
    NonceSpaceExhausted { attempts: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MinerError>;
