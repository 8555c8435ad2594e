//! Mined block artifact
//!
//! Newline-delimited text: the 80-byte header in hex, the coinbase in its
//! witness serialization, then one txid per line in display order with the
//! coinbase first.

use crate::block::AssembledBlock;
use crate::error::Result;
use crate::serialization::{serialize_header, serialize_transaction};
use crate::types::*;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockArtifact {
    pub header_hex: String,
    pub coinbase_hex: String,
    /// Display-order (byte-reversed) txids, coinbase first
    pub txids: Vec<String>,
}

impl BlockArtifact {
    pub fn from_block(block: &AssembledBlock) -> Self {
        Self {
            header_hex: hex::encode(serialize_header(&block.header)),
            coinbase_hex: hex::encode(serialize_transaction(block.coinbase())),
            txids: block.txids().iter().map(to_display_hex).collect(),
        }
    }

    /// Write the rendered artifact to `path`, replacing any existing file
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_string())?;
        info!(path = %path.display(), transactions = self.txids.len(), "Block written");
        Ok(())
    }
}

impl fmt::Display for BlockArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header_hex)?;
        write!(f, "{}", self.coinbase_hex)?;
        for txid in &self.txids {
            write!(f, "\n{}", txid)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockAssembler, FixedClock};
    use crate::coinbase::{CoinbaseBuilder, MinerKey};
    use crate::serialization::compute_txid;
    use primitive_types::U256;

    const TEST_KEY: &str = "39dc0a9f0b185a2ee56349691f34716e6e0cda06a7f9707742ac113c4e2317bf";

    fn create_block() -> AssembledBlock {
        let builder = CoinbaseBuilder::new(&MinerKey::from_hex(TEST_KEY).unwrap());
        let spend = Transaction {
            version: 2,
            inputs: vec![TransactionInput {
                prevout: OutPoint {
                    hash: [3; 32],
                    index: 1,
                },
                script_sig: vec![],
                sequence: 0xffffffff,
                witness: vec![vec![1; 71], vec![2; 33]],
            }],
            outputs: vec![TransactionOutput {
                value: 700,
                script_pubkey: vec![0x51],
            }],
            lock_time: 0,
        };
        let (transactions, coinbase) = builder.build(300, vec![spend]).unwrap();
        BlockAssembler::with_clock(4, FixedClock(1_700_000_000))
            .assemble(
                transactions,
                coinbase.witness_commitment,
                &(U256::from(0xffffu64) << 224usize),
                [0; 32],
            )
            .unwrap()
    }

    #[test]
    fn test_artifact_lines() {
        let block = create_block();
        let artifact = BlockArtifact::from_block(&block);
        let rendered = artifact.to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0].len(), 160);
        assert_eq!(lines[0], hex::encode(serialize_header(&block.header)));
        // BIP144 marker and flag follow the version
        assert_eq!(&lines[1][8..12], "0001");
        assert_eq!(lines[2], to_display_hex(&compute_txid(&block.transactions[0])));
        assert_eq!(lines[3], to_display_hex(&compute_txid(&block.transactions[1])));
        assert!(!rendered.ends_with('\n'));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let artifact = BlockArtifact::from_block(&create_block());
        artifact.write_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), artifact.to_string());
    }
}
