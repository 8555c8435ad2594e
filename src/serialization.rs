//! Bitcoin wire serialization for transactions and block headers

use crate::constants::BLOCK_HEADER_SIZE;
use crate::error::{MinerError, Result};
use crate::hash::sha256d;
use crate::types::*;

/// BIP144 marker and flag bytes that introduce witness serialization
const SEGWIT_MARKER: u8 = 0x00;
const SEGWIT_FLAG: u8 = 0x01;

/// Encode a number as a Bitcoin varint
pub fn encode_varint(value: u64) -> Vec<u8> {
    if value < 0xfd {
        vec![value as u8]
    } else if value <= 0xffff {
        let mut result = vec![0xfd];
        result.extend_from_slice(&(value as u16).to_le_bytes());
        result
    } else if value <= 0xffffffff {
        let mut result = vec![0xfe];
        result.extend_from_slice(&(value as u32).to_le_bytes());
        result
    } else {
        let mut result = vec![0xff];
        result.extend_from_slice(&value.to_le_bytes());
        result
    }
}

fn write_bytes(data: &mut Vec<u8>, bytes: &[u8]) {
    data.extend_from_slice(&encode_varint(bytes.len() as u64));
    data.extend_from_slice(bytes);
}

fn write_inputs_and_outputs(data: &mut Vec<u8>, tx: &Transaction) {
    data.extend_from_slice(&encode_varint(tx.inputs.len() as u64));
    for input in &tx.inputs {
        data.extend_from_slice(&input.prevout.hash);
        data.extend_from_slice(&input.prevout.index.to_le_bytes());
        write_bytes(data, &input.script_sig);
        data.extend_from_slice(&input.sequence.to_le_bytes());
    }

    data.extend_from_slice(&encode_varint(tx.outputs.len() as u64));
    for output in &tx.outputs {
        data.extend_from_slice(&output.value.to_le_bytes());
        write_bytes(data, &output.script_pubkey);
    }
}

/// Serialize without witness data (the txid preimage)
pub fn serialize_transaction_legacy(tx: &Transaction) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&tx.version.to_le_bytes());
    write_inputs_and_outputs(&mut data, tx);
    data.extend_from_slice(&tx.lock_time.to_le_bytes());
    data
}

/// Serialize in full; uses the BIP144 layout when any input has a witness
pub fn serialize_transaction(tx: &Transaction) -> Vec<u8> {
    if !tx.has_witness() {
        return serialize_transaction_legacy(tx);
    }

    let mut data = Vec::new();
    data.extend_from_slice(&tx.version.to_le_bytes());
    data.push(SEGWIT_MARKER);
    data.push(SEGWIT_FLAG);
    write_inputs_and_outputs(&mut data, tx);
    for input in &tx.inputs {
        data.extend_from_slice(&encode_varint(input.witness.len() as u64));
        for element in &input.witness {
            write_bytes(&mut data, element);
        }
    }
    data.extend_from_slice(&tx.lock_time.to_le_bytes());
    data
}

/// Non-witness transaction id
pub fn compute_txid(tx: &Transaction) -> Hash {
    sha256d(&serialize_transaction_legacy(tx))
}

/// Witness-inclusive transaction id; equals the txid for legacy transactions
pub fn compute_wtxid(tx: &Transaction) -> Hash {
    sha256d(&serialize_transaction(tx))
}

/// Weight = 3 × base size + total size
pub fn transaction_weight(tx: &Transaction) -> Natural {
    let base = serialize_transaction_legacy(tx).len() as Natural;
    let total = serialize_transaction(tx).len() as Natural;
    base * 3 + total
}

/// Serialize the 80-byte block header
pub fn serialize_header(header: &BlockHeader) -> [u8; BLOCK_HEADER_SIZE] {
    let mut bytes = [0u8; BLOCK_HEADER_SIZE];
    bytes[0..4].copy_from_slice(&header.version.to_le_bytes());
    bytes[4..36].copy_from_slice(&header.prev_block_hash);
    bytes[36..68].copy_from_slice(&header.merkle_root);
    bytes[68..72].copy_from_slice(&header.timestamp.to_le_bytes());
    bytes[72..76].copy_from_slice(&header.bits.to_le_bytes());
    bytes[76..80].copy_from_slice(&header.nonce.to_le_bytes());
    bytes
}

/// Double SHA256 of the serialized header
pub fn calculate_block_hash(header: &BlockHeader) -> Hash {
    sha256d(&serialize_header(header))
}

/// Cursor over a raw transaction
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                MinerError::Decode(format!("unexpected end of data at offset {}", self.pos))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn read_hash(&mut self) -> Result<Hash> {
        let mut hash = [0u8; 32];
        hash.copy_from_slice(self.take(32)?);
        Ok(hash)
    }

    fn read_varint(&mut self) -> Result<u64> {
        match self.read_u8()? {
            0xfd => {
                let b = self.take(2)?;
                Ok(u16::from_le_bytes([b[0], b[1]]) as u64)
            }
            0xfe => Ok(self.read_u32()? as u64),
            0xff => self.read_u64(),
            n => Ok(n as u64),
        }
    }

    /// Reads a length prefix, refusing lengths longer than the remaining data
    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_varint()?;
        let remaining = (self.data.len() - self.pos) as u64;
        if len > remaining {
            return Err(MinerError::Decode(format!(
                "length {} exceeds remaining {} bytes",
                len, remaining
            )));
        }
        Ok(len as usize)
    }

    fn read_bytes(&mut self) -> Result<ByteString> {
        let len = self.read_len()?;
        Ok(self.take(len)?.to_vec())
    }

    fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }
}

/// Decode a raw transaction in either legacy or BIP144 layout
pub fn deserialize_transaction(raw: &[u8]) -> Result<Transaction> {
    let mut reader = Reader::new(raw);
    let version = reader.read_u32()? as i32;

    let segwit = reader.peek() == Some(SEGWIT_MARKER);
    if segwit {
        reader.read_u8()?;
        let flag = reader.read_u8()?;
        if flag != SEGWIT_FLAG {
            return Err(MinerError::Decode(format!("unknown segwit flag {:#04x}", flag)));
        }
    }

    let input_count = reader.read_len()?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let hash = reader.read_hash()?;
        let index = reader.read_u32()?;
        let script_sig = reader.read_bytes()?;
        let sequence = reader.read_u32()?;
        inputs.push(TransactionInput {
            prevout: OutPoint { hash, index },
            script_sig,
            sequence,
            witness: Vec::new(),
        });
    }

    let output_count = reader.read_len()?;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let value = reader.read_u64()?;
        let script_pubkey = reader.read_bytes()?;
        outputs.push(TransactionOutput {
            value,
            script_pubkey,
        });
    }

    if segwit {
        for input in &mut inputs {
            let items = reader.read_len()?;
            for _ in 0..items {
                input.witness.push(reader.read_bytes()?);
            }
        }
    }

    let lock_time = reader.read_u32()?;
    if !reader.is_exhausted() {
        return Err(MinerError::Decode("trailing bytes after lock time".to_string()));
    }

    Ok(Transaction {
        version,
        inputs,
        outputs,
        lock_time,
    })
}
