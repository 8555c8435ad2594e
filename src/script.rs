//! Output script construction for the coinbase transaction

use crate::constants::*;
use crate::hash::hash160;
use crate::types::{ByteString, Hash};

/// Largest payload a single direct push opcode can carry
const MAX_DIRECT_PUSH: usize = 0x4b;
const OP_PUSHDATA1: u8 = 0x4c;

/// Push `data` onto the script stack
pub fn push_data(script: &mut ByteString, data: &[u8]) {
    if data.len() <= MAX_DIRECT_PUSH {
        script.push(data.len() as u8);
    } else {
        // Coinbase payloads never exceed 255 bytes
        debug_assert!(data.len() <= u8::MAX as usize);
        script.push(OP_PUSHDATA1);
        script.push(data.len() as u8);
    }
    script.extend_from_slice(data);
}

/// P2PKH: OP_DUP OP_HASH160 <hash160(pubkey)> OP_EQUALVERIFY OP_CHECKSIG
pub fn p2pkh_script(public_key: &[u8]) -> ByteString {
    let mut script = vec![OP_DUP, OP_HASH160];
    push_data(&mut script, &hash160(public_key));
    script.push(OP_EQUALVERIFY);
    script.push(OP_CHECKSIG);
    script
}

/// OP_RETURN <aa21a9ed || commitment>
pub fn witness_commitment_script(commitment: &Hash) -> ByteString {
    let mut payload = Vec::with_capacity(36);
    payload.extend_from_slice(&WITNESS_COMMITMENT_HEADER);
    payload.extend_from_slice(commitment);

    let mut script = vec![OP_RETURN];
    push_data(&mut script, &payload);
    script
}

/// Extract the commitment from an `OP_RETURN 0x24 aa21a9ed <32 bytes>` script
pub fn extract_witness_commitment(script: &[u8]) -> Option<Hash> {
    if script.len() < 38 || script[0] != OP_RETURN || script[1] != 0x24 {
        return None;
    }
    if script[2..6] != WITNESS_COMMITMENT_HEADER {
        return None;
    }
    let mut commitment = [0u8; 32];
    commitment.copy_from_slice(&script[6..38]);
    Some(commitment)
}
