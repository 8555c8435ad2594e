//! Block assembly and mining constants

/// Default difficulty target (big-endian hex)
pub const DEFAULT_TARGET_HEX: &str =
    "0000ffff00000000000000000000000000000000000000000000000000000000";

/// Default cap on the accumulated fee of a block, in satoshis (exclusive)
pub const DEFAULT_MAX_FEE: u64 = 24_000_000;

/// Default cap on the accumulated weight of a block, in weight units (exclusive)
pub const DEFAULT_MAX_WEIGHT: u64 = 4_000_000;

/// Weight reserved up front for the coinbase transaction
pub const DEFAULT_COINBASE_WEIGHT_RESERVE: u64 = 1000;

/// Block header version
pub const DEFAULT_BLOCK_VERSION: i32 = 4;

/// Coinbase transaction version
pub const COINBASE_TX_VERSION: i32 = 2;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// BIP141 witness commitment header tag
pub const WITNESS_COMMITMENT_HEADER: [u8; 4] = [0xaa, 0x21, 0xa9, 0xed];

/// BIP141 witness reserved value carried in the coinbase witness
pub const WITNESS_RESERVED_VALUE: [u8; 32] = [0u8; 32];

/// Serialized block header length
pub const BLOCK_HEADER_SIZE: usize = 80;

/// Nonces scanned between cancellation checks
pub const CANCEL_CHECK_INTERVAL: u64 = 10_000;

/// Size of the nonce space
pub const NONCE_SPACE: u64 = 1 << 32;

/// Script opcodes used by the coinbase outputs
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;

/// Miner secret key used when none is configured
pub const DEFAULT_MINER_KEY_HEX: &str =
    "39dc0a9f0b185a2ee56349691f34716e6e0cda06a7f9707742ac113c4e2317bf";
