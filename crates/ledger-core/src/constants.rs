pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const HASH_BITS: u32 = (HASH_SIZE * BYTE) as u32;

/// Target seconds between blocks.
pub const BLOCK_GENERATION_INTERVAL: u64 = 10;
/// Blocks between difficulty recalculations.
pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 10;
/// Allowed clock skew, in seconds, when checking block timestamps.
pub const TIMESTAMP_SKEW_SECS: u64 = 60;

pub const GENESIS_TIMESTAMP: u64 = 1_465_154_705;
pub const GENESIS_DATA: &str = "my genesis block!!";

/// Nonces tried between checks of a mining job's cancel flag.
pub const MINE_BATCH_SIZE: u64 = 4096;

/// Previous-hash sentinel carried by the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
