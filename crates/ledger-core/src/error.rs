use thiserror::Error;

/// Reasons a block or a chain is refused.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("malformed block {index}: {reason}")]
    BadStructure { index: u64, reason: &'static str },

    #[error("invalid index: expected {expected}, got {actual}")]
    BadIndex { expected: u64, actual: u64 },

    #[error("invalid previous hash: expected {expected}, got {actual}")]
    BadLink { expected: String, actual: String },

    #[error("block timestamp {timestamp} outside allowed window [{earliest}, {latest}]")]
    BadTimestamp {
        timestamp: u64,
        earliest: u64,
        latest: u64,
    },

    #[error("insufficient proof-of-work: hash {hash} lacks {required} leading zero bits")]
    BadProofOfWork { required: u32, hash: String },

    #[error("invalid hash: computed {computed}, block carries {stored}")]
    BadHash { computed: String, stored: String },

    #[error("first block is not the genesis block")]
    NotGenesis,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MineError {
    #[error("mining cancelled")]
    Cancelled,

    #[error("nonce space exhausted at difficulty {difficulty}")]
    NonceSpaceExhausted { difficulty: u32 },
}
