use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::constants::{GENESIS_DATA, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
use crate::hash::{is_hex_digest, sha256_hex};

/// The hard-coded first entry of every valid chain.
pub static GENESIS: LazyLock<Block> = LazyLock::new(|| {
    Block::new(
        0,
        GENESIS_PREVIOUS_HASH,
        GENESIS_TIMESTAMP,
        GENESIS_DATA,
        0,
        0,
    )
});

pub fn genesis_block() -> &'static Block {
    &GENESIS
}

/// One ledger entry.
///
/// Fields are read-only: a block built with [`Block::new`] always carries the
/// hash of its own contents. Blocks decoded from peers keep whatever hash they
/// arrived with, which validation later recomputes and compares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    index: u64,
    previous_hash: String,
    timestamp: u64,
    data: String,
    #[serde(default)]
    difficulty: u32,
    #[serde(default)]
    nonce: u64,
    hash: String,
}

impl Block {
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        timestamp: u64,
        data: impl Into<String>,
        difficulty: u32,
        nonce: u64,
    ) -> Self {
        let mut block = Self {
            index,
            previous_hash: previous_hash.into(),
            timestamp,
            data: data.into(),
            difficulty,
            nonce,
            hash: String::new(),
        };
        block.hash = block.compute_hash();
        block
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Bytes fed to the digest: every field except `hash`, nonce last.
    pub fn hash_bytes(&self) -> Vec<u8> {
        let mut bytes = prefix_bytes(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.data,
            self.difficulty,
        );
        bytes.extend_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Recompute the hash from the block's own fields.
    pub fn compute_hash(&self) -> String {
        sha256_hex(&self.hash_bytes())
    }

    pub fn has_valid_hash(&self) -> bool {
        self.compute_hash() == self.hash
    }

    /// Shape check for blocks received from peers. Genesis is accepted only by
    /// equality with [`GENESIS`], never through this check.
    pub fn is_structurally_valid(&self) -> bool {
        is_hex_digest(&self.hash) && is_hex_digest(&self.previous_hash) && self.timestamp > 0
    }

    pub fn is_genesis(&self) -> bool {
        self == genesis_block()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = self.hash.get(..12).unwrap_or(&self.hash);
        write!(
            f,
            "#{} {} (difficulty {}, nonce {})",
            self.index, short, self.difficulty, self.nonce
        )
    }
}

/// Digest preimage up to, but excluding, the nonce. Mining hashes this prefix
/// once and appends each candidate nonce.
pub(crate) fn prefix_bytes(
    index: u64,
    previous_hash: &str,
    timestamp: u64,
    data: &str,
    difficulty: u32,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8 + previous_hash.len() + 8 + data.len() + 4 + 8);
    bytes.extend_from_slice(&index.to_le_bytes());
    bytes.extend_from_slice(previous_hash.as_bytes());
    bytes.extend_from_slice(&timestamp.to_le_bytes());
    bytes.extend_from_slice(data.as_bytes());
    bytes.extend_from_slice(&difficulty.to_le_bytes());
    bytes
}
