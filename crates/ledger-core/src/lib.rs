//! Hash-linked, proof-of-work ledger of opaque data blocks.
//!
//! - [`block`]: the block value type and the genesis block
//! - [`validate`]: successor and whole-chain validation
//! - [`difficulty`]: retargeting and cumulative work
//! - [`mine`]: nonce search
//! - [`store`]: the in-memory chain with append and fork choice
//! - [`message`]: gossip messages and how a node answers them

pub mod block;
pub mod clock;
pub mod constants;
pub mod difficulty;
pub mod error;
pub mod hash;
pub mod message;
pub mod mine;
pub mod params;
pub mod store;
pub mod validate;

pub use block::{genesis_block, Block, GENESIS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use difficulty::{block_work, chain_weight, cumulative_work, next_difficulty};
pub use error::{MineError, ValidationError};
pub use hash::{meets_difficulty, sha256_hex};
pub use message::{candidate_values, handle_message, Message, Reply};
pub use mine::{mine, mine_cancellable, mine_parallel, BlockTemplate};
pub use params::ChainParams;
pub use store::{ChainStore, IgnoreReason, ReconcileOutcome};
pub use validate::{validate_chain, validate_successor};
