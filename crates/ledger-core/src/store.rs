//! The authoritative in-memory chain and its fork-choice rule.

use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, info};

use crate::block::{genesis_block, Block};
use crate::clock::{Clock, SystemClock};
use crate::difficulty::{chain_weight, cumulative_work};
use crate::error::ValidationError;
use crate::params::ChainParams;
use crate::validate::{validate_chain, validate_successor};

/// Why a peer's blocks were set aside without being judged invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyInput,
    MalformedBlock,
    NotLonger,
}

/// Result of [`ChainStore::reconcile`]. Every variant is a routine outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The peer's latest block was appended to our chain.
    Extended,
    /// Our chain was swapped for the peer's.
    Replaced,
    /// The peer is ahead but sent one block that does not link; ask for its full chain.
    NeedFullChain,
    Ignored(IgnoreReason),
    Rejected(ValidationError),
}

impl ReconcileOutcome {
    /// True when the latest block changed.
    pub fn changed_tip(&self) -> bool {
        matches!(self, Self::Extended | Self::Replaced)
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extended => write!(f, "extended"),
            Self::Replaced => write!(f, "replaced"),
            Self::NeedFullChain => write!(f, "need full chain"),
            Self::Ignored(reason) => write!(f, "ignored ({reason:?})"),
            Self::Rejected(err) => write!(f, "rejected: {err}"),
        }
    }
}

/// Owner of the chain.
///
/// `append` and `reconcile` are serialized by a writer lock. Readers get an
/// `Arc` snapshot of the whole chain and never see a half-applied change.
pub struct ChainStore {
    params: ChainParams,
    clock: Arc<dyn Clock>,
    chain: RwLock<Arc<Vec<Block>>>,
    writer: Mutex<()>,
    version: AtomicU64,
}

impl ChainStore {
    /// A store holding only the genesis block, timed by the system clock.
    pub fn new(params: ChainParams) -> Self {
        Self::with_clock(params, Arc::new(SystemClock))
    }

    pub fn with_clock(params: ChainParams, clock: Arc<dyn Clock>) -> Self {
        Self {
            params,
            clock,
            chain: RwLock::new(Arc::new(vec![genesis_block().clone()])),
            writer: Mutex::new(()),
            version: AtomicU64::new(0),
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// The full chain at a single point in time.
    pub fn snapshot(&self) -> Arc<Vec<Block>> {
        Arc::clone(&self.chain.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn latest(&self) -> Block {
        let chain = self.snapshot();
        chain.last().unwrap_or(genesis_block()).clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Always false: the chain holds at least the genesis block.
    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    pub fn cumulative_work(&self) -> u128 {
        cumulative_work(&self.snapshot())
    }

    /// Incremented every time the chain changes.
    pub fn tip_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Append `block` if it is a valid successor of the latest block.
    /// On error the chain is untouched.
    pub fn append(&self, block: Block) -> Result<(), ValidationError> {
        let _writer = self.lock_writer();
        self.append_locked(block)
    }

    /// Fork choice for blocks received from a peer, still in their decoded
    /// JSON form (one element per block).
    pub fn reconcile(&self, candidates: Vec<Value>) -> ReconcileOutcome {
        if candidates.is_empty() {
            return self.report(ReconcileOutcome::Ignored(IgnoreReason::EmptyInput));
        }
        let blocks: Result<Vec<Block>, _> = candidates
            .into_iter()
            .map(serde_json::from_value::<Block>)
            .collect();
        match blocks {
            Ok(blocks) => self.reconcile_blocks(blocks),
            Err(err) => {
                debug!("received malformed block: {err}");
                self.report(ReconcileOutcome::Ignored(IgnoreReason::MalformedBlock))
            }
        }
    }

    /// Fork choice for already decoded blocks.
    ///
    /// A single block that links to our tip is appended. A longer chain that
    /// validates from genesis replaces ours when it carries strictly more
    /// cumulative work (`sum of 2^difficulty`), or more blocks when
    /// proof-of-work is off. Anything else leaves the chain as it was.
    pub fn reconcile_blocks(&self, blocks: Vec<Block>) -> ReconcileOutcome {
        let Some(their_latest) = blocks.last() else {
            return self.report(ReconcileOutcome::Ignored(IgnoreReason::EmptyInput));
        };
        if let Some(bad) = blocks
            .iter()
            .find(|b| !b.is_genesis() && !b.is_structurally_valid())
        {
            debug!("received malformed block {}", bad.index());
            return self.report(ReconcileOutcome::Ignored(IgnoreReason::MalformedBlock));
        }

        let _writer = self.lock_writer();
        let ours = self.snapshot();
        let our_latest = ours.last().unwrap_or(genesis_block());

        if their_latest.index() <= our_latest.index() {
            return self.report(ReconcileOutcome::Ignored(IgnoreReason::NotLonger));
        }
        debug!(
            "chain possibly behind: we have {}, peer has {}",
            our_latest.index(),
            their_latest.index()
        );

        if our_latest.hash() == their_latest.previous_hash() {
            drop(ours);
            let outcome = match self.append_locked(their_latest.clone()) {
                Ok(()) => ReconcileOutcome::Extended,
                Err(err) => ReconcileOutcome::Rejected(err),
            };
            return self.report(outcome);
        }

        if blocks.len() == 1 {
            return self.report(ReconcileOutcome::NeedFullChain);
        }

        if let Err(err) = validate_chain(&blocks, &self.params, self.now()) {
            return self.report(ReconcileOutcome::Rejected(err));
        }
        if chain_weight(&blocks, &self.params) <= chain_weight(&ours, &self.params) {
            return self.report(ReconcileOutcome::Ignored(IgnoreReason::NotLonger));
        }

        info!(
            "replacing chain of {} blocks with received chain of {} blocks",
            ours.len(),
            blocks.len()
        );
        self.publish(|chain| *chain = Arc::new(blocks));
        self.report(ReconcileOutcome::Replaced)
    }

    fn append_locked(&self, block: Block) -> Result<(), ValidationError> {
        let chain = self.snapshot();
        let latest = chain.last().unwrap_or(genesis_block());
        validate_successor(latest, &block, &self.params, self.now())?;
        drop(chain);
        debug!("appending block {block}");
        self.publish(|chain| Arc::make_mut(chain).push(block));
        Ok(())
    }

    fn publish(&self, change: impl FnOnce(&mut Arc<Vec<Block>>)) {
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        change(&mut *chain);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn report(&self, outcome: ReconcileOutcome) -> ReconcileOutcome {
        debug!("reconcile outcome: {outcome}");
        outcome
    }
}

impl Default for ChainStore {
    fn default() -> Self {
        Self::new(ChainParams::default())
    }
}
