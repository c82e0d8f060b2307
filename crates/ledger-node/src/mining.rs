//! Background mining that yields to chain changes.
//!
//! Each request mines on a snapshot of the chain inside `spawn_blocking`.
//! When the tip moves (a local block or a peer's chain lands), jobs started
//! on an older tip are cancelled and restart on the new one.

use ledger_core::{mine_cancellable, mine_parallel, Block, ChainStore, MineError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task;
use tracing::{debug, info};

use crate::error::NodeError;

struct Job {
    started_at: u64,
    cancel: Arc<AtomicBool>,
}

pub struct MiningCoordinator {
    store: Arc<ChainStore>,
    parallel: bool,
    jobs: Mutex<Vec<Job>>,
}

impl MiningCoordinator {
    pub fn new(store: Arc<ChainStore>, parallel: bool) -> Self {
        Self {
            store,
            parallel,
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Mine `data` into a block and append it, restarting whenever the tip
    /// changes under the search.
    pub async fn mine_and_append(&self, data: String) -> Result<Block, NodeError> {
        loop {
            let version = self.store.tip_version();
            let chain = self.store.snapshot();
            let params = *self.store.params();
            let now = self.store.now();
            let cancel = self.register(version);
            // The tip may have moved before the job was registered.
            if self.store.tip_version() != version {
                cancel.store(true, Ordering::Relaxed);
            }

            let job_cancel = Arc::clone(&cancel);
            let job_data = data.clone();
            let parallel = self.parallel;
            let result = task::spawn_blocking(move || {
                if parallel {
                    mine_parallel(&chain, &job_data, &params, now, &job_cancel)
                } else {
                    mine_cancellable(&chain, &job_data, &params, now, &job_cancel)
                }
            })
            .await;
            self.unregister(&cancel);

            match result? {
                Ok(block) => {
                    self.store.append(block.clone())?;
                    info!("appended mined block {block}");
                    self.tip_changed();
                    return Ok(block);
                }
                Err(MineError::Cancelled) => {
                    debug!("tip moved during mining, restarting");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Cancel every job started on an older tip.
    pub fn tip_changed(&self) {
        let version = self.store.tip_version();
        let jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
        for job in jobs.iter().filter(|job| job.started_at < version) {
            job.cancel.store(true, Ordering::Relaxed);
        }
    }

    pub fn active_jobs(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub(crate) fn register(&self, started_at: u64) -> Arc<AtomicBool> {
        let cancel = Arc::new(AtomicBool::new(false));
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Job {
                started_at,
                cancel: Arc::clone(&cancel),
            });
        cancel
    }

    pub(crate) fn unregister(&self, cancel: &Arc<AtomicBool>) {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|job| !Arc::ptr_eq(&job.cancel, cancel));
    }
}
