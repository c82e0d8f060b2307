//! HTTP control surface and peer gossip for a ledger node.

pub mod api;
pub mod config;
mod constants;
pub mod error;
pub mod gossip;
pub mod mining;

use anyhow::Result;
use ledger_core::ChainStore;
use std::sync::Arc;

pub use api::router;
pub use config::Args;
pub use error::NodeError;
pub use gossip::Gossip;
pub use mining::MiningCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChainStore>,
    pub miner: Arc<MiningCoordinator>,
    pub gossip: Gossip,
}

impl AppState {
    pub fn new(store: Arc<ChainStore>, parallel_mining: bool, peers: Vec<String>) -> Result<Self> {
        let miner = Arc::new(MiningCoordinator::new(Arc::clone(&store), parallel_mining));
        let gossip = Gossip::new(Arc::clone(&store), Arc::clone(&miner), peers)?;
        Ok(Self {
            store,
            miner,
            gossip,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        let store = Arc::new(ChainStore::new(args.chain_params()));
        Self::new(store, args.parallel_mining, args.peers.clone())
    }
}
