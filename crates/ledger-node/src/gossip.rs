//! Peer gossip over HTTP.
//!
//! A peer is a base URL. Messages are POSTed to `{peer}/p2p`; the response
//! body is the peer's direct reply (or `null`), which is handled like any
//! other inbound message and may be answered in turn.

use anyhow::{Context, Result};
use ledger_core::{handle_message, ChainStore, Message};
use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{MAX_GOSSIP_ROUNDS, PEER_TIMEOUT_SECS};
use crate::mining::MiningCoordinator;

#[derive(Clone)]
pub struct Gossip {
    store: Arc<ChainStore>,
    miner: Arc<MiningCoordinator>,
    peers: Arc<RwLock<BTreeSet<String>>>,
    client: reqwest::Client,
}

impl Gossip {
    pub fn new(
        store: Arc<ChainStore>,
        miner: Arc<MiningCoordinator>,
        peers: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(PEER_TIMEOUT_SECS))
            .build()
            .context("building peer http client")?;
        let peers = peers.into_iter().map(normalize_peer).collect();
        Ok(Self {
            store,
            miner,
            peers: Arc::new(RwLock::new(peers)),
            client,
        })
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Returns false if the peer was already known.
    pub fn add_peer(&self, url: &str) -> bool {
        self.peers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_peer(url.to_string()))
    }

    /// Handle one inbound message and return the direct reply, if any.
    /// Tip changes cancel stale mining and are announced to every peer.
    pub fn dispatch(&self, msg: Message) -> Option<Message> {
        let reply = handle_message(&self.store, msg);
        if let Some(outcome) = &reply.outcome {
            debug!("peer blocks: {outcome}");
            if outcome.changed_tip() {
                self.miner.tip_changed();
            }
        }
        if let Some(announcement) = reply.broadcast {
            self.broadcast(announcement);
        }
        reply.respond
    }

    /// Announce our latest block to every peer.
    pub fn broadcast_latest(&self) {
        self.broadcast(Message::latest(&self.store));
    }

    /// Send `msg` to every peer in the background.
    pub fn broadcast(&self, msg: Message) {
        for peer in self.peers() {
            let gossip = self.clone();
            let msg = msg.clone();
            tokio::spawn(async move {
                if let Err(err) = gossip.converse(&peer, msg).await {
                    warn!("gossip with {peer} failed: {err:#}");
                }
            });
        }
    }

    /// Send `msg` to `peer` and keep answering its replies for a bounded
    /// number of rounds.
    pub async fn converse(&self, peer: &str, msg: Message) -> Result<()> {
        let mut next = Some(msg);
        for _ in 0..MAX_GOSSIP_ROUNDS {
            let Some(msg) = next.take() else {
                return Ok(());
            };
            let Some(answer) = self.send(peer, &msg).await? else {
                return Ok(());
            };
            next = self.dispatch(answer);
        }
        if next.is_some() {
            debug!("conversation with {peer} cut after {MAX_GOSSIP_ROUNDS} rounds");
        }
        Ok(())
    }

    async fn send(&self, peer: &str, msg: &Message) -> Result<Option<Message>> {
        let res = self
            .client
            .post(format!("{peer}/p2p"))
            .json(msg)
            .send()
            .await
            .with_context(|| format!("sending to {peer}"))?
            .error_for_status()?;
        let answer = res
            .json::<Option<Message>>()
            .await
            .with_context(|| format!("decoding reply from {peer}"))?;
        Ok(answer)
    }

    /// Ask every configured peer for its latest block.
    pub async fn bootstrap(&self) {
        for peer in self.peers() {
            info!("querying {peer} for its latest block");
            if let Err(err) = self.converse(&peer, Message::QueryLatest).await {
                warn!("could not reach {peer}: {err:#}");
            }
        }
    }
}

fn normalize_peer(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}
