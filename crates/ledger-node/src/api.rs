use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use ledger_core::{Block, Message};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::NodeError;
use crate::AppState;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    height: u64,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub data: String,
}

#[derive(Deserialize)]
pub struct PeerRequest {
    pub url: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/blocks", get(blocks))
        .route("/blocks/latest", get(latest))
        .route("/mine", post(mine))
        .route("/peers", get(peers).post(add_peer))
        .route("/p2p", post(p2p))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        height: state.store.latest().index(),
    })
}

async fn blocks(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.store.snapshot().to_vec())
}

async fn latest(State(state): State<AppState>) -> Json<Block> {
    Json(state.store.latest())
}

async fn mine(
    State(state): State<AppState>,
    Json(req): Json<MineRequest>,
) -> Result<Json<Block>, NodeError> {
    let block = state.miner.mine_and_append(req.data).await?;
    state.gossip.broadcast_latest();
    Ok(Json(block))
}

async fn peers(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.gossip.peers())
}

async fn add_peer(
    State(state): State<AppState>,
    Json(req): Json<PeerRequest>,
) -> Result<(StatusCode, Json<Vec<String>>), NodeError> {
    let url = req.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(NodeError::BadRequest(format!("peer url must be http(s): {url}")));
    }
    if state.gossip.add_peer(url) {
        info!("added peer {url}");
        let gossip = state.gossip.clone();
        let peer = url.trim_end_matches('/').to_string();
        tokio::spawn(async move {
            if let Err(err) = gossip.converse(&peer, Message::QueryLatest).await {
                warn!("could not reach {peer}: {err:#}");
            }
        });
    }
    Ok((StatusCode::CREATED, Json(state.gossip.peers())))
}

async fn p2p(State(state): State<AppState>, Json(msg): Json<Message>) -> Json<Option<Message>> {
    Json(state.gossip.dispatch(msg))
}
