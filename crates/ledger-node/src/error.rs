use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::{MineError, ValidationError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Mine(#[from] MineError),

    #[error("mining task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl NodeError {
    fn status(&self) -> StatusCode {
        match self {
            NodeError::Validation(_) => StatusCode::CONFLICT,
            NodeError::Mine(MineError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            NodeError::Mine(_) | NodeError::Join(_) => StatusCode::INTERNAL_SERVER_ERROR,
            NodeError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
