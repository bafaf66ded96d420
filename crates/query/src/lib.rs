//! ClaimCraft Proof Query
//!
//! Read-only lookups over published distribution packs.
//!
//! Packs are loaded once into a [`ProofStore`] and never mutated, so the
//! store is shared as an `Arc` across request handlers without locking.
//! Every field returned is taken verbatim from the loaded pack.

mod http;
mod store;

pub use http::{router, serve};
pub use store::ProofStore;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use claimcraft_distribution::DistributionError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Malformed address: {0}")]
    MalformedAddress(String),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Missing query parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Pack {bucket} is inconsistent: {reason}")]
    InconsistentPack { bucket: String, reason: String },

    #[error("Pack error: {0}")]
    Pack(#[from] DistributionError),
}

pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    /// HTTP status for this error.
    ///
    /// Client mistakes map to 400, an unconfigured bucket to 404, and load
    /// failures (which never occur while serving) to 500.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedAddress(_) | Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::UnknownBucket(_) => StatusCode::NOT_FOUND,
            Self::ReadError { .. } | Self::InconsistentPack { .. } | Self::Pack(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// `{"error": message}` with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return error_response(status, "internal error");
        }
        error_response(status, self.to_string())
    }
}
