//! HTTP read API
//!
//! - `GET /proof?bucket=<name>&address=<0x...>` → `{amount, amountWei, proof}`
//! - `GET /roots` → `{bucket: {root, count}}`

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::{error_response, ProofStore, QueryError};

#[derive(Debug, Deserialize)]
struct ProofParams {
    bucket: Option<String>,
    address: Option<String>,
}

async fn get_proof(State(store): State<Arc<ProofStore>>, Query(params): Query<ProofParams>) -> Response {
    let Some(bucket) = params.bucket else {
        return QueryError::MissingParameter("bucket").into_response();
    };
    let Some(address) = params.address else {
        return QueryError::MissingParameter("address").into_response();
    };

    match store.get_proof(&bucket, &address) {
        Ok(Some(record)) => {
            debug!("proof {} {}: found", bucket, address);
            Json(record).into_response()
        }
        Ok(None) => {
            debug!("proof {} {}: not eligible", bucket, address);
            error_response(StatusCode::NOT_FOUND, "address not found")
        }
        Err(e) => {
            debug!("proof {} {}: {}", bucket, address, e);
            e.into_response()
        }
    }
}

async fn get_roots(State(store): State<Arc<ProofStore>>) -> Response {
    Json(store.roots()).into_response()
}

/// Router over a loaded store.
pub fn router(store: Arc<ProofStore>) -> Router {
    Router::new()
        .route("/proof", get(get_proof))
        .route("/roots", get(get_roots))
        .with_state(store)
}

/// Serve the read API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, store: Arc<ProofStore>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Proof API listening on http://{} ({} buckets)", addr, store.len());
    }
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Proof API stopped");
    Ok(())
}
