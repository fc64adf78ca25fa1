//! `/metrics` scrape endpoint
//!
//! Serves the CloudBox registry in the Prometheus text format. The
//! `cloudbox_users_total` gauge is resynced from the store on every scrape,
//! so accounts provisioned through OAuth are counted as well.

use axum::{
    Router,
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
};
use prometheus::{Encoder, TextEncoder};

use crate::AppState;
use crate::error::{AppError, report};
use crate::metrics::{REGISTRY, USERS_TOTAL};

async fn scrape(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = state
        .db
        .count_users()
        .await
        .inspect_err(|error| report("Metrics scrape", error))?;
    USERS_TOTAL.set(users);

    let encoder = TextEncoder::new();
    let body = encoder
        .encode_to_string(&REGISTRY.gather())
        .map_err(|e| AppError::Internal(e.into()))
        .inspect_err(|error| report("Metrics encode", error))?;

    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], body))
}

/// `GET /metrics`; the caller layers authentication on top.
pub fn metrics_router() -> Router<AppState> {
    Router::new().route("/metrics", get(scrape))
}
