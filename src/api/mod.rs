//! API layer
//!
//! HTTP handlers for:
//! - Authentication (register, login, me, OAuth)
//! - User profile
//! - Metrics (Prometheus)

mod auth;
mod dto;
pub mod metrics;
mod profile;

pub use dto::*;

pub use auth::auth_router;
pub use metrics::metrics_router;
pub use profile::profile_router;

use axum::Router;

use crate::AppState;

/// Routes served under `/api`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_router())
        .nest("/user", profile_router())
}
