//! # deposit-api — Axum HTTP surface for deposits
//!
//! ## API Surface
//!
//! | Prefix                                | Module               |
//! |---------------------------------------|----------------------|
//! | `/api/deposits`, `/api/deposits/{id}` | [`routes::deposits`] |
//! | `/api/deposits/{id}/actions/*`        | [`routes::actions`]  |
//! | `/api/deposits/{id}/files*`           | [`routes::files`]    |
//! | `/api/records/{pid_value}`            | [`routes::records`]  |
//! | `/api/buckets/{bucket_id}`            | [`routes::buckets`]  |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };

    let api = Router::new()
        .merge(routes::deposits::router())
        .merge(routes::actions::router())
        .merge(routes::files::router())
        .merge(routes::records::router())
        .merge(routes::buckets::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}
