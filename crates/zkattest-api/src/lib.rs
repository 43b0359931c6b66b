//! # zkattest-api: HTTP Verifier Service
//!
//! Axum front end for the presentation protocol. Relying parties create
//! requests and collect verdicts; wallets fetch descriptors and keys and
//! submit proofs.
//!
//! ## API Surface
//!
//! | Prefix                  | Module                       | Purpose                  |
//! |-------------------------|------------------------------|--------------------------|
//! | `/v1/presentations/*`   | [`routes::presentations`]    | Requests, proofs, verdicts |
//! | `/v1/artifacts/*`       | [`routes::artifacts`]        | Proving/verifying keys   |
//! | `/v1/schemas/*`         | [`routes::artifacts`]        | Canonical schemas        |
//! | `/metrics`              | this module                  | Prometheus exposition    |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```
//!
//! ## OpenAPI
//!
//! Auto-generated OpenAPI 3.1 spec via utoipa derive macros at `/openapi.json`.

pub mod error;
pub mod extractors;
pub mod janitor;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::header;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) sit outside the metrics layer.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::presentations::router())
        .merge(routes::artifacts::router())
        .merge(openapi::router())
        .route("/metrics", get(prometheus_metrics))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}

/// GET /metrics: Prometheus exposition of every recorded metric. Empty
/// when no recorder is installed.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
