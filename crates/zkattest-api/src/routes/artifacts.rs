//! # Artifact Distribution
//!
//! Wallets download the proving key for a schema before proving; anyone
//! may fetch the verifying key or the canonical schema text. Keys exist
//! only after a request for the schema has been created.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use zkattest_core::ContentDigest;
use zkattest_protocol::SchemaKeys;

use crate::error::AppError;
use crate::state::AppState;

const OCTET_STREAM: &str = "application/octet-stream";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/artifacts/{hash}/vk", get(get_verifying_key))
        .route("/v1/artifacts/{hash}/pk", get(get_proving_key))
        .route("/v1/schemas/{hash}", get(get_schema))
}

/// Unparseable hashes are reported the same way as unknown ones.
fn keys_for(state: &AppState, hash: &str, what: &str) -> Result<Arc<SchemaKeys>, AppError> {
    hash.parse::<ContentDigest>()
        .ok()
        .and_then(|digest| state.service.keys_for(&digest))
        .ok_or_else(|| AppError::NotFound(format!("{what} not found")))
}

/// GET /v1/artifacts/{hash}/vk: Compressed verifying key.
#[utoipa::path(
    get,
    path = "/v1/artifacts/{hash}/vk",
    params(("hash" = String, Path, description = "Schema hash, `sha256:<hex>`")),
    responses(
        (status = 200, description = "Verifying key bytes", body = String, content_type = "application/octet-stream"),
        (status = 404, description = "No keys for this schema", body = crate::error::ErrorBody),
    ),
    tag = "artifacts"
)]
async fn get_verifying_key(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    let keys = keys_for(&state, &hash, "vk")?;
    Ok(([(header::CONTENT_TYPE, OCTET_STREAM)], keys.verifying_key_bytes.clone()).into_response())
}

/// GET /v1/artifacts/{hash}/pk: Compressed proving key.
#[utoipa::path(
    get,
    path = "/v1/artifacts/{hash}/pk",
    params(("hash" = String, Path, description = "Schema hash, `sha256:<hex>`")),
    responses(
        (status = 200, description = "Proving key bytes", body = String, content_type = "application/octet-stream"),
        (status = 404, description = "No keys for this schema", body = crate::error::ErrorBody),
    ),
    tag = "artifacts"
)]
async fn get_proving_key(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    let keys = keys_for(&state, &hash, "pk")?;
    tracing::debug!(schema_hash = %keys.schema_hash, bytes = keys.proving_key_bytes.len(), "serving proving key");
    Ok(([(header::CONTENT_TYPE, OCTET_STREAM)], keys.proving_key_bytes.clone()).into_response())
}

/// GET /v1/schemas/{hash}: Canonical schema JSON.
#[utoipa::path(
    get,
    path = "/v1/schemas/{hash}",
    params(("hash" = String, Path, description = "Schema hash, `sha256:<hex>`")),
    responses(
        (status = 200, description = "Canonical schema", body = String, content_type = "application/json"),
        (status = 404, description = "Unknown schema", body = crate::error::ErrorBody),
    ),
    tag = "artifacts"
)]
async fn get_schema(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, AppError> {
    let keys = keys_for(&state, &hash, "schema")?;
    let body = keys.schema.canonical_json().as_str().to_owned();
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
