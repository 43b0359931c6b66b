//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI 3.1 spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "zkattest API",
        version = "0.1.0",
        description = "Schema-driven zero-knowledge presentations: request creation, wallet descriptors, Groth16 proof verification and artifact distribution."
    ),
    paths(
        // Presentations
        crate::routes::presentations::create_presentation,
        crate::routes::presentations::verify_presentation,
        crate::routes::presentations::verify_blocking,
        crate::routes::presentations::show_presentation,
        crate::routes::presentations::get_descriptor,
        crate::routes::presentations::get_status,
        crate::routes::presentations::get_result,
        // Artifacts
        crate::routes::artifacts::get_verifying_key,
        crate::routes::artifacts::get_proving_key,
        crate::routes::artifacts::get_schema,
    ),
    components(schemas(
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::error::VerifyFailure,
        // Presentation DTOs
        crate::routes::presentations::CreatePresentationRequest,
        crate::routes::presentations::CreatePresentationResponse,
        crate::routes::presentations::SubmitPresentationRequest,
        crate::routes::presentations::VerifyOk,
        crate::routes::presentations::VerifyBlockingRequest,
        crate::routes::presentations::VerifyBlockingResponse,
        crate::routes::presentations::StatusResponse,
    )),
    tags(
        (name = "presentations", description = "Presentation requests and proof submission"),
        (name = "artifacts", description = "Proving keys, verifying keys and schemas"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
