//! # Presentation API
//!
//! Relying parties create requests and poll or block for results; wallets
//! fetch descriptors and submit proofs. Key generation, proving checks and
//! verification run on the blocking pool.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use zkattest_core::{RequestId, Timestamp};
use zkattest_protocol::{
    deeplink, descriptor_url, request_url, Callback, CreateRequest, PresentationDescriptor,
    PresentationRequest, RequestStatus, ResultView, Submission, WaitOutcome,
};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_validated_json, run_blocking, validate_http_url, Validate};
use crate::state::AppState;

const MAX_TTL_SECS: u64 = 86_400;
const MAX_WAIT_SECS: u64 = 3_600;

// -- DTOs ---------------------------------------------------------------------

/// Create a presentation request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreatePresentationRequest {
    /// Schema as a JSON string or object. Defaults to the built-in age schema.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub schema_json: Option<Value>,
    /// Extra public inputs. `aud`, `nonce` and `current_*` are always server-set.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub public_inputs: Option<Map<String, Value>>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub callback_secret: Option<String>,
}

impl Validate for CreatePresentationRequest {
    fn validate(&self) -> Result<(), String> {
        validate_schema_json(self.schema_json.as_ref())?;
        if self.expires_in.is_some_and(|t| t > MAX_TTL_SECS) {
            return Err(format!("expires_in must be at most {MAX_TTL_SECS} seconds"));
        }
        match (&self.callback_url, &self.callback_secret) {
            (Some(url), _) => validate_http_url("callback_url", url),
            (None, Some(_)) => Err("callback_secret requires callback_url".into()),
            (None, None) => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePresentationResponse {
    #[schema(value_type = Object)]
    pub request: PresentationRequest,
    /// Human-readable page for the request.
    pub request_url: String,
    /// JSON descriptor for wallets.
    pub descriptor_url: String,
    pub deeplink: String,
}

/// A wallet's proof submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitPresentationRequest {
    pub request_id: String,
    /// Base64 proof envelope.
    pub zkp_blob_b64: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub public_inputs: Map<String, Value>,
    #[serde(default)]
    pub challenge: Option<String>,
}

impl From<SubmitPresentationRequest> for Submission {
    fn from(r: SubmitPresentationRequest) -> Self {
        Submission {
            request_id: r.request_id,
            zkp_blob_b64: r.zkp_blob_b64,
            public_inputs: r.public_inputs,
            challenge: r.challenge,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyOk {
    pub ok: bool,
    /// RFC 3339.
    pub verified_at: String,
}

/// Create a request and wait for its verdict.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VerifyBlockingRequest {
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub schema_json: Option<Value>,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub public_inputs: Option<Map<String, Value>>,
    /// Defaults to the configured wait timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Validate for VerifyBlockingRequest {
    fn validate(&self) -> Result<(), String> {
        validate_schema_json(self.schema_json.as_ref())?;
        match self.timeout_secs {
            Some(t) if t == 0 || t > MAX_WAIT_SECS => {
                Err(format!("timeout_secs must be between 1 and {MAX_WAIT_SECS}"))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VerifyBlockingResponse {
    pub request_id: String,
    pub ok: bool,
    /// `verified`, `failed`, `expired`, or `pending` on timeout.
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// `pending`, `expired` or `unknown_or_consumed`.
    #[schema(value_type = String)]
    pub state: RequestStatus,
}

fn validate_schema_json(value: Option<&Value>) -> Result<(), String> {
    match value {
        None | Some(Value::Null) | Some(Value::String(_)) | Some(Value::Object(_)) => Ok(()),
        Some(_) => Err("schema_json must be a JSON string or object".into()),
    }
}

/// Schema text as submitted; objects are re-serialized and canonicalized later.
fn schema_text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        Some(v @ Value::Object(_)) => Some(v.to_string()),
        _ => None,
    }
}

fn parse_id(raw: &str) -> Option<RequestId> {
    raw.parse().ok()
}

fn unknown() -> AppError {
    AppError::NotFound("unknown request".into())
}

// -- Router -------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/presentations/create", post(create_presentation))
        .route("/v1/presentations/verify", post(verify_presentation))
        .route("/v1/presentations/verify-blocking", post(verify_blocking))
        .route("/v1/presentations/{id}", get(show_presentation))
        .route("/v1/presentations/{id}/descriptor", get(get_descriptor))
        .route("/v1/presentations/{id}/status", get(get_status))
        .route("/v1/presentations/{id}/result", get(get_result))
}

// -- Handlers -----------------------------------------------------------------

/// POST /v1/presentations/create: Create a single-use presentation request.
#[utoipa::path(
    post,
    path = "/v1/presentations/create",
    request_body = CreatePresentationRequest,
    responses(
        (status = 201, description = "Request created", body = CreatePresentationResponse),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid schema or inputs", body = crate::error::ErrorBody),
    ),
    tag = "presentations"
)]
async fn create_presentation(
    State(state): State<AppState>,
    body: Result<Json<CreatePresentationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePresentationResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let callback = req.callback_url.map(|url| Callback {
        url,
        secret: req.callback_secret,
    });
    let has_callback = callback.is_some();
    let input = CreateRequest {
        schema_json: schema_text(req.schema_json),
        public_inputs: req.public_inputs.unwrap_or_default(),
        ttl_secs: req.expires_in,
        callback,
    };

    let service = Arc::clone(&state.service);
    let request = run_blocking(move || service.create_request(input, Timestamp::now())).await?;

    let config = state.service.config();
    let descriptor_url = descriptor_url(config, &request.request_id);
    tracing::debug!(request_id = %request.request_id, has_callback, "create_presentation.ok");
    Ok((
        StatusCode::CREATED,
        Json(CreatePresentationResponse {
            request_url: request_url(config, &request.request_id),
            deeplink: deeplink(&descriptor_url),
            descriptor_url,
            request,
        }),
    ))
}

/// POST /v1/presentations/verify: Submit a proof for a pending request.
#[utoipa::path(
    post,
    path = "/v1/presentations/verify",
    request_body = SubmitPresentationRequest,
    responses(
        (status = 200, description = "Proof accepted", body = VerifyOk),
        (status = 400, description = "Malformed submission", body = crate::error::ErrorBody),
        (status = 401, description = "Proof rejected", body = crate::error::VerifyFailure),
    ),
    tag = "presentations"
)]
async fn verify_presentation(
    State(state): State<AppState>,
    body: Result<Json<SubmitPresentationRequest>, JsonRejection>,
) -> Result<Json<VerifyOk>, AppError> {
    let submission: Submission = extract_json(body)?.into();
    let now = Timestamp::now();
    let service = Arc::clone(&state.service);
    run_blocking(move || service.verify_submission(submission, now)).await?;
    Ok(Json(VerifyOk {
        ok: true,
        verified_at: now.to_iso8601(),
    }))
}

/// POST /v1/presentations/verify-blocking: Create a request and wait for its verdict.
#[utoipa::path(
    post,
    path = "/v1/presentations/verify-blocking",
    request_body = VerifyBlockingRequest,
    responses(
        (status = 200, description = "Request settled", body = VerifyBlockingResponse),
        (status = 408, description = "No verdict before the timeout", body = VerifyBlockingResponse),
    ),
    tag = "presentations"
)]
async fn verify_blocking(
    State(state): State<AppState>,
    body: Result<Json<VerifyBlockingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<VerifyBlockingResponse>), AppError> {
    let req = extract_validated_json(body)?;
    let timeout = Duration::from_secs(req.timeout_secs.unwrap_or(state.config.wait_timeout_secs));
    let input = CreateRequest {
        schema_json: schema_text(req.schema_json),
        public_inputs: req.public_inputs.unwrap_or_default(),
        ..CreateRequest::default()
    };

    let service = Arc::clone(&state.service);
    let request = run_blocking(move || service.create_request(input, Timestamp::now())).await?;
    let id = request.request_id;
    let started = Instant::now();

    match state.service.wait_for_result(&id, timeout).await {
        WaitOutcome::Completed(verdict) => {
            tracing::info!(
                request_id = %id,
                state = verdict.state.as_str(),
                waited_ms = started.elapsed().as_millis() as u64,
                "verify_blocking.settled"
            );
            Ok((
                StatusCode::OK,
                Json(VerifyBlockingResponse {
                    request_id: id.to_string(),
                    ok: verdict.ok,
                    state: verdict.state.as_str().to_string(),
                    reason: verdict.reason,
                }),
            ))
        }
        WaitOutcome::TimedOut => {
            tracing::info!(request_id = %id, timeout_secs = timeout.as_secs(), "verify_blocking.timeout");
            Ok((
                StatusCode::REQUEST_TIMEOUT,
                Json(VerifyBlockingResponse {
                    request_id: id.to_string(),
                    ok: false,
                    state: "pending".into(),
                    reason: None,
                }),
            ))
        }
    }
}

/// GET /v1/presentations/{id}: Plain-text summary with the wallet deeplink.
#[utoipa::path(
    get,
    path = "/v1/presentations/{id}",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Summary", body = String, content_type = "text/plain"),
        (status = 404, description = "Unknown request", body = crate::error::ErrorBody),
        (status = 410, description = "Expired", body = crate::error::ErrorBody),
    ),
    tag = "presentations"
)]
async fn show_presentation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, AppError> {
    let id = parse_id(&id).ok_or_else(unknown)?;
    let request = state.service.pending_request(&id, Timestamp::now())?;
    let descriptor_url = descriptor_url(state.service.config(), &id);

    Ok(format!(
        "Presentation request {id}\n\n\
         Schema:   {}\n\
         Audience: {}\n\
         Expires:  {}\n\n\
         Open in your wallet:\n  {}\n\n\
         Descriptor:\n  {descriptor_url}\n",
        request.schema_hash,
        request.audience().unwrap_or_default(),
        request.expires_at,
        deeplink(&descriptor_url),
    ))
}

/// GET /v1/presentations/{id}/descriptor: Wallet descriptor.
#[utoipa::path(
    get,
    path = "/v1/presentations/{id}/descriptor",
    params(("id" = String, Path, description = "Request id")),
    responses(
        (status = 200, description = "Descriptor JSON"),
        (status = 404, description = "Unknown request", body = crate::error::ErrorBody),
        (status = 410, description = "Expired", body = crate::error::ErrorBody),
    ),
    tag = "presentations"
)]
async fn get_descriptor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PresentationDescriptor>, AppError> {
    let id = parse_id(&id).ok_or_else(unknown)?;
    Ok(Json(state.service.descriptor(&id, Timestamp::now())?))
}

/// GET /v1/presentations/{id}/status: Request liveness.
#[utoipa::path(
    get,
    path = "/v1/presentations/{id}/status",
    params(("id" = String, Path, description = "Request id")),
    responses((status = 200, description = "Request state", body = StatusResponse)),
    tag = "presentations"
)]
async fn get_status(State(state): State<AppState>, Path(id): Path<String>) -> Json<StatusResponse> {
    let status = match parse_id(&id) {
        Some(id) => state.service.status(&id, Timestamp::now()),
        None => RequestStatus::UnknownOrConsumed,
    };
    Json(StatusResponse { state: status })
}

/// GET /v1/presentations/{id}/result: Verdict, or the pending state.
#[utoipa::path(
    get,
    path = "/v1/presentations/{id}/result",
    params(("id" = String, Path, description = "Request id")),
    responses((status = 200, description = "Verdict view")),
    tag = "presentations"
)]
async fn get_result(State(state): State<AppState>, Path(id): Path<String>) -> Json<ResultView> {
    let view = match parse_id(&id) {
        Some(id) => state.service.result(&id, Timestamp::now()),
        None => ResultView::bare(zkattest_protocol::ResultState::Unknown),
    };
    Json(view)
}
