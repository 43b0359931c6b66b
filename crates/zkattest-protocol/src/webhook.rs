//! # Verdict Webhooks
//!
//! Fire-and-forget POST of a settled verdict to the relying party's
//! callback URL. The body is signed with HMAC-SHA256 when the request
//! carries a secret. Delivery runs on a spawned tokio task so that the
//! verification path never waits on the network.

use std::time::Duration;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zkattest_core::{ContentDigest, RequestId, Timestamp};

use crate::model::{PresentationRequest, Verdict, VerdictState};

pub const SIGNATURE_HEADER: &str = "X-ZKP-Signature";
pub const REQUEST_ID_HEADER: &str = "X-ZKP-Request-Id";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Receives every verdict together with the request it settles.
pub trait VerdictSink: Send + Sync {
    fn deliver(&self, request: &PresentationRequest, verdict: &Verdict);
}

/// JSON body of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub request_id: RequestId,
    pub schema_hash: ContentDigest,
    pub state: VerdictState,
    pub ok: bool,
    pub reason: Option<String>,
    pub verified_at: Option<Timestamp>,
}

impl From<&Verdict> for WebhookPayload {
    fn from(v: &Verdict) -> Self {
        Self {
            request_id: v.request_id,
            schema_hash: v.schema_hash,
            state: v.state,
            ok: v.ok,
            reason: v.reason.clone(),
            verified_at: v.verified_at,
        }
    }
}

/// Lowercase hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Delivers verdicts over HTTP with `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
}

impl WebhookDispatcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl VerdictSink for WebhookDispatcher {
    fn deliver(&self, request: &PresentationRequest, verdict: &Verdict) {
        let Some(callback) = request.callback.clone() else {
            return;
        };
        let body = match serde_json::to_vec(&WebhookPayload::from(verdict)) {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(request_id = %verdict.request_id, error = %e, "webhook payload not serializable");
                return;
            }
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(request_id = %verdict.request_id, "no async runtime, webhook dropped");
            crate::metrics::record_webhook("dropped");
            return;
        };

        let mut builder = self
            .client
            .post(&callback.url)
            .timeout(DELIVERY_TIMEOUT)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(REQUEST_ID_HEADER, verdict.request_id.to_string());
        if let Some(secret) = callback.secret.as_deref() {
            builder = builder.header(SIGNATURE_HEADER, sign(secret, &body));
        }
        let request_id = verdict.request_id;

        runtime.spawn(async move {
            match builder.body(body).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!(%request_id, status = %resp.status(), "webhook delivered");
                    crate::metrics::record_webhook("delivered");
                }
                Ok(resp) => {
                    tracing::warn!(%request_id, url = %callback.url, status = %resp.status(), "webhook rejected");
                    crate::metrics::record_webhook("rejected");
                }
                Err(e) => {
                    tracing::warn!(%request_id, url = %callback.url, error = %e, "webhook delivery failed");
                    crate::metrics::record_webhook("failed");
                }
            }
        });
    }
}
