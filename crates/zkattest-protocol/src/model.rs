//! # Protocol Data Model
//!
//! Requests, submissions and verdicts as they move between the relying
//! party, the verifier and the wallet.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zkattest_core::{ContentDigest, RequestId, Timestamp};

/// Public input keys the verifier pins on every request.
pub const AUD_KEY: &str = "aud";
pub const NONCE_KEY: &str = "nonce";
pub const CHALLENGE_KEY: &str = "challenge";
pub const CURRENT_YEAR_KEY: &str = "current_year";
pub const CURRENT_MONTH_KEY: &str = "current_month";
pub const CURRENT_DAY_KEY: &str = "current_day";

/// Where to POST the verdict once the request is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub url: String,
    /// HMAC-SHA256 key for `X-ZKP-Signature`. Unsigned when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

/// A pending, single-use request for a zero-knowledge presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationRequest {
    pub request_id: RequestId,
    /// JCS-canonical schema text.
    pub schema_json: String,
    pub schema_hash: ContentDigest,
    pub public_inputs: Map<String, Value>,
    pub response_uri: String,
    /// Unix seconds on the wire.
    #[serde(with = "epoch_secs")]
    pub expires_at: Timestamp,
    /// Server-side only, never sent to wallets.
    #[serde(skip)]
    pub callback: Option<Callback>,
}

impl PresentationRequest {
    pub fn audience(&self) -> Option<&str> {
        self.public_inputs.get(AUD_KEY).and_then(Value::as_str)
    }

    pub fn nonce(&self) -> Option<&str> {
        self.public_inputs.get(NONCE_KEY).and_then(Value::as_str)
    }

    /// The caller-supplied challenge, if the relying party set one.
    pub fn challenge(&self) -> Option<String> {
        self.public_inputs
            .get(CHALLENGE_KEY)
            .filter(|v| !v.is_null())
            .map(value_text)
    }

    /// Expired strictly after `expires_at`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }
}

/// Input to [`create_request`](crate::PresentationService::create_request).
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    /// Schema text. `None` selects the built-in age schema.
    pub schema_json: Option<String>,
    /// Caller extras. Server-pinned keys override these.
    pub public_inputs: Map<String, Value>,
    /// Falls back to the configured TTL.
    pub ttl_secs: Option<u64>,
    pub callback: Option<Callback>,
}

/// A wallet's answer to a presentation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub request_id: String,
    pub zkp_blob_b64: String,
    #[serde(default)]
    pub public_inputs: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
}

/// Terminal state of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictState {
    Verified,
    Failed,
    Expired,
}

impl VerdictState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Expired => "expired",
        }
    }
}

/// Outcome recorded when a request is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub request_id: RequestId,
    pub schema_hash: ContentDigest,
    pub state: VerdictState,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
    pub recorded_at: Timestamp,
}

/// Result of a blocking wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    Completed(Verdict),
    TimedOut,
}

/// Liveness of a request, as seen by pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Expired,
    UnknownOrConsumed,
}

/// Poll state, covering both pending requests and verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultState {
    Pending,
    Verified,
    Failed,
    Expired,
    Unknown,
}

impl From<VerdictState> for ResultState {
    fn from(state: VerdictState) -> Self {
        match state {
            VerdictState::Verified => Self::Verified,
            VerdictState::Failed => Self::Failed,
            VerdictState::Expired => Self::Expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultView {
    pub state: ResultState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<Timestamp>,
}

impl ResultView {
    pub fn bare(state: ResultState) -> Self {
        Self {
            state,
            ok: None,
            reason: None,
            verified_at: None,
        }
    }
}

impl From<&Verdict> for ResultView {
    fn from(v: &Verdict) -> Self {
        Self {
            state: v.state.into(),
            ok: Some(v.ok),
            reason: v.reason.clone(),
            verified_at: v.verified_at,
        }
    }
}

/// Textual form of a public input for binding comparisons.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

mod epoch_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use zkattest_core::Timestamp;

    pub fn serialize<S: Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(ts.epoch_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
        let secs = i64::deserialize(d)?;
        Timestamp::from_epoch_secs(secs).map_err(D::Error::custom)
    }
}
