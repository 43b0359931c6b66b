//! # Presentation Descriptor
//!
//! What a wallet fetches after scanning a deeplink: where to get the
//! schema and proving key, which values it must echo as public inputs,
//! and where to submit.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zkattest_core::{ContentDigest, RequestId};

use crate::config::ProtocolConfig;
use crate::model::PresentationRequest;

pub const DEEPLINK_PREFIX: &str = "zkwallet://present?request_uri=";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    pub hash: ContentDigest,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactUrls {
    pub vk_url: String,
    pub pk_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationDescriptor {
    pub request_id: RequestId,
    pub audience: String,
    /// Unix seconds.
    pub expires_at: i64,
    /// Empty when the relying party set no challenge.
    pub challenge: String,
    pub nonce: String,
    pub schema: SchemaRef,
    pub artifacts: ArtifactUrls,
    pub submit_url: String,
    /// Server-pinned public values the prover must use verbatim.
    pub public_inputs: Map<String, Value>,
}

impl PresentationDescriptor {
    pub fn for_request(request: &PresentationRequest, config: &ProtocolConfig) -> Self {
        let base = config.public_base_url.trim_end_matches('/');
        let hash = request.schema_hash;
        Self {
            request_id: request.request_id,
            audience: request.audience().unwrap_or(&config.audience).to_string(),
            expires_at: request.expires_at.epoch_secs(),
            challenge: request.challenge().unwrap_or_default(),
            nonce: request.nonce().unwrap_or_default().to_string(),
            schema: SchemaRef {
                hash,
                uri: format!("{base}/v1/schemas/{hash}"),
            },
            artifacts: ArtifactUrls {
                vk_url: format!("{base}/v1/artifacts/{hash}/vk"),
                pk_url: format!("{base}/v1/artifacts/{hash}/pk"),
            },
            submit_url: request.response_uri.clone(),
            public_inputs: request.public_inputs.clone(),
        }
    }
}

pub fn request_url(config: &ProtocolConfig, id: &RequestId) -> String {
    format!("{}/v1/presentations/{id}", config.public_base_url.trim_end_matches('/'))
}

pub fn descriptor_url(config: &ProtocolConfig, id: &RequestId) -> String {
    format!("{}/descriptor", request_url(config, id))
}

/// `zkwallet://present?request_uri=<url-encoded descriptor URL>`.
pub fn deeplink(descriptor_url: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(descriptor_url.as_bytes()).collect();
    format!("{DEEPLINK_PREFIX}{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use zkattest_core::Timestamp;

    fn request() -> PresentationRequest {
        PresentationRequest {
            request_id: "6f1c1f8e-6b0a-4a57-9a52-0d3bb9a0f2a1".parse().unwrap(),
            schema_json: "{}".into(),
            schema_hash: "sha256:4444444444444444444444444444444444444444444444444444444444444444"
                .parse()
                .unwrap(),
            public_inputs: json!({"aud": "https://rp.example", "nonce": "n-9", "current_year": 2024})
                .as_object()
                .cloned()
                .unwrap(),
            response_uri: "https://v.example/v1/presentations/verify".into(),
            expires_at: Timestamp::from_epoch_secs(1_721_045_100).unwrap(),
            callback: None,
        }
    }

    #[test]
    fn urls_are_rooted_at_base() {
        let config = ProtocolConfig::with_base_url("https://v.example");
        let d = PresentationDescriptor::for_request(&request(), &config);
        let hash = "sha256:4444444444444444444444444444444444444444444444444444444444444444";
        assert_eq!(d.schema.uri, format!("https://v.example/v1/schemas/{hash}"));
        assert_eq!(d.artifacts.vk_url, format!("https://v.example/v1/artifacts/{hash}/vk"));
        assert_eq!(d.artifacts.pk_url, format!("https://v.example/v1/artifacts/{hash}/pk"));
        assert_eq!(d.submit_url, "https://v.example/v1/presentations/verify");
        assert_eq!(d.audience, "https://rp.example");
        assert_eq!(d.nonce, "n-9");
        assert_eq!(d.challenge, "");
        assert_eq!(d.expires_at, 1_721_045_100);
        assert_eq!(d.public_inputs["current_year"], 2024);
    }

    #[test]
    fn deeplink_encodes_descriptor_url() {
        let config = ProtocolConfig::with_base_url("https://v.example");
        let id = request().request_id;
        let url = descriptor_url(&config, &id);
        assert_eq!(
            url,
            "https://v.example/v1/presentations/6f1c1f8e-6b0a-4a57-9a52-0d3bb9a0f2a1/descriptor"
        );
        assert_eq!(
            deeplink(&url),
            "zkwallet://present?request_uri=https%3A%2F%2Fv.example%2Fv1%2Fpresentations%2F6f1c1f8e-6b0a-4a57-9a52-0d3bb9a0f2a1%2Fdescriptor"
        );
    }
}
