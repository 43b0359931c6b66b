/// Protocol-level settings. The HTTP layer builds one from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Pinned as `public_inputs.aud` on every request.
    pub audience: String,
    /// Prefix of every URL handed to wallets.
    pub public_base_url: String,
    /// Where wallets POST submissions.
    pub response_uri: String,
    pub request_ttl_secs: u64,
    pub verdict_retention_secs: u64,
}

pub const DEFAULT_AUDIENCE: &str = "http://localhost";
pub const DEFAULT_REQUEST_TTL_SECS: u64 = 300;
pub const DEFAULT_VERDICT_RETENTION_SECS: u64 = 900;

impl ProtocolConfig {
    /// Defaults rooted at `public_base_url`.
    pub fn with_base_url(public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            audience: DEFAULT_AUDIENCE.to_string(),
            response_uri: format!("{public_base_url}/v1/presentations/verify"),
            public_base_url,
            request_ttl_secs: DEFAULT_REQUEST_TTL_SECS,
            verdict_retention_secs: DEFAULT_VERDICT_RETENTION_SECS,
        }
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self::with_base_url("http://localhost:8080")
    }
}
