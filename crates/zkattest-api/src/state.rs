//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. The presentation service owns every store;
//! the HTTP layer only adds configuration and the metrics handle.

use std::str::FromStr;
use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use zkattest_protocol::{PresentationService, ProtocolConfig};

/// Server configuration, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub public_base_url: String,
    pub audience: String,
    pub response_uri: String,
    pub request_ttl_secs: u64,
    pub verdict_retention_secs: u64,
    pub janitor_interval_secs: u64,
    /// Default timeout of the blocking wait.
    pub wait_timeout_secs: u64,
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 30;
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 180;

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(&get, "PORT", DEFAULT_PORT);
        let public_base_url = get("ZKATTEST_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();
        let defaults = ProtocolConfig::with_base_url(public_base_url.clone());

        Self {
            port,
            audience: get("ZKATTEST_AUDIENCE").unwrap_or(defaults.audience),
            response_uri: get("ZKATTEST_RESPONSE_URI").unwrap_or(defaults.response_uri),
            public_base_url,
            request_ttl_secs: parse_or(&get, "ZKATTEST_REQUEST_TTL_SECS", defaults.request_ttl_secs),
            verdict_retention_secs: parse_or(
                &get,
                "ZKATTEST_VERDICT_RETENTION_SECS",
                defaults.verdict_retention_secs,
            ),
            janitor_interval_secs: parse_or(
                &get,
                "ZKATTEST_JANITOR_INTERVAL_SECS",
                DEFAULT_JANITOR_INTERVAL_SECS,
            ),
            wait_timeout_secs: parse_or(&get, "ZKATTEST_WAIT_TIMEOUT_SECS", DEFAULT_WAIT_TIMEOUT_SECS),
        }
    }

    /// The protocol-level subset.
    pub fn protocol(&self) -> ProtocolConfig {
        ProtocolConfig {
            audience: self.audience.clone(),
            public_base_url: self.public_base_url.clone(),
            response_uri: self.response_uri.clone(),
            request_ttl_secs: self.request_ttl_secs,
            verdict_retention_secs: self.verdict_retention_secs,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match get(key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "invalid number, using default");
            default
        }),
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: Arc<PresentationService>,
    /// Renders `/metrics`. Absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let service = PresentationService::new(config.protocol());
        Self::with_service(config, service)
    }

    pub fn with_service(config: AppConfig, service: PresentationService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
