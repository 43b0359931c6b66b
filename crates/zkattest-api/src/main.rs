//! # zkattest-api: Binary Entry Point
//!
//! Starts the verifier service. Configuration comes from the environment
//! (see [`AppConfig`]); `LOG_FORMAT=json` switches to JSON log lines.

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use zkattest_api::janitor::Janitor;
use zkattest_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let prometheus = PrometheusBuilder::new().install_recorder().map_err(|e| {
        tracing::error!("Prometheus recorder installation failed: {e}");
        e
    })?;

    // No HTTP exporter is running, so histogram upkeep is driven here.
    let upkeep = prometheus.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    let config = AppConfig::from_env();
    let port = config.port;
    let janitor_interval = Duration::from_secs(config.janitor_interval_secs);
    let state = AppState::new(config).with_prometheus(prometheus);

    // Keys for the built-in schema are generated up front so the first
    // request does not pay for setup.
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || {
        match zkattest_schema::age_over_18() {
            Ok(schema) => match service.ensure_keys(&schema) {
                Ok(keys) => tracing::info!(schema_hash = %keys.schema_hash, "built-in keys ready"),
                Err(e) => tracing::warn!("built-in key setup failed: {e}"),
            },
            Err(e) => tracing::warn!("built-in schema invalid: {e}"),
        }
    });

    let janitor = Janitor::start(Arc::clone(&state.service), janitor_interval);
    let app = zkattest_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("zkattest API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;

    janitor.shutdown().await;
    Ok(())
}
