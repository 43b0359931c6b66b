//! # Request Metrics
//!
//! Per-response counters and a latency histogram, recorded through the
//! `metrics` facade and exposed by the Prometheus recorder at `/metrics`.
//! Labels are method and status only; paths carry request ids.

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, histogram};

/// Count every response, and every 4xx/5xx as an error.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().as_str().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    record_response(method, response.status(), started.elapsed());
    response
}

fn record_response(method: String, status: StatusCode, elapsed: Duration) {
    let status_label = status.as_u16().to_string();
    counter!(
        "zkattest_http_requests_total",
        "method" => method.clone(),
        "status" => status_label.clone()
    )
    .increment(1);
    if status.is_client_error() || status.is_server_error() {
        counter!(
            "zkattest_http_errors_total",
            "method" => method,
            "status" => status_label
        )
        .increment(1);
    }
    histogram!("zkattest_http_request_duration_seconds").record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusBuilder;

    #[test]
    fn errors_are_counted_separately() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_response("GET".into(), StatusCode::OK, Duration::from_millis(3));
            record_response("POST".into(), StatusCode::UNAUTHORIZED, Duration::from_millis(5));
        });
        let text = handle.render();
        assert!(text.contains(r#"zkattest_http_requests_total{method="GET",status="200"} 1"#));
        assert!(text.contains(r#"zkattest_http_requests_total{method="POST",status="401"} 1"#));
        assert!(text.contains(r#"zkattest_http_errors_total{method="POST",status="401"} 1"#));
        assert!(!text.contains(r#"zkattest_http_errors_total{method="GET""#));
        assert!(text.contains("zkattest_http_request_duration_seconds"));
    }
}
