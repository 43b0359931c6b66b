//! Protocol counters, recorded through the `metrics` facade. Without an
//! installed recorder these are no-ops.

use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_request_created() {
    counter!("zkattest_requests_created_total").increment(1);
}

pub fn record_verification(outcome: &'static str, reason: &'static str) {
    counter!("zkattest_verifications_total", "outcome" => outcome, "reason" => reason).increment(1);
}

pub fn record_setup(elapsed: Duration) {
    counter!("zkattest_setup_total").increment(1);
    histogram!("zkattest_setup_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_webhook(outcome: &'static str) {
    counter!("zkattest_webhook_deliveries_total", "outcome" => outcome).increment(1);
}
