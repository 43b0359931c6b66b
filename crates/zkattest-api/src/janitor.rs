//! # Janitor
//!
//! Periodic sweep of expired requests and stale verdicts. Expired
//! requests found by the sweep settle as `expired`, which wakes blocking
//! waiters and fires webhooks the same way an expired submission would.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use zkattest_core::Timestamp;
use zkattest_protocol::PresentationService;

/// Handle to the background sweep.
pub struct Janitor {
    shutdown: watch::Sender<bool>,
    worker: JoinHandle<()>,
}

impl Janitor {
    /// Start sweeping every `interval` (at least one second).
    pub fn start(service: Arc<PresentationService>, interval: Duration) -> Self {
        let (tx, mut rx) = watch::channel(false);
        let interval = interval.max(Duration::from_secs(1));

        let worker = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        sweep(&service, Timestamp::now());
                    }
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("janitor stopped");
        });

        Self {
            shutdown: tx,
            worker,
        }
    }

    /// Stop the sweep and wait for the task to finish.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_ok() {
            let _ = self.worker.await;
        }
    }
}

/// One pass. Returns (expired requests, purged verdicts).
pub fn sweep(service: &PresentationService, now: Timestamp) -> (usize, usize) {
    let expired = service.sweep_expired_requests(now);
    let purged = service.purge_expired_verdicts(now);
    if expired > 0 || purged > 0 {
        tracing::info!(expired, purged, "janitor sweep");
    }
    (expired, purged)
}
