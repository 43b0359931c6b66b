//! # Waiter Registry
//!
//! Parked callers of the blocking wait, keyed by request id. A verdict
//! wakes every waiter of its request at once. A waiter that times out
//! removes only its own registration.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::oneshot;
use zkattest_core::RequestId;

use crate::model::Verdict;

/// Identifies one registration so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterToken(u64);

#[derive(Debug, Default)]
pub struct WaiterRegistry {
    waiters: Mutex<HashMap<RequestId, Vec<(WaiterToken, oneshot::Sender<Verdict>)>>>,
    next_token: AtomicU64,
}

impl WaiterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a new waiter for `id`.
    pub fn register(&self, id: RequestId) -> (WaiterToken, oneshot::Receiver<Verdict>) {
        let token = WaiterToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().entry(id).or_default().push((token, tx));
        (token, rx)
    }

    /// Remove one registration. The entry disappears with its last waiter.
    pub fn cancel(&self, id: &RequestId, token: WaiterToken) {
        let mut waiters = self.waiters.lock();
        if let Some(list) = waiters.get_mut(id) {
            list.retain(|(t, _)| *t != token);
            if list.is_empty() {
                waiters.remove(id);
            }
        }
    }

    /// Deliver `verdict` to every waiter of `id`. Returns how many were woken.
    pub fn notify(&self, id: &RequestId, verdict: &Verdict) -> usize {
        let list = self.waiters.lock().remove(id).unwrap_or_default();
        list.into_iter()
            .map(|(_, tx)| tx.send(verdict.clone()).is_ok())
            .filter(|delivered| *delivered)
            .count()
    }

    /// Number of parked waiters for `id`.
    pub fn waiting(&self, id: &RequestId) -> usize {
        self.waiters.lock().get(id).map_or(0, Vec::len)
    }
}
