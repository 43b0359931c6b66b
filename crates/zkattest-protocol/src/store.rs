//! # Stores
//!
//! The three shared maps of the verifier: cached keys per schema hash,
//! pending requests, and settled verdicts. Each is a trait so that a
//! persistent backend can replace the in-memory one without touching the
//! service. The in-memory implementations use `parking_lot::RwLock`, and
//! no lock is ever held across an `.await`.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;
use zkattest_core::{ContentDigest, RequestId, Timestamp};
use zkattest_schema::SchemaDefinition;
use zkattest_zkp::{DynamicCircuit, ProvingArtifacts};

use crate::model::{PresentationRequest, Verdict};

// -- Generic In-Memory Map ----------------------------------------------------

/// Thread-safe, cloneable in-memory map.
#[derive(Debug)]
pub struct MemoryMap<K, V> {
    data: Arc<RwLock<HashMap<K, V>>>,
}

impl<K, V> Clone for MemoryMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> MemoryMap<K, V> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.data.write().insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.data.read().get(key).cloned()
    }

    /// Remove and return a record. Two racing callers cannot both get it.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.data.write().remove(key)
    }

    /// Remove every record matching `pred` under one write lock.
    pub fn drain_where(&self, mut pred: impl FnMut(&V) -> bool) -> Vec<V> {
        let mut guard = self.data.write();
        let keys: Vec<K> = guard
            .iter()
            .filter(|(_, v)| pred(v))
            .map(|(k, _)| k)
            .cloned()
            .collect();
        keys.iter().filter_map(|k| guard.remove(k)).collect()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash + Clone, V: Clone> Default for MemoryMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// -- Key Cache ----------------------------------------------------------------

/// Everything the verifier holds for one schema hash.
#[derive(Debug)]
pub struct SchemaKeys {
    pub schema_hash: ContentDigest,
    pub schema: Arc<SchemaDefinition>,
    /// Unassigned circuit the keys were generated for.
    pub circuit: DynamicCircuit,
    pub artifacts: Arc<ProvingArtifacts>,
    /// Compressed proving key, served to wallets.
    pub proving_key_bytes: Vec<u8>,
    /// Compressed verifying key, served to anyone.
    pub verifying_key_bytes: Vec<u8>,
    /// Layout fingerprint of the circuit the keys were generated for.
    pub layout_fingerprint: ContentDigest,
    pub constraint_count: usize,
    pub created_at: Timestamp,
}

pub trait KeyStore: Send + Sync {
    fn get(&self, hash: &ContentDigest) -> Option<Arc<SchemaKeys>>;
    fn insert(&self, keys: Arc<SchemaKeys>);
    /// Drop the keys for a hash so they are never used again.
    fn evict(&self, hash: &ContentDigest) -> Option<Arc<SchemaKeys>>;
    fn len(&self) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryKeyStore {
    keys: MemoryMap<ContentDigest, Arc<SchemaKeys>>,
}

impl KeyStore for InMemoryKeyStore {
    fn get(&self, hash: &ContentDigest) -> Option<Arc<SchemaKeys>> {
        self.keys.get(hash)
    }

    fn insert(&self, keys: Arc<SchemaKeys>) {
        self.keys.insert(keys.schema_hash, keys);
    }

    fn evict(&self, hash: &ContentDigest) -> Option<Arc<SchemaKeys>> {
        self.keys.remove(hash)
    }

    fn len(&self) -> usize {
        self.keys.len()
    }
}

// -- Requests -----------------------------------------------------------------

pub trait RequestStore: Send + Sync {
    fn save(&self, request: PresentationRequest);
    /// Read without consuming.
    fn load(&self, id: &RequestId) -> Option<PresentationRequest>;
    /// Atomically remove and return. The consumption point of the protocol.
    fn take(&self, id: &RequestId) -> Option<PresentationRequest>;
    /// Atomically remove every request expired at `now`.
    fn drain_expired(&self, now: Timestamp) -> Vec<PresentationRequest>;
    fn len(&self) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRequestStore {
    requests: MemoryMap<RequestId, PresentationRequest>,
}

impl RequestStore for InMemoryRequestStore {
    fn save(&self, request: PresentationRequest) {
        self.requests.insert(request.request_id, request);
    }

    fn load(&self, id: &RequestId) -> Option<PresentationRequest> {
        self.requests.get(id)
    }

    fn take(&self, id: &RequestId) -> Option<PresentationRequest> {
        self.requests.remove(id)
    }

    fn drain_expired(&self, now: Timestamp) -> Vec<PresentationRequest> {
        self.requests.drain_where(|r| r.is_expired(now))
    }

    fn len(&self) -> usize {
        self.requests.len()
    }
}

// -- Verdicts -----------------------------------------------------------------

pub trait VerdictStore: Send + Sync {
    fn record(&self, verdict: Verdict);
    fn get(&self, id: &RequestId) -> Option<Verdict>;
    /// Remove verdicts recorded more than `max_age_secs` before `now`.
    fn purge_older_than(&self, now: Timestamp, max_age_secs: u64) -> usize;
    fn len(&self) -> usize;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryVerdictStore {
    verdicts: MemoryMap<RequestId, Verdict>,
}

impl VerdictStore for InMemoryVerdictStore {
    fn record(&self, verdict: Verdict) {
        self.verdicts.insert(verdict.request_id, verdict);
    }

    fn get(&self, id: &RequestId) -> Option<Verdict> {
        self.verdicts.get(id)
    }

    fn purge_older_than(&self, now: Timestamp, max_age_secs: u64) -> usize {
        let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
        self.verdicts
            .drain_where(|v| now.seconds_since(&v.recorded_at) > max_age)
            .len()
    }

    fn len(&self) -> usize {
        self.verdicts.len()
    }
}
