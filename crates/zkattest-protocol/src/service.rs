//! # Presentation Service
//!
//! The verifier's state object. It creates single-use requests, keeps one
//! set of Groth16 keys per schema hash, and settles each request exactly
//! once: a submission removes the request from the store before anything
//! else is checked, so a replay finds nothing whether the first attempt
//! passed or failed.
//!
//! Key generation, proving and verification are CPU-bound. Async callers
//! should run [`ensure_keys`](PresentationService::ensure_keys),
//! [`create_request`](PresentationService::create_request) and
//! [`verify_submission`](PresentationService::verify_submission) on a
//! blocking thread.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::rngs::OsRng;
use serde_json::{Map, Value};
use zkattest_core::{ContentDigest, Nonce, RequestId, Timestamp};
use zkattest_schema::{age_over_18, parse_schema_str, Constraint, SchemaDefinition};
use zkattest_zkp::codec::{encode_proving_key, encode_verifying_key};
use zkattest_zkp::{decode_base64, normalize, DynamicCircuit, Groth16Backend, ProofSystem, ProvingArtifacts};

use crate::config::ProtocolConfig;
use crate::descriptor::PresentationDescriptor;
use crate::error::{LookupError, ProtocolError, VerificationError};
use crate::metrics;
use crate::model::{
    value_text, CreateRequest, PresentationRequest, RequestStatus, ResultState, ResultView,
    Submission, Verdict, VerdictState, WaitOutcome, AUD_KEY, CURRENT_DAY_KEY, CURRENT_MONTH_KEY,
    CURRENT_YEAR_KEY, NONCE_KEY,
};
use crate::store::{
    InMemoryKeyStore, InMemoryRequestStore, InMemoryVerdictStore, KeyStore, RequestStore,
    SchemaKeys, VerdictStore,
};
use crate::waiter::WaiterRegistry;
use crate::webhook::{VerdictSink, WebhookDispatcher};

/// Pluggable collaborators of the service.
pub struct ServiceParts {
    pub keys: Arc<dyn KeyStore>,
    pub requests: Arc<dyn RequestStore>,
    pub verdicts: Arc<dyn VerdictStore>,
    pub sink: Arc<dyn VerdictSink>,
}

impl Default for ServiceParts {
    fn default() -> Self {
        Self {
            keys: Arc::new(InMemoryKeyStore::default()),
            requests: Arc::new(InMemoryRequestStore::default()),
            verdicts: Arc::new(InMemoryVerdictStore::default()),
            sink: Arc::new(WebhookDispatcher::default()),
        }
    }
}

pub struct PresentationService {
    config: ProtocolConfig,
    keys: Arc<dyn KeyStore>,
    requests: Arc<dyn RequestStore>,
    verdicts: Arc<dyn VerdictStore>,
    waiters: WaiterRegistry,
    sink: Arc<dyn VerdictSink>,
    setup_guard: Mutex<()>,
    backend: Groth16Backend,
}

impl std::fmt::Debug for PresentationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentationService")
            .field("config", &self.config)
            .field("cached_keys", &self.keys.len())
            .field("pending_requests", &self.requests.len())
            .field("verdicts", &self.verdicts.len())
            .finish()
    }
}

impl PresentationService {
    /// In-memory stores and HTTP webhooks.
    pub fn new(config: ProtocolConfig) -> Self {
        Self::from_parts(config, ServiceParts::default())
    }

    pub fn from_parts(config: ProtocolConfig, parts: ServiceParts) -> Self {
        Self {
            config,
            keys: parts.keys,
            requests: parts.requests,
            verdicts: parts.verdicts,
            waiters: WaiterRegistry::new(),
            sink: parts.sink,
            setup_guard: Mutex::new(()),
            backend: Groth16Backend,
        }
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Cached keys for a schema hash, if setup has run for it.
    pub fn keys_for(&self, hash: &ContentDigest) -> Option<Arc<SchemaKeys>> {
        self.keys.get(hash)
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    // -- Keys -----------------------------------------------------------------

    /// Return the keys for `schema`, running setup on first use.
    ///
    /// Concurrent first uses are serialized on the setup guard and re-check
    /// the cache after acquiring it, so each schema hash is set up once.
    pub fn ensure_keys(&self, schema: &SchemaDefinition) -> Result<Arc<SchemaKeys>, ProtocolError> {
        let hash = schema.schema_hash();
        if let Some(keys) = self.keys.get(&hash) {
            tracing::debug!(schema_hash = %hash, "key cache hit");
            return Ok(keys);
        }

        let _guard = self.setup_guard.lock();
        if let Some(keys) = self.keys.get(&hash) {
            tracing::debug!(schema_hash = %hash, "key cache hit after setup wait");
            return Ok(keys);
        }

        let started = Instant::now();
        let circuit = DynamicCircuit::new(schema)?;
        let constraint_count = circuit
            .constraint_count()
            .map_err(|e| zkattest_zkp::ProofError::SetupFailed(e.to_string()))?;
        let (proving_key, verifying_key) = self.backend.setup(circuit.blank(), &mut OsRng)?;
        let keys = Arc::new(SchemaKeys {
            schema_hash: hash,
            schema: Arc::new(schema.clone()),
            layout_fingerprint: circuit.fingerprint(),
            circuit,
            proving_key_bytes: encode_proving_key(&proving_key)?,
            verifying_key_bytes: encode_verifying_key(&verifying_key)?,
            artifacts: Arc::new(ProvingArtifacts {
                proving_key,
                verifying_key,
            }),
            constraint_count,
            created_at: Timestamp::now(),
        });
        self.keys.insert(Arc::clone(&keys));

        let elapsed = started.elapsed();
        metrics::record_setup(elapsed);
        tracing::info!(
            schema_hash = %hash,
            schema_id = schema.schema_id(),
            constraint_count,
            elapsed_ms = elapsed.as_millis() as u64,
            "generated proving keys"
        );
        Ok(keys)
    }

    // -- Requests -------------------------------------------------------------

    /// Create and store a new single-use request.
    pub fn create_request(
        &self,
        input: CreateRequest,
        now: Timestamp,
    ) -> Result<PresentationRequest, ProtocolError> {
        let schema = match input.schema_json.as_deref() {
            Some(text) => parse_schema_str(text)?,
            None => age_over_18()?,
        };
        let keys = self.ensure_keys(&schema)?;

        let nonce = Nonce::generate();
        let today = now.calendar_date();
        let mut public_inputs = input.public_inputs;
        public_inputs.insert(AUD_KEY.into(), Value::String(self.config.audience.clone()));
        public_inputs.insert(NONCE_KEY.into(), Value::String(nonce.as_str().to_string()));
        public_inputs.insert(CURRENT_YEAR_KEY.into(), Value::from(today.year));
        public_inputs.insert(CURRENT_MONTH_KEY.into(), Value::from(today.month));
        public_inputs.insert(CURRENT_DAY_KEY.into(), Value::from(today.day));
        // Age checks may name their current-date fields freely.
        for constraint in schema.constraints() {
            if let Constraint::Age(age) = constraint {
                public_inputs.insert(age.current.year.clone(), Value::from(today.year));
                public_inputs.insert(age.current.month.clone(), Value::from(today.month));
                public_inputs.insert(age.current.day.clone(), Value::from(today.day));
            }
        }

        for field in keys.circuit.layout().public_fields() {
            if let Some(raw) = public_inputs.get(&field.name) {
                normalize(field, raw).map_err(|source| ProtocolError::PublicInput {
                    field: field.name.clone(),
                    source,
                })?;
            }
        }

        let ttl = input.ttl_secs.unwrap_or(self.config.request_ttl_secs);
        let request = PresentationRequest {
            request_id: RequestId::new(),
            schema_json: schema.canonical_json().as_str().to_string(),
            schema_hash: keys.schema_hash,
            public_inputs,
            response_uri: self.config.response_uri.clone(),
            expires_at: now.plus_secs(ttl),
            callback: input.callback,
        };
        self.requests.save(request.clone());

        metrics::record_request_created();
        tracing::info!(
            request_id = %request.request_id,
            schema_hash = %request.schema_hash,
            ttl_secs = ttl,
            "presentation request created"
        );
        Ok(request)
    }

    /// The wallet-facing view of a pending request.
    pub fn descriptor(
        &self,
        id: &RequestId,
        now: Timestamp,
    ) -> Result<PresentationDescriptor, LookupError> {
        let request = self.requests.load(id).ok_or(LookupError::NotFound)?;
        if request.is_expired(now) {
            return Err(LookupError::Expired);
        }
        Ok(PresentationDescriptor::for_request(&request, &self.config))
    }

    /// A pending request without consuming it.
    pub fn pending_request(
        &self,
        id: &RequestId,
        now: Timestamp,
    ) -> Result<PresentationRequest, LookupError> {
        let request = self.requests.load(id).ok_or(LookupError::NotFound)?;
        if request.is_expired(now) {
            return Err(LookupError::Expired);
        }
        Ok(request)
    }

    // -- Verification ---------------------------------------------------------

    /// Check a submission and settle its request.
    ///
    /// The request is consumed on every path past the lookup. On success
    /// the consumed request is returned.
    pub fn verify_submission(
        &self,
        submission: Submission,
        now: Timestamp,
    ) -> Result<PresentationRequest, VerificationError> {
        let id_text = submission.request_id.trim();
        if id_text.is_empty() {
            return Err(VerificationError::MalformedSubmission("request_id is required".into()));
        }
        if submission.zkp_blob_b64.trim().is_empty() {
            return Err(VerificationError::MalformedSubmission("zkp_blob_b64 is required".into()));
        }

        let request = id_text
            .parse::<RequestId>()
            .ok()
            .and_then(|id| self.requests.take(&id));
        let Some(request) = request else {
            metrics::record_verification("failed", VerificationError::NotFound.reason());
            tracing::info!(request_id = id_text, "submission for unknown or consumed request");
            return Err(VerificationError::NotFound);
        };

        match self.check(&request, &submission, now) {
            Ok(()) => {
                self.settle(&request, VerdictState::Verified, None, now);
                metrics::record_verification("verified", "ok");
                tracing::info!(
                    request_id = %request.request_id,
                    schema_hash = %request.schema_hash,
                    "presentation verified"
                );
                Ok(request)
            }
            Err(err) => {
                let state = match err {
                    VerificationError::Expired => VerdictState::Expired,
                    _ => VerdictState::Failed,
                };
                self.settle(&request, state, Some(err.reason()), now);
                metrics::record_verification(state.as_str(), err.reason());
                tracing::info!(
                    request_id = %request.request_id,
                    reason = err.reason(),
                    error = %err,
                    "presentation rejected"
                );
                Err(err)
            }
        }
    }

    fn check(
        &self,
        request: &PresentationRequest,
        submission: &Submission,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if request.is_expired(now) {
            return Err(VerificationError::Expired);
        }

        let submitted = |key: &str| submission.public_inputs.get(key).map(value_text);
        match (request.audience(), submitted(AUD_KEY)) {
            (Some(expected), Some(got)) if expected == got => {}
            _ => return Err(VerificationError::AudienceMismatch),
        }
        match (request.nonce(), submitted(NONCE_KEY)) {
            (Some(expected), Some(got)) if expected == got => {}
            _ => return Err(VerificationError::NonceMismatch),
        }
        if let Some(expected) = request.challenge() {
            let got = submission.challenge.as_deref().map(str::trim);
            if got != Some(expected.as_str()) {
                return Err(VerificationError::ChallengeMismatch);
            }
        }

        let blob = decode_base64(&submission.zkp_blob_b64)
            .map_err(|e| VerificationError::BadBlob(e.to_string()))?;

        let keys = self
            .keys
            .get(&request.schema_hash)
            .ok_or(VerificationError::KeyUnavailable)?;

        let circuit = self.recompile(request, &keys)?;

        let mut values: Map<String, Value> = submission.public_inputs.clone();
        for (k, v) in &request.public_inputs {
            values.insert(k.clone(), v.clone());
        }
        let expected = circuit
            .public_inputs_from(&values)
            .map_err(|e| VerificationError::PublicInputsInvalid(e.to_string()))?;
        if expected != blob.public_witness {
            return Err(VerificationError::PublicWitnessMismatch);
        }

        // The verifying key inside the blob is never trusted.
        match self
            .backend
            .verify(&keys.artifacts.verifying_key, &blob.proof, &expected)
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(VerificationError::VerifyFailed),
            Err(e) => {
                tracing::warn!(request_id = %request.request_id, error = %e, "verifier rejected inputs");
                Err(VerificationError::VerifyFailed)
            }
        }
    }

    /// Rebuild the circuit from the stored schema and make sure the cached
    /// keys were generated for the same layout. On divergence the keys are
    /// evicted and never used again.
    fn recompile(
        &self,
        request: &PresentationRequest,
        keys: &SchemaKeys,
    ) -> Result<DynamicCircuit, VerificationError> {
        let circuit = parse_schema_str(&request.schema_json)
            .ok()
            .and_then(|schema| DynamicCircuit::new(&schema).ok());
        match circuit {
            Some(c) if c.fingerprint() == keys.layout_fingerprint => Ok(c),
            other => {
                tracing::error!(
                    schema_hash = %request.schema_hash,
                    cached = %keys.layout_fingerprint,
                    recompiled = ?other.map(|c| c.fingerprint().to_string()),
                    "circuit layout diverged from cached keys, evicting"
                );
                self.keys.evict(&request.schema_hash);
                Err(VerificationError::LayoutDivergence)
            }
        }
    }

    /// Record a verdict, wake waiters and fire the webhook.
    fn settle(
        &self,
        request: &PresentationRequest,
        state: VerdictState,
        reason: Option<&str>,
        now: Timestamp,
    ) {
        let ok = state == VerdictState::Verified;
        let verdict = Verdict {
            request_id: request.request_id,
            schema_hash: request.schema_hash,
            state,
            ok,
            reason: reason.map(str::to_string),
            verified_at: ok.then_some(now),
            recorded_at: now,
        };
        self.verdicts.record(verdict.clone());
        self.waiters.notify(&request.request_id, &verdict);
        self.sink.deliver(request, &verdict);
    }

    // -- Polling and waiting --------------------------------------------------

    /// Wait up to `timeout` for the request to be settled.
    pub async fn wait_for_result(&self, id: &RequestId, timeout: Duration) -> WaitOutcome {
        if let Some(verdict) = self.verdicts.get(id) {
            return WaitOutcome::Completed(verdict);
        }
        let (token, rx) = self.waiters.register(*id);
        // A verdict recorded between the first check and registration.
        if let Some(verdict) = self.verdicts.get(id) {
            self.waiters.cancel(id, token);
            return WaitOutcome::Completed(verdict);
        }

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(verdict)) => WaitOutcome::Completed(verdict),
            Ok(Err(_)) => self
                .verdicts
                .get(id)
                .map_or(WaitOutcome::TimedOut, WaitOutcome::Completed),
            Err(_) => {
                self.waiters.cancel(id, token);
                WaitOutcome::TimedOut
            }
        }
    }

    /// Liveness of a request. An expired request is settled on the spot.
    pub fn status(&self, id: &RequestId, now: Timestamp) -> RequestStatus {
        match self.requests.load(id) {
            None => RequestStatus::UnknownOrConsumed,
            Some(request) if request.is_expired(now) => {
                if let Some(request) = self.requests.take(id) {
                    self.expire(&request, now);
                }
                RequestStatus::Expired
            }
            Some(_) => RequestStatus::Pending,
        }
    }

    /// Verdict view if settled, otherwise the request's liveness.
    pub fn result(&self, id: &RequestId, now: Timestamp) -> ResultView {
        if let Some(verdict) = self.verdicts.get(id) {
            return ResultView::from(&verdict);
        }
        match self.status(id, now) {
            RequestStatus::Pending => ResultView::bare(ResultState::Pending),
            RequestStatus::Expired => self
                .verdicts
                .get(id)
                .map_or(ResultView::bare(ResultState::Expired), |v| ResultView::from(&v)),
            RequestStatus::UnknownOrConsumed => ResultView::bare(ResultState::Unknown),
        }
    }

    fn expire(&self, request: &PresentationRequest, now: Timestamp) {
        let reason = VerificationError::Expired.reason();
        self.settle(request, VerdictState::Expired, Some(reason), now);
        metrics::record_verification("expired", reason);
        tracing::info!(request_id = %request.request_id, "presentation request expired");
    }

    // -- Housekeeping ---------------------------------------------------------

    /// Drop verdicts older than the retention window.
    pub fn purge_expired_verdicts(&self, now: Timestamp) -> usize {
        let purged = self
            .verdicts
            .purge_older_than(now, self.config.verdict_retention_secs);
        if purged > 0 {
            tracing::debug!(purged, "purged old verdicts");
        }
        purged
    }

    /// Settle every request that expired without being polled.
    pub fn sweep_expired_requests(&self, now: Timestamp) -> usize {
        let expired = self.requests.drain_expired(now);
        for request in &expired {
            self.expire(request, now);
        }
        expired.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::build_submission;
    use parking_lot::Mutex as PlMutex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        delivered: PlMutex<Vec<Verdict>>,
    }

    impl VerdictSink for RecordingSink {
        fn deliver(&self, _request: &PresentationRequest, verdict: &Verdict) {
            self.delivered.lock().push(verdict.clone());
        }
    }

    fn service() -> (PresentationService, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let parts = ServiceParts {
            sink: sink.clone(),
            ..ServiceParts::default()
        };
        let config = ProtocolConfig {
            audience: "https://rp.example".into(),
            ..ProtocolConfig::default()
        };
        (PresentationService::from_parts(config, parts), sink)
    }

    fn today() -> Timestamp {
        Timestamp::parse("2024-07-15T12:00:00Z").unwrap()
    }

    fn holder(birth_year: u32) -> Map<String, Value> {
        json!({"birth_year": birth_year, "birth_month": 3, "birth_day": 9})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn submission_for(
        svc: &PresentationService,
        request: &PresentationRequest,
        birth_year: u32,
    ) -> Submission {
        let keys = svc.keys_for(&request.schema_hash).unwrap();
        let descriptor = PresentationDescriptor::for_request(request, svc.config());
        let mut rng = StdRng::seed_from_u64(11);
        build_submission(
            &descriptor,
            &keys.schema,
            Arc::clone(&keys.artifacts),
            &holder(birth_year),
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn create_pins_server_inputs() {
        let (svc, _) = service();
        let extras = json!({"aud": "https://spoofed", "purpose": "bar-entry"});
        let request = svc
            .create_request(
                CreateRequest {
                    public_inputs: extras.as_object().cloned().unwrap(),
                    ..CreateRequest::default()
                },
                today(),
            )
            .unwrap();
        assert_eq!(request.audience(), Some("https://rp.example"));
        assert_eq!(request.public_inputs["purpose"], "bar-entry");
        assert_eq!(request.public_inputs["current_year"], 2024);
        assert_eq!(request.public_inputs["current_month"], 7);
        assert_eq!(request.public_inputs["current_day"], 15);
        assert_eq!(request.expires_at, today().plus_secs(300));
        assert!(request.nonce().is_some_and(|n| !n.is_empty()));
    }

    #[test]
    fn renamed_current_date_fields_are_pinned() {
        let (svc, _) = service();
        let schema = json!({
            "fields": [
                {"name": "by", "type": "integer", "required": true},
                {"name": "bm", "type": "integer", "required": true},
                {"name": "bd", "type": "integer", "required": true},
                {"name": "cy", "type": "integer", "public": true, "required": true},
                {"name": "cm", "type": "integer", "public": true, "required": true},
                {"name": "cd", "type": "integer", "public": true, "required": true}
            ],
            "constraints": [{
                "type": "age_verification",
                "fields": ["by", "bm", "bd", "cy", "cm", "cd"],
                "value": 18
            }]
        });
        let request = svc
            .create_request(
                CreateRequest {
                    schema_json: Some(schema.to_string()),
                    public_inputs: json!({"cy": 2040}).as_object().cloned().unwrap(),
                    ..CreateRequest::default()
                },
                today(),
            )
            .unwrap();
        assert_eq!(request.public_inputs["cy"], 2024);
        assert_eq!(request.public_inputs["cm"], 7);
        assert_eq!(request.public_inputs["cd"], 15);

        // A holder who proves against a later "today" is caught by the witness binding.
        let keys = svc.keys_for(&request.schema_hash).unwrap();
        let mut descriptor = PresentationDescriptor::for_request(&request, svc.config());
        descriptor.public_inputs.insert("cy".into(), json!(2040));
        let holder = json!({"by": 2020, "bm": 1, "bd": 1}).as_object().cloned().unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let forged = build_submission(
            &descriptor,
            &keys.schema,
            Arc::clone(&keys.artifacts),
            &holder,
            &mut rng,
        )
        .unwrap();
        assert!(matches!(
            svc.verify_submission(forged, today()),
            Err(VerificationError::PublicWitnessMismatch)
        ));
    }

    #[test]
    fn keys_are_generated_once_per_schema() {
        let (svc, _) = service();
        let schema = age_over_18().unwrap();
        let a = svc.ensure_keys(&schema).unwrap();
        let b = svc.ensure_keys(&schema).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!a.verifying_key_bytes.is_empty());
        assert!(a.proving_key_bytes.len() > a.verifying_key_bytes.len());
    }

    #[test]
    fn end_to_end_then_replay_is_not_found() {
        let (svc, sink) = service();
        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let submission = submission_for(&svc, &request, 1990);

        let settled = svc.verify_submission(submission.clone(), today()).unwrap();
        assert_eq!(settled.request_id, request.request_id);

        let view = svc.result(&request.request_id, today());
        assert_eq!(view.state, ResultState::Verified);
        assert_eq!(view.ok, Some(true));

        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::NotFound)
        );
        assert_eq!(sink.delivered.lock().len(), 1);
    }

    #[test]
    fn failure_also_consumes_request() {
        let (svc, sink) = service();
        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let mut submission = submission_for(&svc, &request, 1990);
        submission.zkp_blob_b64 = "AAAA".into();

        assert!(matches!(
            svc.verify_submission(submission.clone(), today()),
            Err(VerificationError::BadBlob(_))
        ));
        assert_eq!(
            svc.status(&request.request_id, today()),
            RequestStatus::UnknownOrConsumed
        );
        let delivered = sink.delivered.lock();
        assert_eq!(delivered[0].state, VerdictState::Failed);
        assert_eq!(delivered[0].reason.as_deref(), Some("bad_blob"));
    }

    #[test]
    fn binding_rejects_wrong_audience_and_nonce() {
        let (svc, _) = service();

        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let mut submission = submission_for(&svc, &request, 1990);
        submission.public_inputs.insert("aud".into(), json!("https://other.example"));
        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::AudienceMismatch)
        );

        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let mut submission = submission_for(&svc, &request, 1990);
        submission.public_inputs.insert("nonce".into(), json!("replayed"));
        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::NonceMismatch)
        );

        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let mut submission = submission_for(&svc, &request, 1990);
        submission.public_inputs.remove("aud");
        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::AudienceMismatch)
        );
    }

    #[test]
    fn challenge_must_be_echoed() {
        let (svc, _) = service();
        let create = CreateRequest {
            public_inputs: json!({"challenge": "c-77"}).as_object().cloned().unwrap(),
            ..CreateRequest::default()
        };
        let request = svc.create_request(create.clone(), today()).unwrap();
        let mut submission = submission_for(&svc, &request, 1990);
        assert_eq!(submission.challenge.as_deref(), Some("c-77"));
        submission.challenge = Some("c-78".into());
        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::ChallengeMismatch)
        );

        let request = svc.create_request(create, today()).unwrap();
        let submission = submission_for(&svc, &request, 1990);
        assert!(svc.verify_submission(submission, today()).is_ok());
    }

    #[test]
    fn proof_for_another_request_is_rejected() {
        let (svc, _) = service();
        let first = svc.create_request(CreateRequest::default(), today()).unwrap();
        let second = svc.create_request(CreateRequest::default(), today()).unwrap();

        // Proof bound to the first nonce, submitted with the second's inputs.
        let proof_for_first = submission_for(&svc, &first, 1990);
        let mut submission = submission_for(&svc, &second, 1990);
        submission.zkp_blob_b64 = proof_for_first.zkp_blob_b64;
        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::PublicWitnessMismatch)
        );
    }

    #[test]
    fn expired_request_records_expired_verdict() {
        let (svc, sink) = service();
        let create = CreateRequest {
            ttl_secs: Some(0),
            ..CreateRequest::default()
        };
        let request = svc.create_request(create, today()).unwrap();
        let submission = submission_for(&svc, &request, 1990);

        let later = today().plus_secs(1);
        assert_eq!(
            svc.verify_submission(submission.clone(), later),
            Err(VerificationError::Expired)
        );
        assert_eq!(
            svc.status(&request.request_id, later),
            RequestStatus::UnknownOrConsumed
        );
        assert_eq!(svc.result(&request.request_id, later).state, ResultState::Expired);
        assert_eq!(sink.delivered.lock()[0].state, VerdictState::Expired);
    }

    #[test]
    fn polling_an_expired_request_settles_it() {
        let (svc, _) = service();
        let create = CreateRequest {
            ttl_secs: Some(0),
            ..CreateRequest::default()
        };
        let request = svc.create_request(create, today()).unwrap();
        let id = request.request_id;
        assert_eq!(svc.status(&id, today()), RequestStatus::Pending);
        assert!(svc.descriptor(&id, today()).is_ok());

        let later = today().plus_secs(1);
        assert_eq!(svc.descriptor(&id, later), Err(LookupError::Expired));
        assert_eq!(svc.status(&id, later), RequestStatus::Expired);
        assert!(svc.requests.load(&id).is_none());
        assert_eq!(svc.result(&id, later).reason.as_deref(), Some("request_expired"));
    }

    #[test]
    fn malformed_submission_leaves_store_untouched() {
        let (svc, _) = service();
        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let submission = Submission {
            request_id: request.request_id.to_string(),
            ..Submission::default()
        };
        assert!(matches!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::MalformedSubmission(_))
        ));
        assert_eq!(svc.status(&request.request_id, today()), RequestStatus::Pending);
        assert_eq!(
            svc.result(&RequestId::new(), today()),
            ResultView::bare(ResultState::Unknown)
        );
    }

    #[test]
    fn sweep_and_purge() {
        let (svc, _) = service();
        let create = CreateRequest {
            ttl_secs: Some(0),
            ..CreateRequest::default()
        };
        let request = svc.create_request(create, today()).unwrap();
        svc.create_request(CreateRequest::default(), today()).unwrap();

        assert_eq!(svc.sweep_expired_requests(today().plus_secs(1)), 1);
        assert_eq!(svc.pending_requests(), 1);
        assert_eq!(
            svc.result(&request.request_id, today().plus_secs(1)).state,
            ResultState::Expired
        );

        assert_eq!(svc.purge_expired_verdicts(today().plus_secs(901)), 0);
        assert_eq!(svc.purge_expired_verdicts(today().plus_secs(902)), 1);
        assert_eq!(
            svc.result(&request.request_id, today().plus_secs(902)).state,
            ResultState::Unknown
        );
    }

    #[test]
    fn invalid_pinned_input_is_rejected_at_creation() {
        let (svc, _) = service();
        let schema = json!({
            "fields": [
                {"name": "score", "type": "integer", "required": true},
                {"name": "threshold", "type": "integer", "public": true, "required": true}
            ],
            "constraints": [{"type": "comparison", "fields": ["score", "threshold"], "operator": "ge"}]
        });
        let create = CreateRequest {
            schema_json: Some(schema.to_string()),
            public_inputs: json!({"threshold": "high"}).as_object().cloned().unwrap(),
            ..CreateRequest::default()
        };
        assert!(matches!(
            svc.create_request(create, today()),
            Err(ProtocolError::PublicInput { field, .. }) if field == "threshold"
        ));
    }

    #[test]
    fn diverged_layout_evicts_keys() {
        let (svc, _) = service();
        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let submission = submission_for(&svc, &request, 1990);

        // Stored canonical text no longer matches the cached layout.
        let mut tampered = svc.requests.take(&request.request_id).unwrap();
        tampered.schema_json = tampered.schema_json.replace("\"public\":true", "\"public\":false");
        svc.requests.save(tampered);

        assert_eq!(
            svc.verify_submission(submission, today()),
            Err(VerificationError::LayoutDivergence)
        );
        assert!(svc.keys_for(&request.schema_hash).is_none());
    }

    #[tokio::test]
    async fn waiter_is_woken_by_verdict() {
        let (svc, _) = service();
        let svc = Arc::new(svc);
        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let submission = submission_for(&svc, &request, 1990);
        let id = request.request_id;

        let waiter = {
            let svc = Arc::clone(&svc);
            tokio::spawn(async move { svc.wait_for_result(&id, Duration::from_secs(30)).await })
        };
        while svc.waiters.waiting(&id) == 0 {
            tokio::task::yield_now().await;
        }
        svc.verify_submission(submission, today()).unwrap();

        match waiter.await.unwrap() {
            WaitOutcome::Completed(v) => assert_eq!(v.state, VerdictState::Verified),
            WaitOutcome::TimedOut => panic!("waiter timed out"),
        }
        // Already settled: returns immediately.
        assert!(matches!(
            svc.wait_for_result(&id, Duration::from_millis(1)).await,
            WaitOutcome::Completed(_)
        ));
    }

    #[tokio::test]
    async fn waiter_timeout_cleans_up_registration() {
        let (svc, _) = service();
        let request = svc.create_request(CreateRequest::default(), today()).unwrap();
        let id = request.request_id;
        assert_eq!(
            svc.wait_for_result(&id, Duration::from_millis(20)).await,
            WaitOutcome::TimedOut
        );
        assert_eq!(svc.waiters.waiting(&id), 0);
    }
}
