//! # zkattest-protocol: Presentation Protocol
//!
//! A relying party asks the verifier for a presentation request. The
//! verifier pins an audience, a fresh nonce and today's date as public
//! inputs, generates (or reuses) Groth16 keys for the schema, and hands
//! out a descriptor. The wallet proves against the pinned values and
//! submits; the verifier consumes the request, checks the bindings and the
//! proof with its own verifying key, and records a verdict that pollers,
//! blocking waiters and webhooks observe.
//!
//! ## Architecture
//!
//! - **Model** (`model.rs`): requests, submissions, verdicts, poll views.
//! - **Stores** (`store.rs`): key cache, request store and verdict store
//!   traits with in-memory implementations.
//! - **Service** (`service.rs`): `PresentationService`, the state object
//!   behind every protocol operation.
//! - **Waiters** (`waiter.rs`): oneshot registry for blocking waits.
//! - **Webhooks** (`webhook.rs`): `VerdictSink` and the signed HTTP
//!   dispatcher.
//! - **Descriptor** (`descriptor.rs`): wallet-facing view and deeplinks.
//! - **Wallet** (`wallet.rs`): holder-side proof construction.
//!
//! ## Crate Policy
//!
//! - Every operation takes "now" explicitly; only key metadata reads the
//!   clock.
//! - Locks are `parking_lot` and never held across `.await`.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod metrics;
pub mod model;
pub mod service;
pub mod store;
pub mod waiter;
pub mod wallet;
pub mod webhook;

pub use config::ProtocolConfig;
pub use descriptor::{deeplink, descriptor_url, request_url, PresentationDescriptor};
pub use error::{LookupError, ProtocolError, VerificationError};
pub use model::{
    Callback, CreateRequest, PresentationRequest, RequestStatus, ResultState, ResultView,
    Submission, Verdict, VerdictState, WaitOutcome,
};
pub use service::{PresentationService, ServiceParts};
pub use store::{
    InMemoryKeyStore, InMemoryRequestStore, InMemoryVerdictStore, KeyStore, RequestStore,
    SchemaKeys, VerdictStore,
};
pub use wallet::{build_submission, merge_inputs, prove_blob};
pub use webhook::{sign, VerdictSink, WebhookDispatcher, WebhookPayload};
