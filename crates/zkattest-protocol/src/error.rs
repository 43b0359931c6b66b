//! # Protocol Errors
//!
//! Two families. [`ProtocolError`] covers the relying-party side of the
//! protocol (creating requests and generating keys). [`VerificationError`]
//! covers everything that can go wrong with a wallet's submission, and each
//! variant carries a stable machine reason that ends up in verdicts,
//! webhooks and metrics labels.

use thiserror::Error;
use zkattest_schema::SchemaError;
use zkattest_zkp::{CodecError, CompilationError, ConversionError, PipelineError, ProofError};

/// Failure while creating a presentation request or preparing its keys.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("schema cannot be compiled: {0}")]
    Compilation(#[from] CompilationError),

    #[error("key setup failed: {0}")]
    Setup(#[from] ProofError),

    #[error("key serialization failed: {0}")]
    Serialization(#[from] CodecError),

    #[error("proving failed: {0}")]
    Pipeline(#[from] PipelineError),

    /// A caller-pinned public input does not normalize for its field.
    #[error("public input {field} is invalid: {source}")]
    PublicInput {
        field: String,
        #[source]
        source: ConversionError,
    },
}

/// Why a submission was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("malformed submission: {0}")]
    MalformedSubmission(String),

    #[error("request not found or already used")]
    NotFound,

    #[error("request expired")]
    Expired,

    #[error("audience mismatch")]
    AudienceMismatch,

    #[error("nonce mismatch")]
    NonceMismatch,

    #[error("challenge mismatch")]
    ChallengeMismatch,

    #[error("invalid proof blob: {0}")]
    BadBlob(String),

    #[error("verifying key unavailable for schema")]
    KeyUnavailable,

    #[error("invalid public inputs: {0}")]
    PublicInputsInvalid(String),

    #[error("public witness does not match the request")]
    PublicWitnessMismatch,

    #[error("circuit layout diverged from cached keys")]
    LayoutDivergence,

    #[error("proof verification failed")]
    VerifyFailed,
}

impl VerificationError {
    /// Stable machine-readable reason.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MalformedSubmission(_) => "malformed_submission",
            Self::NotFound => "request_not_found",
            Self::Expired => "request_expired",
            Self::AudienceMismatch => "aud_mismatch",
            Self::NonceMismatch => "nonce_mismatch",
            Self::ChallengeMismatch => "challenge_mismatch",
            Self::BadBlob(_) => "bad_blob",
            Self::KeyUnavailable => "key_unavailable",
            Self::PublicInputsInvalid(_) => "public_inputs_invalid",
            Self::PublicWitnessMismatch => "public_witness_mismatch",
            Self::LayoutDivergence => "layout_divergence",
            Self::VerifyFailed => "verify_failed",
        }
    }
}

/// Lookup of a request that is not currently pending.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("request not found")]
    NotFound,

    #[error("request expired")]
    Expired,
}
