//! # Artifact Codec
//!
//! Binary envelope for a proof result:
//!
//! ```text
//! u32-LE len | proof          (arkworks compressed)
//! u32-LE len | verifying key  (arkworks compressed)
//! u32-LE len | public witness (arkworks compressed Vec<Fr>)
//! ```
//!
//! The envelope is `borsh`, which rejects truncated input, bad length
//! prefixes and trailing bytes. Each section must also be consumed exactly.
//! A transaction hash is never encoded; decoding yields `tx_hash = None`.

use ark_bn254::Fr;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, SerializationError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;

use crate::groth16::{Proof, ProvingKey, VerifyingKey};

/// Failure to encode or decode proof artifacts.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] std::io::Error),

    #[error("invalid proof: {0}")]
    Proof(#[source] SerializationError),

    #[error("invalid verifying key: {0}")]
    VerifyingKey(#[source] SerializationError),

    #[error("invalid proving key: {0}")]
    ProvingKey(#[source] SerializationError),

    #[error("invalid public witness: {0}")]
    PublicWitness(#[source] SerializationError),

    #[error("{section} has {count} trailing bytes")]
    TrailingBytes { section: &'static str, count: usize },

    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// A proof together with what is needed to check it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProofResult {
    pub proof: Proof,
    pub verifying_key: VerifyingKey,
    pub public_witness: Vec<Fr>,
    /// Set by callers that anchor proofs elsewhere. Not encoded.
    pub tx_hash: Option<String>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct Envelope {
    proof: Vec<u8>,
    verifying_key: Vec<u8>,
    public_witness: Vec<u8>,
}

fn to_bytes<T: CanonicalSerialize>(
    value: &T,
    wrap: fn(SerializationError) -> CodecError,
) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value.serialize_compressed(&mut bytes).map_err(wrap)?;
    Ok(bytes)
}

fn from_bytes<T: CanonicalDeserialize>(
    bytes: &[u8],
    section: &'static str,
    wrap: fn(SerializationError) -> CodecError,
) -> Result<T, CodecError> {
    let mut reader = bytes;
    let value = T::deserialize_compressed(&mut reader).map_err(wrap)?;
    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            section,
            count: reader.len(),
        });
    }
    Ok(value)
}

/// Encode a proof result into the binary envelope.
pub fn encode(result: &ProofResult) -> Result<Vec<u8>, CodecError> {
    let envelope = Envelope {
        proof: to_bytes(&result.proof, CodecError::Proof)?,
        verifying_key: to_bytes(&result.verifying_key, CodecError::VerifyingKey)?,
        public_witness: to_bytes(&result.public_witness, CodecError::PublicWitness)?,
    };
    borsh::to_vec(&envelope).map_err(CodecError::Envelope)
}

/// Decode the binary envelope. Curve points and field elements are validated.
pub fn decode(bytes: &[u8]) -> Result<ProofResult, CodecError> {
    let envelope: Envelope = borsh::from_slice(bytes).map_err(CodecError::Envelope)?;
    Ok(ProofResult {
        proof: from_bytes(&envelope.proof, "proof", CodecError::Proof)?,
        verifying_key: from_bytes(
            &envelope.verifying_key,
            "verifying key",
            CodecError::VerifyingKey,
        )?,
        public_witness: from_bytes(
            &envelope.public_witness,
            "public witness",
            CodecError::PublicWitness,
        )?,
        tx_hash: None,
    })
}

/// [`encode`], then standard padded base64.
pub fn encode_base64(result: &ProofResult) -> Result<String, CodecError> {
    Ok(STANDARD.encode(encode(result)?))
}

/// Standard padded base64, then [`decode`]. Surrounding whitespace is ignored.
pub fn decode_base64(text: &str) -> Result<ProofResult, CodecError> {
    decode(&STANDARD.decode(text.trim())?)
}

pub fn encode_proving_key(pk: &ProvingKey) -> Result<Vec<u8>, CodecError> {
    to_bytes(pk, CodecError::ProvingKey)
}

pub fn decode_proving_key(bytes: &[u8]) -> Result<ProvingKey, CodecError> {
    from_bytes(bytes, "proving key", CodecError::ProvingKey)
}

pub fn encode_verifying_key(vk: &VerifyingKey) -> Result<Vec<u8>, CodecError> {
    to_bytes(vk, CodecError::VerifyingKey)
}

pub fn decode_verifying_key(bytes: &[u8]) -> Result<VerifyingKey, CodecError> {
    from_bytes(bytes, "verifying key", CodecError::VerifyingKey)
}
