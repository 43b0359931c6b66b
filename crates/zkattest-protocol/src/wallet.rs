//! Holder-side helpers: turn a descriptor plus private values into a
//! submission the verifier will accept.

use std::sync::Arc;

use rand::{CryptoRng, RngCore};
use serde_json::{Map, Value};
use zkattest_schema::SchemaDefinition;
use zkattest_zkp::{encode_base64, ProofPipeline, ProvingArtifacts};

use crate::descriptor::PresentationDescriptor;
use crate::error::ProtocolError;
use crate::model::Submission;

/// Holder values overlaid by the verifier's pinned values. Pinned keys win.
pub fn merge_inputs(pinned: &Map<String, Value>, holder: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = holder.clone();
    for (k, v) in pinned {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// Assign `values`, prove, and return the base64 envelope.
pub fn prove_blob<R: RngCore + CryptoRng>(
    schema: &SchemaDefinition,
    artifacts: Arc<ProvingArtifacts>,
    values: &Map<String, Value>,
    rng: &mut R,
) -> Result<String, ProtocolError> {
    let result = ProofPipeline::new(schema.clone())
        .compile()?
        .with_keys(artifacts)
        .assign(values)?
        .prove(rng)?
        .into_result();
    Ok(encode_base64(&result)?)
}

/// Build the submission for `descriptor` from the holder's private values.
///
/// Only inputs that name a schema field are assigned to the circuit; the
/// full pinned map is echoed back so audience, nonce and any challenge
/// are bound even when the schema does not declare them.
pub fn build_submission<R: RngCore + CryptoRng>(
    descriptor: &PresentationDescriptor,
    schema: &SchemaDefinition,
    artifacts: Arc<ProvingArtifacts>,
    holder: &Map<String, Value>,
    rng: &mut R,
) -> Result<Submission, ProtocolError> {
    let merged = merge_inputs(&descriptor.public_inputs, holder);
    let values: Map<String, Value> = merged
        .into_iter()
        .filter(|(k, _)| schema.field(k).is_some())
        .collect();
    let blob = prove_blob(schema, artifacts, &values, rng)?;

    Ok(Submission {
        request_id: descriptor.request_id.to_string(),
        zkp_blob_b64: blob,
        public_inputs: descriptor.public_inputs.clone(),
        challenge: (!descriptor.challenge.is_empty()).then(|| descriptor.challenge.clone()),
    })
}
