//! # Proof Lifecycle
//!
//! Typestate pipeline from schema to proof result:
//!
//! ```text
//! Uncompiled --compile--> Compiled --setup/with_keys--> KeyedUp
//!     --assign--> Witnessed --prove--> Proved --into_result--> ProofResult
//! ```
//!
//! Each transition consumes the pipeline, so stages cannot be skipped or
//! repeated. Only the methods valid for the current stage exist on it.

use std::fmt;
use std::sync::Arc;

use ark_relations::r1cs::SynthesisError;
use ark_std::rand::{CryptoRng, RngCore};
use serde_json::{Map, Value};
use thiserror::Error;
use zkattest_schema::SchemaDefinition;

use crate::circuit::{AssignmentError, CompilationError, DynamicCircuit};
use crate::codec::ProofResult;
use crate::groth16::{Groth16Backend, ProvingKey, VerifyingKey};
use crate::traits::{ProofError, ProofSystem};

/// Keys produced by one setup for one schema hash.
#[derive(Debug, Clone)]
pub struct ProvingArtifacts {
    pub proving_key: ProvingKey,
    pub verifying_key: VerifyingKey,
}

/// Any failure along the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Compilation(#[from] CompilationError),

    #[error("circuit synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Assignment(#[from] AssignmentError),

    #[error(transparent)]
    Proof(#[from] ProofError),
}

// ─── Stages ──────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Uncompiled {
    schema: SchemaDefinition,
}

#[derive(Debug)]
pub struct Compiled {
    circuit: DynamicCircuit,
    constraint_count: usize,
}

#[derive(Debug)]
pub struct KeyedUp {
    circuit: DynamicCircuit,
    keys: Arc<ProvingArtifacts>,
}

#[derive(Debug)]
pub struct Witnessed {
    circuit: DynamicCircuit,
    keys: Arc<ProvingArtifacts>,
}

#[derive(Debug)]
pub struct Proved {
    result: ProofResult,
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Uncompiled {}
    impl Sealed for super::Compiled {}
    impl Sealed for super::KeyedUp {}
    impl Sealed for super::Witnessed {}
    impl Sealed for super::Proved {}
}

/// Marker trait for pipeline stages. Sealed.
pub trait Stage: private::Sealed + fmt::Debug {
    fn name() -> &'static str;
}

impl Stage for Uncompiled {
    fn name() -> &'static str {
        "uncompiled"
    }
}
impl Stage for Compiled {
    fn name() -> &'static str {
        "compiled"
    }
}
impl Stage for KeyedUp {
    fn name() -> &'static str {
        "keyed_up"
    }
}
impl Stage for Witnessed {
    fn name() -> &'static str {
        "witnessed"
    }
}
impl Stage for Proved {
    fn name() -> &'static str {
        "proved"
    }
}

/// A proof in progress, in stage `S`.
#[derive(Debug)]
pub struct ProofPipeline<S: Stage> {
    backend: Groth16Backend,
    stage: S,
}

impl<S: Stage> ProofPipeline<S> {
    pub fn stage_name(&self) -> &'static str {
        S::name()
    }
}

impl ProofPipeline<Uncompiled> {
    pub fn new(schema: SchemaDefinition) -> Self {
        Self {
            backend: Groth16Backend,
            stage: Uncompiled { schema },
        }
    }

    /// Build the circuit and synthesize it once without values.
    pub fn compile(self) -> Result<ProofPipeline<Compiled>, PipelineError> {
        let circuit = DynamicCircuit::new(&self.stage.schema)?;
        let constraint_count = circuit.constraint_count()?;
        tracing::debug!(
            schema_id = self.stage.schema.schema_id(),
            constraint_count,
            "circuit compiled"
        );
        Ok(ProofPipeline {
            backend: self.backend,
            stage: Compiled {
                circuit,
                constraint_count,
            },
        })
    }
}

impl ProofPipeline<Compiled> {
    pub fn circuit(&self) -> &DynamicCircuit {
        &self.stage.circuit
    }

    pub fn constraint_count(&self) -> usize {
        self.stage.constraint_count
    }

    /// Run a fresh circuit-specific setup.
    pub fn setup<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<ProofPipeline<KeyedUp>, PipelineError> {
        let (proving_key, verifying_key) = self.backend.setup(self.stage.circuit.blank(), rng)?;
        let keys = Arc::new(ProvingArtifacts {
            proving_key,
            verifying_key,
        });
        Ok(self.with_keys(keys))
    }

    /// Reuse keys from an earlier setup of the same schema.
    pub fn with_keys(self, keys: Arc<ProvingArtifacts>) -> ProofPipeline<KeyedUp> {
        ProofPipeline {
            backend: self.backend,
            stage: KeyedUp {
                circuit: self.stage.circuit,
                keys,
            },
        }
    }
}

impl ProofPipeline<KeyedUp> {
    pub fn keys(&self) -> &Arc<ProvingArtifacts> {
        &self.stage.keys
    }

    /// Assign input values to a fresh clone of the circuit.
    pub fn assign(
        self,
        values: &Map<String, Value>,
    ) -> Result<ProofPipeline<Witnessed>, PipelineError> {
        let mut circuit = self.stage.circuit.blank();
        circuit.assign_values(values)?;
        Ok(ProofPipeline {
            backend: self.backend,
            stage: Witnessed {
                circuit,
                keys: self.stage.keys,
            },
        })
    }
}

impl ProofPipeline<Witnessed> {
    pub fn prove<R: RngCore + CryptoRng>(
        self,
        rng: &mut R,
    ) -> Result<ProofPipeline<Proved>, PipelineError> {
        let Witnessed { circuit, keys } = self.stage;
        let public_witness = circuit
            .public_inputs()
            .ok_or(ProofError::MissingAssignment)?;
        let proof = self.backend.prove(&keys.proving_key, circuit, rng)?;
        Ok(ProofPipeline {
            backend: self.backend,
            stage: Proved {
                result: ProofResult {
                    proof,
                    verifying_key: keys.verifying_key.clone(),
                    public_witness,
                    tx_hash: None,
                },
            },
        })
    }
}

impl ProofPipeline<Proved> {
    pub fn result(&self) -> &ProofResult {
        &self.stage.result
    }

    pub fn into_result(self) -> ProofResult {
        self.stage.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use zkattest_schema::age_over_18;

    fn inputs(birth_year: u32) -> Map<String, Value> {
        json!({
            "birth_year": birth_year, "birth_month": 3, "birth_day": 9,
            "current_year": 2024, "current_month": 7, "current_day": 15,
            "aud": "https://rp.example", "nonce": "abc"
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn full_pipeline_produces_verifiable_result() {
        let mut rng = StdRng::seed_from_u64(42);
        let compiled = ProofPipeline::new(age_over_18().unwrap()).compile().unwrap();
        assert_eq!(compiled.stage_name(), "compiled");
        assert!(compiled.constraint_count() > 0);

        let keyed = compiled.setup(&mut rng).unwrap();
        let proved = keyed
            .assign(&inputs(1990))
            .unwrap()
            .prove(&mut rng)
            .unwrap();
        assert_eq!(proved.stage_name(), "proved");
        let result = proved.into_result();
        assert_eq!(result.public_witness.len(), 5);
        assert!(Groth16Backend
            .verify(&result.verifying_key, &result.proof, &result.public_witness)
            .unwrap());
    }

    #[test]
    fn keys_are_reusable_across_pipelines() {
        let mut rng = StdRng::seed_from_u64(43);
        let schema = age_over_18().unwrap();
        let first = ProofPipeline::new(schema.clone())
            .compile()
            .unwrap()
            .setup(&mut rng)
            .unwrap();
        let keys = Arc::clone(first.keys());

        let second = ProofPipeline::new(schema)
            .compile()
            .unwrap()
            .with_keys(keys)
            .assign(&inputs(2001))
            .unwrap()
            .prove(&mut rng)
            .unwrap()
            .into_result();
        assert!(Groth16Backend
            .verify(&first.keys().verifying_key, &second.proof, &second.public_witness)
            .unwrap());
    }

    #[test]
    fn underage_witness_fails_to_prove() {
        let mut rng = StdRng::seed_from_u64(44);
        let witnessed = ProofPipeline::new(age_over_18().unwrap())
            .compile()
            .unwrap()
            .setup(&mut rng)
            .unwrap()
            .assign(&inputs(2010))
            .unwrap();
        assert!(matches!(
            witnessed.prove(&mut rng),
            Err(PipelineError::Proof(ProofError::Unsatisfied(_)))
        ));
    }

    #[test]
    fn assignment_errors_surface() {
        let mut rng = StdRng::seed_from_u64(45);
        let keyed = ProofPipeline::new(age_over_18().unwrap())
            .compile()
            .unwrap()
            .setup(&mut rng)
            .unwrap();
        let mut missing = inputs(1990);
        missing.remove("birth_day");
        assert!(matches!(
            keyed.assign(&missing),
            Err(PipelineError::Assignment(AssignmentError::MissingRequired(f))) if f == "birth_day"
        ));
    }
}
