//! # Proof System Trait
//!
//! Abstract interface over the proving backend. The trait is sealed:
//! [`Groth16Backend`](crate::groth16::Groth16Backend) is the only
//! implementation, and the protocol layer is written against the trait so
//! the key and proof types stay opaque to it.

use ark_std::rand::{CryptoRng, RngCore};
use thiserror::Error;

/// Error during setup or proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    /// Key generation failed.
    #[error("setup failed: {0}")]
    SetupFailed(String),

    /// Not every slot of the circuit holds a value.
    #[error("circuit has unassigned inputs")]
    MissingAssignment,

    /// The assigned values violate a constraint. No proof is produced.
    #[error("constraint not satisfied: {0}")]
    Unsatisfied(String),

    /// Internal prover error.
    #[error("prover error: {0}")]
    GenerationFailed(String),
}

/// Error during proof verification. A proof that simply does not verify
/// is `Ok(false)`, not an error.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The public input count does not match the verifying key.
    #[error("verifying key expects {expected} public inputs, got {found}")]
    InputCount { expected: usize, found: usize },

    /// The backend rejected the key or inputs as malformed.
    #[error("verification error: {0}")]
    Malformed(String),
}

mod private {
    pub trait Sealed {}
    impl Sealed for crate::groth16::Groth16Backend {}
}

/// A zero-knowledge proof system over a circuit type.
pub trait ProofSystem: private::Sealed + Send + Sync {
    type Circuit;
    type ProvingKey: Send + Sync;
    type VerifyingKey: Clone + Send + Sync;
    type Proof: Clone + Send + Sync;
    type PublicInput;

    /// Circuit-specific setup. `circuit` is synthesized without values.
    fn setup<R: RngCore + CryptoRng>(
        &self,
        circuit: Self::Circuit,
        rng: &mut R,
    ) -> Result<(Self::ProvingKey, Self::VerifyingKey), ProofError>;

    /// Prove an assigned circuit.
    fn prove<R: RngCore + CryptoRng>(
        &self,
        pk: &Self::ProvingKey,
        circuit: Self::Circuit,
        rng: &mut R,
    ) -> Result<Self::Proof, ProofError>;

    /// Verify a proof against the given public inputs.
    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public_inputs: &[Self::PublicInput],
    ) -> Result<bool, VerifyError>;
}
