//! # Groth16 Backend
//!
//! Groth16 over BN254 via arkworks. Proving first checks satisfiability
//! of the assigned circuit so that an invalid witness is reported as
//! [`ProofError::Unsatisfied`] instead of producing a proof that will
//! never verify.

use ark_bn254::{Bn254, Fr};
use ark_groth16::Groth16;
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::circuit::DynamicCircuit;
use crate::traits::{ProofError, ProofSystem, VerifyError};

pub type ProvingKey = ark_groth16::ProvingKey<Bn254>;
pub type VerifyingKey = ark_groth16::VerifyingKey<Bn254>;
pub type Proof = ark_groth16::Proof<Bn254>;

/// The Groth16/BN254 proof system.
#[derive(Debug, Default, Clone, Copy)]
pub struct Groth16Backend;

impl ProofSystem for Groth16Backend {
    type Circuit = DynamicCircuit;
    type ProvingKey = ProvingKey;
    type VerifyingKey = VerifyingKey;
    type Proof = Proof;
    type PublicInput = Fr;

    fn setup<R: RngCore + CryptoRng>(
        &self,
        circuit: DynamicCircuit,
        rng: &mut R,
    ) -> Result<(ProvingKey, VerifyingKey), ProofError> {
        Groth16::<Bn254>::circuit_specific_setup(circuit.blank(), rng)
            .map_err(|e| ProofError::SetupFailed(e.to_string()))
    }

    fn prove<R: RngCore + CryptoRng>(
        &self,
        pk: &ProvingKey,
        circuit: DynamicCircuit,
        rng: &mut R,
    ) -> Result<Proof, ProofError> {
        if !circuit.is_assigned() {
            return Err(ProofError::MissingAssignment);
        }
        let satisfied = circuit
            .is_satisfied()
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))?;
        if !satisfied {
            let label = circuit
                .unsatisfied_constraint()
                .map_err(|e| ProofError::GenerationFailed(e.to_string()))?
                .unwrap_or("input domain")
                .to_string();
            return Err(ProofError::Unsatisfied(label));
        }
        Groth16::<Bn254>::prove(pk, circuit, rng)
            .map_err(|e| ProofError::GenerationFailed(e.to_string()))
    }

    fn verify(
        &self,
        vk: &VerifyingKey,
        proof: &Proof,
        public_inputs: &[Fr],
    ) -> Result<bool, VerifyError> {
        let expected = vk.gamma_abc_g1.len().saturating_sub(1);
        if public_inputs.len() != expected {
            return Err(VerifyError::InputCount {
                expected,
                found: public_inputs.len(),
            });
        }
        Groth16::<Bn254>::verify(vk, public_inputs, proof)
            .map_err(|e| VerifyError::Malformed(e.to_string()))
    }
}
