//! # zkattest-zkp: Schema-Driven Circuits
//!
//! Turns a validated constraint schema into a Groth16 circuit over BN254
//! and runs the setup/prove/verify lifecycle on it.
//!
//! ## Architecture
//!
//! - **Normalizer** (`normalize.rs`): typed JSON input values to field
//!   elements.
//! - **Circuit** (`circuit.rs`): `DynamicCircuit`, the slot layout, the
//!   compiled constraint plan and the R1CS gadgets for range, comparison
//!   and age constraints.
//! - **Traits** (`traits.rs`): the sealed `ProofSystem` interface.
//! - **Groth16** (`groth16.rs`): the arkworks backend.
//! - **Lifecycle** (`lifecycle.rs`): typestate `ProofPipeline`.
//! - **Codec** (`codec.rs`): the binary proof envelope and key encodings.
//!
//! ## Crate Policy
//!
//! - Cryptographic and parsing failures are errors, never panics.
//! - Nothing here reads the clock. Dates reach the circuit as inputs.

pub mod circuit;
pub mod codec;
pub mod groth16;
pub mod lifecycle;
pub mod normalize;
pub mod traits;

pub use ark_bn254::Fr;
pub use circuit::{AssignmentError, CircuitLayout, CompilationError, DynamicCircuit, Slot};
pub use codec::{decode, decode_base64, encode, encode_base64, CodecError, ProofResult};
pub use groth16::{Groth16Backend, Proof, ProvingKey, VerifyingKey};
pub use lifecycle::{PipelineError, ProofPipeline, ProvingArtifacts};
pub use normalize::{normalize, ConversionError};
pub use traits::{ProofError, ProofSystem, VerifyError};
