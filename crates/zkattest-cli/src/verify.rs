//! # Verify Subcommand
//!
//! Offline verification with a verifying key from `zkattest setup`. The
//! key embedded in the envelope is never trusted. The public witness is
//! recomputed from `--public-inputs` when given; otherwise the one in the
//! envelope is used, which only proves that *some* public values satisfy
//! the schema.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zkattest_zkp::codec::decode_verifying_key;
use zkattest_zkp::{decode_base64, DynamicCircuit, Groth16Backend, ProofSystem};

use crate::{load_schema, read_bytes, read_object, EXIT_REJECTED};

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub vk: PathBuf,

    /// File holding the base64 envelope.
    #[arg(long, value_name = "FILE")]
    pub blob: PathBuf,

    /// JSON object with the expected public values.
    #[arg(long, value_name = "FILE")]
    pub public_inputs: Option<PathBuf>,
}

pub fn run_verify(args: &VerifyArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    let vk = decode_verifying_key(&read_bytes(&args.vk)?)
        .with_context(|| format!("invalid verifying key: {}", args.vk.display()))?;
    let text = std::fs::read_to_string(&args.blob)
        .with_context(|| format!("failed to read file: {}", args.blob.display()))?;

    let result = match decode_base64(&text) {
        Ok(result) => result,
        Err(e) => {
            println!("REJECT: bad blob: {e}");
            return Ok(EXIT_REJECTED);
        }
    };
    if result.verifying_key != vk {
        tracing::warn!("envelope carries a different verifying key; using --vk");
    }

    let public_inputs = match &args.public_inputs {
        Some(path) => {
            let values = read_object(path)?;
            let circuit = DynamicCircuit::new(&schema)?;
            match circuit.public_inputs_from(&values) {
                Ok(inputs) => inputs,
                Err(e) => {
                    println!("REJECT: public inputs invalid: {e}");
                    return Ok(EXIT_REJECTED);
                }
            }
        }
        None => result.public_witness.clone(),
    };

    match Groth16Backend.verify(&vk, &result.proof, &public_inputs) {
        Ok(true) => {
            println!("OK: proof verified for {}", schema.schema_hash());
            Ok(0)
        }
        Ok(false) => {
            println!("REJECT: proof does not verify");
            Ok(EXIT_REJECTED)
        }
        Err(e) => {
            println!("REJECT: {e}");
            Ok(EXIT_REJECTED)
        }
    }
}
