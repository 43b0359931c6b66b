//! # Prove Subcommand

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::OsRng;
use zkattest_protocol::prove_blob;
use zkattest_zkp::codec::decode_proving_key;
use zkattest_zkp::ProvingArtifacts;

use crate::{load_schema, read_bytes, read_object};

#[derive(Args, Debug)]
pub struct ProveArgs {
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Proving key written by `zkattest setup`.
    #[arg(long, value_name = "FILE")]
    pub pk: PathBuf,

    /// JSON object with a value for every schema field.
    #[arg(long, value_name = "FILE")]
    pub inputs: PathBuf,

    /// Write the base64 envelope here instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

pub fn run_prove(args: &ProveArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    let proving_key = decode_proving_key(&read_bytes(&args.pk)?)
        .with_context(|| format!("invalid proving key: {}", args.pk.display()))?;
    let artifacts = Arc::new(ProvingArtifacts {
        verifying_key: proving_key.vk.clone(),
        proving_key,
    });
    let values = read_object(&args.inputs)?;

    let blob = prove_blob(&schema, artifacts, &values, &mut OsRng).context("proving failed")?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, &blob)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("OK: proof written to {}", path.display());
        }
        None => println!("{blob}"),
    }
    Ok(0)
}
