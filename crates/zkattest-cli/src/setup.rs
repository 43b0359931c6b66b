//! # Setup Subcommand
//!
//! Offline circuit-specific setup. The verifier service runs the same
//! setup lazily; this writes the keys to disk for offline proving and
//! verification.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use rand::rngs::OsRng;
use zkattest_zkp::codec::{encode_proving_key, encode_verifying_key};
use zkattest_zkp::ProofPipeline;

use crate::{load_schema, PROVING_KEY_FILE, SCHEMA_FILE, VERIFYING_KEY_FILE};

#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Schema file.
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Directory for `proving.key`, `verifying.key` and `schema.json`.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out_dir: PathBuf,
}

pub fn run_setup(args: &SetupArgs) -> Result<u8> {
    let schema = load_schema(&args.schema)?;
    let started = Instant::now();

    let keyed = ProofPipeline::new(schema.clone())
        .compile()?
        .setup(&mut OsRng)
        .context("key generation failed")?;
    let keys = keyed.keys();
    tracing::info!(
        schema_hash = %schema.schema_hash(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "setup complete"
    );

    let proving_key = encode_proving_key(&keys.proving_key)?;
    let verifying_key = encode_verifying_key(&keys.verifying_key)?;
    write_files(
        &args.out_dir,
        &[
            (PROVING_KEY_FILE, proving_key.as_slice()),
            (VERIFYING_KEY_FILE, verifying_key.as_slice()),
            (SCHEMA_FILE, schema.canonical_json().as_bytes()),
        ],
    )?;

    println!(
        "OK: keys for {} written to {}",
        schema.schema_hash(),
        args.out_dir.display()
    );
    Ok(0)
}

fn write_files(dir: &Path, files: &[(&str, &[u8])]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;
    for (name, bytes) in files {
        let path = dir.join(name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote");
    }
    Ok(())
}
