//! # Present Subcommand
//!
//! The wallet side of the presentation flow: fetch the descriptor, the
//! schema and the proving key from the verifier, prove over the holder's
//! private inputs plus the pinned public ones, and submit.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use rand::rngs::OsRng;
use reqwest::StatusCode;
use zkattest_protocol::{build_submission, PresentationDescriptor};
use zkattest_schema::{parse_schema_str, SchemaDefinition};
use zkattest_zkp::codec::decode_proving_key;
use zkattest_zkp::ProvingArtifacts;

use crate::{read_object, EXIT_REJECTED};

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Args, Debug)]
pub struct PresentArgs {
    /// Descriptor URL, as carried in the wallet deeplink.
    #[arg(long, value_name = "URL")]
    pub descriptor_url: String,

    /// JSON object with the holder's private values.
    #[arg(long, value_name = "FILE")]
    pub inputs: PathBuf,
}

pub fn run_present(args: &PresentArgs) -> Result<u8> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;
    runtime.block_on(present(args))
}

async fn present(args: &PresentArgs) -> Result<u8> {
    let holder = read_object(&args.inputs)?;
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("failed to build HTTP client")?;

    let descriptor: PresentationDescriptor = client
        .get(&args.descriptor_url)
        .send()
        .await
        .context("descriptor request failed")?
        .error_for_status()
        .context("descriptor unavailable")?
        .json()
        .await
        .context("invalid descriptor")?;
    tracing::info!(
        request_id = %descriptor.request_id,
        audience = %descriptor.audience,
        "fetched descriptor"
    );

    let schema_text = client
        .get(&descriptor.schema.uri)
        .send()
        .await?
        .error_for_status()
        .context("schema unavailable")?
        .text()
        .await?;
    let schema = checked_schema(&schema_text, &descriptor)?;

    let pk_bytes = client
        .get(&descriptor.artifacts.pk_url)
        .send()
        .await?
        .error_for_status()
        .context("proving key unavailable")?
        .bytes()
        .await?;
    let proving_key = decode_proving_key(&pk_bytes).context("invalid proving key")?;
    let artifacts = Arc::new(ProvingArtifacts {
        verifying_key: proving_key.vk.clone(),
        proving_key,
    });

    let submit_url = descriptor.submit_url.clone();
    let submission = tokio::task::spawn_blocking(move || {
        build_submission(&descriptor, &schema, artifacts, &holder, &mut OsRng)
    })
    .await
    .context("prover task failed")?
    .context("proving failed")?;

    let response = client
        .post(&submit_url)
        .json(&submission)
        .send()
        .await
        .context("submission failed")?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    println!("{body}");

    if status.is_success() {
        Ok(0)
    } else if status == StatusCode::UNAUTHORIZED {
        Ok(EXIT_REJECTED)
    } else {
        bail!("verifier returned {status}")
    }
}

/// Parse the served schema and make sure it is the one the descriptor names.
fn checked_schema(text: &str, descriptor: &PresentationDescriptor) -> Result<SchemaDefinition> {
    let schema = parse_schema_str(text).context("served schema is invalid")?;
    if schema.schema_hash() != descriptor.schema.hash {
        bail!(
            "schema hash mismatch: descriptor names {}, server sent {}",
            descriptor.schema.hash,
            schema.schema_hash()
        );
    }
    Ok(schema)
}
