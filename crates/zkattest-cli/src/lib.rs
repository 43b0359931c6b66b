//! # zkattest-cli: Command-Line Tooling
//!
//! Provides the `zkattest` binary.
//!
//! ## Subcommands
//!
//! - `zkattest schema`: Validate a schema file or print a built-in one.
//! - `zkattest setup`: Offline Groth16 setup; writes key files.
//! - `zkattest prove`: Prove a set of inputs and write the base64 envelope.
//! - `zkattest verify`: Offline verification against a verifying key.
//! - `zkattest present`: Wallet flow against a running verifier.
//!
//! Every handler returns the process exit code: 0 on success, 1 on error,
//! 2 when a proof or presentation is rejected.
//!
//! ```bash
//! zkattest schema check credit.json
//! zkattest setup --schema credit.json --out-dir keys/
//! zkattest prove --schema credit.json --pk keys/proving.key --inputs me.json --out proof.b64
//! zkattest verify --schema credit.json --vk keys/verifying.key --blob proof.b64
//! ```

pub mod present;
pub mod prove;
pub mod schema;
pub mod setup;
pub mod verify;

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use zkattest_schema::{parse_schema_str, SchemaDefinition};

pub const PROVING_KEY_FILE: &str = "proving.key";
pub const VERIFYING_KEY_FILE: &str = "verifying.key";
pub const SCHEMA_FILE: &str = "schema.json";

/// Exit code for a proof that was checked and refused.
pub const EXIT_REJECTED: u8 = 2;

/// Read and parse a schema file.
pub fn load_schema(path: &Path) -> Result<SchemaDefinition> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    parse_schema_str(&text).with_context(|| format!("invalid schema: {}", path.display()))
}

/// Read a JSON file whose top level must be an object.
pub fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read file: {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse JSON: {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("{} must contain a JSON object", path.display()),
    }
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read file: {}", path.display()))
}
