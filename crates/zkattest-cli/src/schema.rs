//! # Schema Subcommand
//!
//! Validates schema files the way the verifier would on request creation
//! and reports what the compiled circuit looks like.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use zkattest_schema::{builtin, parse_schema_str, SchemaDefinition, SchemaError, BUILTIN_NAMES};
use zkattest_zkp::DynamicCircuit;

/// Arguments for the `zkattest schema` subcommand.
#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(subcommand)]
    pub command: SchemaCommand,
}

#[derive(Subcommand, Debug)]
pub enum SchemaCommand {
    /// Validate a schema and print its hash, slot layout and constraint count.
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print a built-in schema as canonical, pretty-printed JSON.
    Builtin {
        #[arg(default_value = "age_over_18")]
        name: String,
    },
}

pub fn run_schema(args: &SchemaArgs) -> Result<u8> {
    match &args.command {
        SchemaCommand::Check { file } => cmd_check(file),
        SchemaCommand::Builtin { name } => cmd_builtin(name),
    }
}

fn cmd_check(file: &Path) -> Result<u8> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read schema: {}", file.display()))?;

    let schema = match parse_schema_str(&text) {
        Ok(schema) => schema,
        Err(e) => {
            println!("FAIL: {e}");
            if let SchemaError::Structural { violations } = &e {
                for v in violations {
                    println!("  - {v}");
                }
            }
            return Ok(1);
        }
    };

    match describe(&schema) {
        Ok(report) => {
            print!("{report}");
            Ok(0)
        }
        Err(e) => {
            println!("FAIL: {e}");
            Ok(1)
        }
    }
}

/// Human-readable summary of the compiled circuit.
pub fn describe(schema: &SchemaDefinition) -> Result<String> {
    let circuit = DynamicCircuit::new(schema)?;
    let constraints = circuit
        .constraint_count()
        .map_err(|e| anyhow!("circuit synthesis failed: {e}"))?;
    let layout = circuit.layout();
    let names = |fields: &[zkattest_schema::FieldDefinition]| {
        fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.field_type))
            .collect::<Vec<_>>()
            .join(", ")
    };

    Ok(format!(
        "OK: {} v{}\n  hash:        {}\n  layout:      {}\n  public:      [{}]\n  secret:      [{}]\n  constraints: {}\n",
        schema.schema_id(),
        schema.version(),
        schema.schema_hash(),
        circuit.fingerprint(),
        names(layout.public_fields()),
        names(layout.secret_fields()),
        constraints,
    ))
}

fn cmd_builtin(name: &str) -> Result<u8> {
    let Some(schema) = builtin(name) else {
        bail!(
            "unknown built-in schema {name:?}; available: {}",
            BUILTIN_NAMES.join(", ")
        );
    };
    let schema = schema?;
    let value: Value = serde_json::from_str(schema.canonical_json().as_str())?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(0)
}
