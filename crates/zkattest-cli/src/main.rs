//! # zkattest CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zkattest_cli::present::{run_present, PresentArgs};
use zkattest_cli::prove::{run_prove, ProveArgs};
use zkattest_cli::schema::{run_schema, SchemaArgs};
use zkattest_cli::setup::{run_setup, SetupArgs};
use zkattest_cli::verify::{run_verify, VerifyArgs};

/// zkattest: schema-driven zero-knowledge presentations.
///
/// Compile JSON schemas into Groth16 circuits, generate keys, prove and
/// verify offline, or act as the wallet against a running verifier.
#[derive(Parser, Debug)]
#[command(name = "zkattest", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate schemas or print a built-in one.
    Schema(SchemaArgs),

    /// Generate proving and verifying keys for a schema.
    Setup(SetupArgs),

    /// Prove a set of inputs against a schema.
    Prove(ProveArgs),

    /// Verify a proof envelope offline.
    Verify(VerifyArgs),

    /// Answer a presentation request as the wallet.
    Present(PresentArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Schema(args) => run_schema(args),
        Commands::Setup(args) => run_setup(args),
        Commands::Prove(args) => run_prove(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Present(args) => run_present(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
