//! Terraform Provider for RKE
//!
//! Serves the `rke_cluster` resource over line-delimited JSON-RPC on
//! stdin/stdout.

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use terraform_provider_rke::logging::LoggingConfig;
use terraform_provider_rke::RkeProvider;

/// Terraform Provider for RKE
#[derive(Parser, Debug)]
#[command(name = "terraform-provider-rke")]
#[command(about = "Terraform provider for Rancher Kubernetes Engine clusters")]
struct Args {
    /// Enable debug logging; any non-empty TF_LOG other than a false value turns it on
    #[arg(
        long,
        env = "TF_LOG",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    debug: bool,

    /// Also write JSON logs to this file
    #[arg(long, env = "RKE_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _guard = LoggingConfig::new(args.debug, args.log_file).init()?;

    tracing::info!("Starting Terraform Provider for RKE");

    let provider = RkeProvider::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let input = match line {
            Ok(input) => input,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        if input.trim().is_empty() {
            continue;
        }

        let response = provider.handle_request(&input);
        if let Err(e) = writeln!(stdout, "{}", response).and_then(|_| stdout.flush()) {
            tracing::error!("Failed to write response: {}", e);
            break;
        }
    }

    tracing::info!("Terraform Provider shutting down");
    Ok(())
}
