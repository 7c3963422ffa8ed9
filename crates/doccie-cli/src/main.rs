// SPDX-License-Identifier: Apache-2.0

//! Doccie - AI-generated API documentation for your GitHub repositories.
//!
//! A CLI client for the Doccie backend: sign in with GitHub, choose which
//! repositories are monitored, and pull the generated OpenAPI documents.

mod callback;
mod cli;
mod commands;
mod errors;
mod logging;
mod notify;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use doccie_core::config;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", errors::format_error(&e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output_ctx = OutputContext::from_cli(cli.output, cli.quiet, cli.verbose);

    let mut config = config::load_config().context("Failed to load configuration")?;
    debug!("Configuration loaded successfully");

    if let Some(api_url) = &cli.api_url {
        config.api.base_url.clone_from(api_url);
        debug!("Overriding backend URL to: {api_url}");
    }

    commands::run(cli.command, output_ctx, &config).await
}
