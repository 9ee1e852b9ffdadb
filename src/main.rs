// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! lipiflow - lipidomics pipeline orchestrator
//!
//! Drives alignment, peak filtering, amalgamation, and compound search as
//! external stages with persistent cross-run input resolution.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lipiflow::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lipiflow=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Align {
            data_dir,
            report,
            rscript,
        } => lipiflow::cli::align::run(data_dir, report, rscript, cli.config_dir, cli.verbose).await,
        Commands::Filter {
            input,
            output_dir,
            verbose_stage,
            timestamp,
        } => {
            lipiflow::cli::filter::run(
                input,
                output_dir,
                verbose_stage,
                timestamp,
                cli.config_dir,
                cli.verbose,
            )
            .await
        }
        Commands::Amalgamate {
            neg,
            pos,
            output_dir,
        } => lipiflow::cli::amalgamate::run(neg, pos, output_dir, cli.config_dir, cli.verbose).await,
        Commands::Search { input, output_dir } => {
            lipiflow::cli::search::run(input, output_dir, cli.config_dir, cli.verbose).await
        }
        Commands::Pipeline {
            neg,
            pos,
            output_dir,
            verbose_stage,
            timestamp,
        } => {
            lipiflow::cli::pipeline::run(
                neg,
                pos,
                output_dir,
                verbose_stage,
                timestamp,
                cli.config_dir,
                cli.verbose,
            )
            .await
        }
        Commands::State { action } => {
            lipiflow::cli::state::run(action, cli.config_dir, cli.verbose).await
        }
        Commands::Params { action } => {
            lipiflow::cli::params::run(action, cli.config_dir, cli.verbose).await
        }
    }
}
