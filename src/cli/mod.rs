// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for lipiflow.

pub mod align;
pub mod amalgamate;
pub mod filter;
pub mod params;
pub mod pipeline;
pub mod search;
pub mod state;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::pipeline::StageLogEntry;

/// Lipidomics pipeline orchestrator
///
/// Drives alignment, peak filtering, amalgamation, and compound search as
/// external stages, remembering artifact locations between runs.
#[derive(Parser, Debug)]
#[clap(
    name = "lipiflow",
    version,
    about = "Pipeline orchestrator for LipidFinder-style lipidomics workflows",
    long_about = None,
    after_help = "Examples:\n\
        lipiflow align --data-dir ./mzxml_neg    Run the XCMS alignment tool\n\
        lipiflow filter --output-dir ./results   Filter the last aligned CSV\n\
        lipiflow pipeline --output-dir ./results Run the full stage chain\n\
        lipiflow state show                      Inspect recorded artifact paths\n\n\
        See 'lipiflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Directory holding state and saved parameter documents
    #[clap(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the external alignment tool over a directory of raw data
    Align {
        /// Directory of mzXML files handed to the alignment script
        #[clap(long, value_name = "DIR")]
        data_dir: PathBuf,

        /// Report name; the tool writes <report>.csv into the data directory
        #[clap(long, default_value = "xcms_report")]
        report: String,

        /// Override the Rscript interpreter path
        #[clap(long)]
        rscript: Option<String>,
    },

    /// Run the peak filter stage on one aligned CSV
    Filter {
        /// Input CSV (default: last recorded alignment output)
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Directory for the stage's artifacts
        #[clap(short, long)]
        output_dir: Option<PathBuf>,

        /// Pass --verbose through to the stage
        #[clap(long)]
        verbose_stage: bool,

        /// Pass --timestamp through to the stage
        #[clap(long)]
        timestamp: bool,
    },

    /// Combine negative and positive filter summaries
    Amalgamate {
        /// Negative-polarity summary (default: last recorded)
        #[clap(long)]
        neg: Option<PathBuf>,

        /// Positive-polarity summary (default: last recorded)
        #[clap(long)]
        pos: Option<PathBuf>,

        /// Directory for the stage's artifacts
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Run compound search on an amalgamated or filtered CSV
    Search {
        /// Input CSV (default: last amalgamated output, then last summary)
        #[clap(short, long)]
        input: Option<PathBuf>,

        /// Directory for the stage's artifacts
        #[clap(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Run the full chain: filter per polarity, amalgamate, search
    Pipeline {
        /// Negative-polarity aligned CSV (default: auto-resolved)
        #[clap(long)]
        neg: Option<PathBuf>,

        /// Positive-polarity aligned CSV (default: auto-resolved)
        #[clap(long)]
        pos: Option<PathBuf>,

        /// Directory every stage writes into (required)
        #[clap(short, long)]
        output_dir: PathBuf,

        /// Pass --verbose through to the filter stage
        #[clap(long)]
        verbose_stage: bool,

        /// Pass --timestamp through to the filter stage
        #[clap(long)]
        timestamp: bool,
    },

    /// Inspect the persistent run state
    State {
        #[clap(subcommand)]
        action: StateAction,
    },

    /// Inspect saved stage parameters against the template
    Params {
        #[clap(subcommand)]
        action: ParamsAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum StateAction {
    /// Print the recorded artifact locations
    Show,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ParamsAction {
    /// Show the template keys and saved values for a stage
    Show {
        /// Stage name: peakfilter, amalgamator, or mssearch
        stage: String,

        /// Parameter template file
        #[clap(long, default_value = "parameters_template.json")]
        template: PathBuf,
    },

    /// Check a saved parameter set for unknown keys
    Check {
        /// Stage name: peakfilter, amalgamator, or mssearch
        stage: String,

        /// Parameter template file
        #[clap(long, default_value = "parameters_template.json")]
        template: PathBuf,
    },
}

/// Resolve the workspace from the current directory and the global
/// `--config-dir` flag
pub(crate) fn resolve_workspace(
    config_dir: Option<PathBuf>,
) -> miette::Result<crate::workspace::Workspace> {
    let base_dir = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    crate::workspace::Workspace::resolve(base_dir, config_dir).map_err(Into::into)
}

/// Print one execution-log entry the same way for every command
pub(crate) fn print_stage_entry(entry: &StageLogEntry, verbose: bool) {
    if entry.success {
        println!("  {} {}", "✓".green(), entry.title.bold());
    } else {
        println!("  {} {} failed", "✗".red(), entry.title.bold());
    }

    if verbose || !entry.success {
        println!("    {} {}", "$".dimmed(), entry.command.dimmed());
        if !entry.stdout.is_empty() {
            println!("{}", entry.stdout.trim_end().dimmed());
        }
        if !entry.stderr.is_empty() {
            eprintln!("{}", entry.stderr.trim_end().red());
        }
    }
}
