// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Align command - run the external alignment tool

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::runner::align::run_alignment;
use crate::runner::ProcessRunner;
use crate::state::StateStore;

pub async fn run(
    data_dir: PathBuf,
    report: String,
    rscript: Option<String>,
    config_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    if data_dir.as_os_str().is_empty() {
        return Err(miette::miette!("Please provide the mzXML directory path."));
    }

    let mut workspace = super::resolve_workspace(config_dir)?;
    if let Some(rscript) = rscript {
        workspace.rscript = rscript;
    }

    crate::runner::locate_tool(&workspace.rscript)?;

    let store = workspace.state_store();
    let runner = ProcessRunner::for_workspace(&workspace);

    let run = run_alignment(&runner, &workspace, &store, &data_dir, &report).await?;

    if verbose {
        println!("  {} {}", "$".dimmed(), run.result.command.dimmed());
        if !run.result.stdout.is_empty() {
            println!("{}", run.result.stdout.trim_end().dimmed());
        }
    }
    if !run.result.stderr.is_empty() && (verbose || !run.produced) {
        eprintln!("{}", run.result.stderr.trim_end().red());
    }

    if run.produced {
        println!(
            "  {} alignment report written to {}",
            "✓".green(),
            run.report_path.display().to_string().bold()
        );
        if verbose {
            let state = store.read();
            for (key, value) in &state {
                println!("    {} = {}", key.dimmed(), value.dimmed());
            }
        }
        Ok(())
    } else {
        Err(crate::LipiflowError::AlignmentNoOutput {
            path: run.report_path,
        }
        .into())
    }
}
