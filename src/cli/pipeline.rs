// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Pipeline command - run the full stage chain

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::pipeline::{Orchestrator, PipelineOptions, PipelineRun};
use crate::runner::ProcessRunner;

pub async fn run(
    neg: Option<PathBuf>,
    pos: Option<PathBuf>,
    output_dir: PathBuf,
    verbose_stage: bool,
    timestamp: bool,
    config_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let workspace = super::resolve_workspace(config_dir)?;

    // Fail fast if the stage interpreter is not installed at all
    crate::runner::locate_tool(&workspace.python)?;

    let store = workspace.state_store();
    let runner = ProcessRunner::for_workspace(&workspace);
    let orchestrator = Orchestrator::new(&workspace, &store, &runner);

    let options = PipelineOptions {
        negative_input: neg,
        positive_input: pos,
        output_dir: Some(output_dir),
        verbose_stage,
        timestamp,
    };

    println!();
    println!("{}", "Pipeline".bold());
    println!("{}", "═".repeat(50));

    let run = orchestrator.run_full(&options).await?;
    print_run(&run, verbose);

    if run.success {
        Ok(())
    } else {
        Err(miette::miette!("Pipeline execution failed"))
    }
}

fn print_run(run: &PipelineRun, verbose: bool) {
    for entry in &run.entries {
        super::print_stage_entry(entry, verbose);
    }

    println!();
    if run.success {
        println!("{}", "Pipeline completed successfully".green());
    } else {
        println!("{}", "Pipeline failed".red());
    }

    for warning in &run.warnings {
        println!("  {} {}", "⚠".yellow(), warning);
    }

    let artifacts = [
        ("amalgamated", &run.artifacts.amalgamated_csv),
        ("summary", &run.artifacts.summary_table),
        ("chart", &run.artifacts.category_chart),
        ("results", &run.artifacts.full_table),
    ];
    let existing: Vec<_> = artifacts
        .iter()
        .filter_map(|(label, path)| path.as_ref().map(|p| (*label, p)))
        .collect();

    if !existing.is_empty() {
        println!();
        println!("{}:", "Outputs".bold());
        for (label, path) in existing {
            println!("  - {} {}", format!("[{}]", label).dimmed(), path.display());
        }
    }

    if !run.category_counts.is_empty() {
        println!();
        println!("{}:", "Categories".bold());
        for (category, count) in &run.category_counts {
            println!("  {:>6}  {}", count, category);
        }
    }
}
