// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Filter command - run the peak filter stage once

use miette::Result;
use std::path::PathBuf;

use crate::pipeline::Orchestrator;
use crate::runner::ProcessRunner;

pub async fn run(
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    verbose_stage: bool,
    timestamp: bool,
    config_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let workspace = super::resolve_workspace(config_dir)?;
    let store = workspace.state_store();
    let runner = ProcessRunner::for_workspace(&workspace);
    let orchestrator = Orchestrator::new(&workspace, &store, &runner);

    let entry = orchestrator
        .run_peakfilter(
            input.as_deref(),
            output_dir.as_deref(),
            verbose_stage,
            timestamp,
        )
        .await?;

    super::print_stage_entry(&entry, verbose);

    if entry.success {
        Ok(())
    } else {
        Err(crate::LipiflowError::StageFailed {
            stage: "peakfilter".into(),
            exit_code: entry.exit_code,
        }
        .into())
    }
}
