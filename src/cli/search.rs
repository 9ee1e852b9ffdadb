// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Search command - run compound search once

use miette::Result;
use std::path::PathBuf;

use crate::pipeline::Orchestrator;
use crate::runner::ProcessRunner;

pub async fn run(
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    config_dir: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let workspace = super::resolve_workspace(config_dir)?;
    let store = workspace.state_store();
    let runner = ProcessRunner::for_workspace(&workspace);
    let orchestrator = Orchestrator::new(&workspace, &store, &runner);

    let entry = orchestrator
        .run_mssearch(input.as_deref(), output_dir.as_deref())
        .await?;

    super::print_stage_entry(&entry, verbose);

    if entry.success {
        Ok(())
    } else {
        Err(crate::LipiflowError::StageFailed {
            stage: "mssearch".into(),
            exit_code: entry.exit_code,
        }
        .into())
    }
}
