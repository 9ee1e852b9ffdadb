// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Alignment tool adapter
//!
//! The XCMS alignment step is an R script that reads the data directory and
//! report name from stdin and is expected to write `<report_name>.csv` into
//! that directory. The script is a black box: success is gated on the
//! produced file existing, not on the exit code alone.

use std::path::{Path, PathBuf};

use super::{StageInvocation, StageResult, StageRunner};
use crate::errors::LipiflowResult;
use crate::polarity::{infer_polarity, Polarity};
use crate::state::{
    StateStore, XCMS_LAST_CSV, XCMS_LAST_NEGATIVE_CSV, XCMS_LAST_POSITIVE_CSV,
};
use crate::workspace::Workspace;

/// Outcome of an alignment run
#[derive(Debug)]
pub struct AlignmentRun {
    pub result: StageResult,
    /// Where the report was expected
    pub report_path: PathBuf,
    /// Whether the report actually exists; this, not the exit code, decides
    /// success for alignment
    pub produced: bool,
}

/// Build the Rscript invocation for the alignment script
pub fn alignment_invocation(
    workspace: &Workspace,
    data_dir: &Path,
    report_name: &str,
) -> StageInvocation {
    StageInvocation {
        title: "XCMS".to_string(),
        program: workspace.rscript.clone(),
        args: vec![workspace.align_script.display().to_string()],
        stdin: Some(format!("{}\n{}\n", data_dir.display(), report_name)),
    }
}

/// Run alignment and, when a report was produced, record its location for
/// later auto-resolution. Recording is best-effort; a store failure only
/// logs a warning.
pub async fn run_alignment(
    runner: &dyn StageRunner,
    workspace: &Workspace,
    store: &dyn StateStore,
    data_dir: &Path,
    report_name: &str,
) -> LipiflowResult<AlignmentRun> {
    let invocation = alignment_invocation(workspace, data_dir, report_name);
    let result = runner.run(&invocation).await?;

    let report_path = data_dir.join(format!("{}.csv", report_name));
    let produced = report_path.is_file();

    if produced {
        let path = report_path.display().to_string();
        let polarity_key = match infer_polarity(&report_path) {
            Polarity::Negative => Some(XCMS_LAST_NEGATIVE_CSV),
            Polarity::Positive => Some(XCMS_LAST_POSITIVE_CSV),
            Polarity::Unknown => None,
        };

        let mut updates = vec![(XCMS_LAST_CSV, Some(path.clone()))];
        if let Some(key) = polarity_key {
            updates.push((key, Some(path)));
        }
        if let Err(warning) = store.update(&updates) {
            tracing::warn!(%warning, "alignment output not recorded");
        }
    } else {
        tracing::warn!(path = %report_path.display(), "alignment produced no report");
    }

    Ok(AlignmentRun {
        result,
        report_path,
        produced,
    })
}
