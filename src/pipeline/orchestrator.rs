// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Pipeline orchestrator
//!
//! Sequences the stage chain (peak filter per polarity → amalgamation →
//! compound search) and stops at the first failing stage. Stages execute
//! strictly one at a time; each success is recorded in the state store so
//! later stages and later runs can auto-resolve their inputs.
//!
//! The state store and the stage runner are injected, so tests run the whole
//! machine against an in-memory store and a scripted runner.

use std::path::{Path, PathBuf};

use crate::errors::{LipiflowError, LipiflowResult};
use crate::params::StageKind;
use crate::pipeline::report::{category_counts, ArtifactSet, PipelineRun, StageLogEntry};
use crate::pipeline::resolver::InputResolver;
use crate::polarity::{infer_polarity, Polarity};
use crate::runner::{
    amalgamator_invocation, mssearch_invocation, peakfilter_invocation, StageInvocation,
    StageResult, StageRunner,
};
use crate::state::{
    StateStore, AMALGAMATOR_LAST_CSV, PEAKFILTER_LAST_NEGATIVE_SUMMARY,
    PEAKFILTER_LAST_POSITIVE_SUMMARY, PEAKFILTER_LAST_SUMMARY,
};
use crate::workspace::Workspace;

/// Options for a full pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub negative_input: Option<PathBuf>,
    pub positive_input: Option<PathBuf>,
    /// Required: every stage writes its artifacts here
    pub output_dir: Option<PathBuf>,
    /// Pass --verbose to the filter stage
    pub verbose_stage: bool,
    /// Pass --timestamp to the filter stage
    pub timestamp: bool,
}

/// Drives stage execution against an injected state store and runner
pub struct Orchestrator<'a> {
    workspace: &'a Workspace,
    store: &'a dyn StateStore,
    runner: &'a dyn StageRunner,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        workspace: &'a Workspace,
        store: &'a dyn StateStore,
        runner: &'a dyn StageRunner,
    ) -> Self {
        Self {
            workspace,
            store,
            runner,
        }
    }

    /// Run the full chain end-to-end.
    ///
    /// Configuration and resolution problems abort before any subprocess is
    /// spawned. Once stages start, a failure (including a stage that could
    /// not be launched at all) terminates the run, but the log of everything
    /// attempted so far is always returned.
    pub async fn run_full(&self, options: &PipelineOptions) -> LipiflowResult<PipelineRun> {
        let output_dir = options
            .output_dir
            .clone()
            .ok_or_else(|| LipiflowError::missing_setting("output-dir"))?;

        let params = self.workspace.param_store();
        let resolver = InputResolver::new(self.store, &params);

        let inputs = resolver.alignment_outputs(
            options.negative_input.as_deref(),
            options.positive_input.as_deref(),
        )?;

        // Preflight: every stage the run can reach needs a saved parameter
        // set. Amalgamator and MSSearch are checked even when amalgamation
        // may be skipped, so the operator hears about gaps up front.
        let mut missing = Vec::new();
        if !inputs.is_empty() && !params.exists(StageKind::PeakFilter) {
            missing.push(StageKind::PeakFilter.title().to_string());
        }
        if !params.exists(StageKind::Amalgamator) {
            missing.push(StageKind::Amalgamator.title().to_string());
        }
        if !params.exists(StageKind::MsSearch) {
            missing.push(StageKind::MsSearch.title().to_string());
        }
        if !missing.is_empty() {
            return Err(LipiflowError::MissingParameters { stages: missing });
        }

        let mut run = PipelineRun::started(output_dir.clone());
        let filter_params = params.path(StageKind::PeakFilter);

        // Peak filter, one branch per supplied polarity, negative first
        let mut neg_summary = None;
        if let Some(ref input) = inputs.negative {
            let invocation = peakfilter_invocation(
                self.workspace,
                "PeakFilter (negative)",
                input,
                &filter_params,
                Some(&output_dir),
                options.verbose_stage,
                options.timestamp,
            );
            if !self.attempt(&mut run, &invocation).await {
                return Ok(run);
            }
            let summary = output_dir.join("peakfilter_negative_summary.csv");
            self.record(
                &mut run,
                &[(
                    PEAKFILTER_LAST_NEGATIVE_SUMMARY,
                    Some(summary.display().to_string()),
                )],
            );
            neg_summary = Some(summary);
        }

        let mut pos_summary = None;
        if let Some(ref input) = inputs.positive {
            let invocation = peakfilter_invocation(
                self.workspace,
                "PeakFilter (positive)",
                input,
                &filter_params,
                Some(&output_dir),
                options.verbose_stage,
                options.timestamp,
            );
            if !self.attempt(&mut run, &invocation).await {
                return Ok(run);
            }
            let summary = output_dir.join("peakfilter_positive_summary.csv");
            self.record(
                &mut run,
                &[(
                    PEAKFILTER_LAST_POSITIVE_SUMMARY,
                    Some(summary.display().to_string()),
                )],
            );
            pos_summary = Some(summary);
        }

        // Amalgamate only when this run produced both polarity summaries
        let mut amalgamated = None;
        if let (Some(neg), Some(pos)) = (&neg_summary, &pos_summary) {
            let invocation = amalgamator_invocation(
                self.workspace,
                neg,
                pos,
                &params.path(StageKind::Amalgamator),
                Some(&output_dir),
            );
            if !self.attempt(&mut run, &invocation).await {
                return Ok(run);
            }
            let csv = output_dir.join("amalgamated.csv");
            self.record(
                &mut run,
                &[(AMALGAMATOR_LAST_CSV, Some(csv.display().to_string()))],
            );
            amalgamated = Some(csv);
        }

        // Search on the amalgamated output, else the single summary produced
        let Some(search_input) = amalgamated
            .clone()
            .or_else(|| neg_summary.clone())
            .or_else(|| pos_summary.clone())
        else {
            return Err(LipiflowError::missing_input(
                "mssearch",
                "no summary was produced by this run",
            ));
        };

        // Transient overlay of the saved search parameters; the saved
        // document itself is never mutated. If the overlay cannot be
        // written, fall back to the saved set and note it.
        let search_params = match params.write_search_overlay() {
            Ok(path) => path,
            Err(e) => {
                run.warn(format!("search overlay not written, using saved set: {}", e));
                params.path(StageKind::MsSearch)
            }
        };

        let invocation =
            mssearch_invocation(self.workspace, &search_input, &search_params, Some(&output_dir));
        if !self.attempt(&mut run, &invocation).await {
            return Ok(run);
        }

        // Aggregate: report the downstream artifacts that actually exist
        let db_name = params.search_database();
        run.artifacts = ArtifactSet::probe(&output_dir, &db_name, amalgamated.as_deref());
        if let Some(ref summary) = run.artifacts.summary_table {
            run.category_counts = category_counts(summary);
        }

        Ok(run)
    }

    /// Run the peak filter once, outside the full chain.
    ///
    /// On success with an output directory, the expected summary location is
    /// recorded under the key matching the input's polarity so later
    /// amalgamation and search runs can find it.
    pub async fn run_peakfilter(
        &self,
        input: Option<&Path>,
        output_dir: Option<&Path>,
        verbose_stage: bool,
        timestamp: bool,
    ) -> LipiflowResult<StageLogEntry> {
        let params = self.workspace.param_store();
        let resolver = InputResolver::new(self.store, &params);

        let input = resolver.peakfilter_input(input)?;
        let params_path = resolver.require_params(StageKind::PeakFilter)?;

        let invocation = peakfilter_invocation(
            self.workspace,
            "PeakFilter",
            &input,
            &params_path,
            output_dir,
            verbose_stage,
            timestamp,
        );
        let result = self.runner.run(&invocation).await?;
        let entry = StageLogEntry::new(&invocation.title, result);

        if entry.success {
            if let Some(out) = output_dir {
                let (key, file) = match infer_polarity(&input) {
                    Polarity::Negative => (
                        PEAKFILTER_LAST_NEGATIVE_SUMMARY,
                        "peakfilter_negative_summary.csv",
                    ),
                    Polarity::Positive => (
                        PEAKFILTER_LAST_POSITIVE_SUMMARY,
                        "peakfilter_positive_summary.csv",
                    ),
                    Polarity::Unknown => (PEAKFILTER_LAST_SUMMARY, "peakfilter_summary.csv"),
                };
                let summary = out.join(file).display().to_string();
                if let Err(warning) = self.store.update(&[(key, Some(summary))]) {
                    tracing::warn!(%warning, "filter summary hint not recorded");
                }
            }
        }

        Ok(entry)
    }

    /// Run the amalgamator once, auto-resolving missing polarity summaries
    pub async fn run_amalgamator(
        &self,
        neg_file: Option<&Path>,
        pos_file: Option<&Path>,
        output_dir: Option<&Path>,
    ) -> LipiflowResult<StageLogEntry> {
        let params = self.workspace.param_store();
        let resolver = InputResolver::new(self.store, &params);

        let (neg, pos) = resolver.amalgamator_inputs(neg_file, pos_file)?;
        let params_path = resolver.require_params(StageKind::Amalgamator)?;

        let invocation =
            amalgamator_invocation(self.workspace, &neg, &pos, &params_path, output_dir);
        let result = self.runner.run(&invocation).await?;
        let entry = StageLogEntry::new(&invocation.title, result);

        if entry.success {
            if let Some(out) = output_dir {
                let csv = out.join("amalgamated.csv").display().to_string();
                if let Err(warning) = self.store.update(&[(AMALGAMATOR_LAST_CSV, Some(csv))]) {
                    tracing::warn!(%warning, "amalgamated output not recorded");
                }
            }
        }

        Ok(entry)
    }

    /// Run compound search once against an explicit or auto-resolved input
    pub async fn run_mssearch(
        &self,
        input: Option<&Path>,
        output_dir: Option<&Path>,
    ) -> LipiflowResult<StageLogEntry> {
        let params = self.workspace.param_store();
        let resolver = InputResolver::new(self.store, &params);

        let input = resolver.mssearch_input(input)?;
        let params_path = resolver.require_params(StageKind::MsSearch)?;

        let invocation = mssearch_invocation(self.workspace, &input, &params_path, output_dir);
        let result = self.runner.run(&invocation).await?;
        Ok(StageLogEntry::new(&invocation.title, result))
    }

    /// Run one stage of the full chain, folding a launch failure into the
    /// log as a failed entry so the stages already attempted are not lost
    async fn attempt(&self, run: &mut PipelineRun, invocation: &StageInvocation) -> bool {
        match self.runner.run(invocation).await {
            Ok(result) => run.push(&invocation.title, result),
            Err(e) => {
                run.push(
                    &invocation.title,
                    StageResult {
                        command: invocation.command_line(),
                        stdout: String::new(),
                        stderr: e.to_string(),
                        exit_code: -1,
                        success: false,
                    },
                );
                false
            }
        }
    }

    fn record(&self, run: &mut PipelineRun, updates: &[(&str, Option<String>)]) {
        if let Err(warning) = self.store.update(updates) {
            run.warn(warning.to_string());
        }
    }
}
