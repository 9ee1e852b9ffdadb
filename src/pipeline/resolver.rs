// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Input resolver
//!
//! Computes the actual input path(s) for each stage: explicit user inputs
//! are used verbatim; missing ones fall back through an ordered list of
//! state-store candidates. Recorded state may point at files deleted since
//! the run that wrote it, so every state-derived candidate is re-validated
//! against the filesystem before use.

use std::path::{Path, PathBuf};

use crate::errors::{LipiflowError, LipiflowResult};
use crate::params::{ParamStore, StageKind};
use crate::polarity::{infer_polarity, Polarity};
use crate::state::{
    RunState, StateStore, AMALGAMATOR_LAST_CSV, PEAKFILTER_LAST_NEGATIVE_SUMMARY,
    PEAKFILTER_LAST_POSITIVE_SUMMARY, PEAKFILTER_LAST_SUMMARY, XCMS_LAST_CSV,
    XCMS_LAST_NEGATIVE_CSV, XCMS_LAST_POSITIVE_CSV,
};

/// Per-polarity inputs feeding the top of the pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolarityInputs {
    pub negative: Option<PathBuf>,
    pub positive: Option<PathBuf>,
}

impl PolarityInputs {
    pub fn is_empty(&self) -> bool {
        self.negative.is_none() && self.positive.is_none()
    }
}

/// Resolver over the state store and the parameter store
pub struct InputResolver<'a> {
    store: &'a dyn StateStore,
    params: &'a ParamStore,
}

impl<'a> InputResolver<'a> {
    pub fn new(store: &'a dyn StateStore, params: &'a ParamStore) -> Self {
        Self { store, params }
    }

    /// Fail with `MissingParameters` unless the stage's parameter file is
    /// saved
    pub fn require_params(&self, stage: StageKind) -> LipiflowResult<PathBuf> {
        if self.params.exists(stage) {
            Ok(self.params.path(stage))
        } else {
            Err(LipiflowError::MissingParameters {
                stages: vec![stage.title().to_string()],
            })
        }
    }

    /// First candidate key whose recorded value names a file that still
    /// exists
    fn first_existing(state: &RunState, candidates: &[&str]) -> Option<PathBuf> {
        candidates
            .iter()
            .filter_map(|key| state.get(*key))
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    /// Input for a standalone PeakFilter run: explicit path wins, otherwise
    /// the most recent alignment output (negative preferred)
    pub fn peakfilter_input(&self, explicit: Option<&Path>) -> LipiflowResult<PathBuf> {
        if let Some(path) = non_empty(explicit) {
            return Ok(path.to_path_buf());
        }

        let state = self.store.read();
        Self::first_existing(
            &state,
            &[XCMS_LAST_NEGATIVE_CSV, XCMS_LAST_POSITIVE_CSV, XCMS_LAST_CSV],
        )
        .ok_or_else(|| {
            LipiflowError::missing_input(
                "peakfilter",
                "no explicit input and no recorded alignment output",
            )
        })
    }

    /// Inputs for amalgamation: both polarities are required; a single
    /// available summary is a resolution failure, never a partial run
    pub fn amalgamator_inputs(
        &self,
        explicit_neg: Option<&Path>,
        explicit_pos: Option<&Path>,
    ) -> LipiflowResult<(PathBuf, PathBuf)> {
        let state = self.store.read();

        let neg = non_empty(explicit_neg)
            .map(Path::to_path_buf)
            .or_else(|| Self::first_existing(&state, &[PEAKFILTER_LAST_NEGATIVE_SUMMARY]));
        let pos = non_empty(explicit_pos)
            .map(Path::to_path_buf)
            .or_else(|| Self::first_existing(&state, &[PEAKFILTER_LAST_POSITIVE_SUMMARY]));

        match (neg, pos) {
            (Some(neg), Some(pos)) => Ok((neg, pos)),
            (neg, _) => {
                let missing = if neg.is_none() { "negative" } else { "positive" };
                Err(LipiflowError::missing_input(
                    "amalgamator",
                    &format!("no {} PeakFilter summary available", missing),
                ))
            }
        }
    }

    /// Input for compound search: amalgamated output preferred, then the
    /// polarity summaries, then the polarity-indeterminate summary
    pub fn mssearch_input(&self, explicit: Option<&Path>) -> LipiflowResult<PathBuf> {
        if let Some(path) = non_empty(explicit) {
            return Ok(path.to_path_buf());
        }

        let state = self.store.read();
        Self::first_existing(
            &state,
            &[
                AMALGAMATOR_LAST_CSV,
                PEAKFILTER_LAST_NEGATIVE_SUMMARY,
                PEAKFILTER_LAST_POSITIVE_SUMMARY,
                PEAKFILTER_LAST_SUMMARY,
            ],
        )
        .ok_or_else(|| {
            LipiflowError::missing_input(
                "mssearch",
                "no amalgamated output or PeakFilter summary available",
            )
        })
    }

    /// Top-of-pipeline inputs for a full run.
    ///
    /// When neither polarity was supplied, fill both branches from the last
    /// recorded alignment outputs. If only the polarity-indeterminate entry
    /// exists, assign it by inferred file-name polarity; an unknown polarity
    /// lands on the negative branch. That default is asymmetric and kept
    /// only for compatibility with previously recorded state.
    pub fn alignment_outputs(
        &self,
        explicit_neg: Option<&Path>,
        explicit_pos: Option<&Path>,
    ) -> LipiflowResult<PolarityInputs> {
        let mut inputs = PolarityInputs {
            negative: non_empty(explicit_neg).map(Path::to_path_buf),
            positive: non_empty(explicit_pos).map(Path::to_path_buf),
        };

        if !inputs.is_empty() {
            return Ok(inputs);
        }

        let state = self.store.read();
        inputs.negative = Self::first_existing(&state, &[XCMS_LAST_NEGATIVE_CSV]);
        inputs.positive = Self::first_existing(&state, &[XCMS_LAST_POSITIVE_CSV]);

        if inputs.is_empty() {
            if let Some(generic) = Self::first_existing(&state, &[XCMS_LAST_CSV]) {
                match infer_polarity(&generic) {
                    Polarity::Positive => inputs.positive = Some(generic),
                    // Unknown defaults to the negative branch, see above
                    Polarity::Negative | Polarity::Unknown => inputs.negative = Some(generic),
                }
            }
        }

        if inputs.is_empty() {
            return Err(LipiflowError::missing_input(
                "pipeline",
                "no polarity inputs supplied and no recorded alignment output",
            ));
        }

        Ok(inputs)
    }
}

fn non_empty(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}
