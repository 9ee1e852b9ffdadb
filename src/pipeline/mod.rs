// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Pipeline orchestration
//!
//! Input resolution, stage sequencing, and the execution log for the
//! filter → amalgamate → search chain.

mod orchestrator;
mod report;
mod resolver;

pub use orchestrator::{Orchestrator, PipelineOptions};
pub use report::{category_counts, ArtifactSet, PipelineRun, StageLogEntry};
pub use resolver::{InputResolver, PolarityInputs};
