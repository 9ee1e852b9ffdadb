// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! # lipiflow - lipidomics pipeline orchestrator
//!
//! `lipiflow` drives a LipidFinder-style processing chain: an external
//! alignment tool produces aligned peak CSVs, which flow through per-polarity
//! peak filtering, polarity amalgamation, and compound search. Each stage is
//! an independent executable invoked as a subprocess; artifacts pass between
//! stages through the filesystem, and a persistent state document lets every
//! stage auto-resolve its input from the most recent output of a prior one.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run the alignment tool over a directory of mzXML files
//! lipiflow align --data-dir ./mzxml_neg --report batch_neg
//!
//! # Run a single stage (input auto-resolved from the last alignment)
//! lipiflow filter --output-dir ./results
//!
//! # Run the whole chain
//! lipiflow pipeline --output-dir ./results
//!
//! # Inspect recorded state and saved parameters
//! lipiflow state show
//! lipiflow params check mssearch
//! ```

pub mod cli;
pub mod errors;
pub mod params;
pub mod pipeline;
pub mod polarity;
pub mod runner;
pub mod state;
pub mod workspace;

// Re-export commonly used types
pub use errors::{LipiflowError, LipiflowResult};
pub use pipeline::{Orchestrator, PipelineOptions, PipelineRun};
pub use state::{RunState, StateStore};
pub use workspace::Workspace;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
