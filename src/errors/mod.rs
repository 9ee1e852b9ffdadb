// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Error types
//!
//! Configuration and resolution errors are raised before any subprocess is
//! spawned; stage failures carry the captured output of the tool that failed.
//! State-store persistence problems are deliberately NOT part of this enum:
//! they degrade to warnings (see `pipeline::report`).

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for lipiflow operations
pub type LipiflowResult<T> = Result<T, LipiflowError>;

/// Main error type for lipiflow
#[derive(Error, Debug, Diagnostic)]
pub enum LipiflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Missing required setting: {setting}")]
    #[diagnostic(code(lipiflow::configuration))]
    Configuration {
        setting: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Resolution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("No usable input for stage '{stage}': {detail}")]
    #[diagnostic(code(lipiflow::missing_input))]
    MissingInput {
        stage: String,
        detail: String,
        #[help]
        help: Option<String>,
    },

    #[error("Missing parameters for: {}", stages.join(", "))]
    #[diagnostic(
        code(lipiflow::missing_parameters),
        help("Save a parameter set for each listed stage with 'lipiflow params' first")
    )]
    MissingParameters { stages: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Tool '{tool}' could not be started: {error}")]
    #[diagnostic(
        code(lipiflow::launch_failed),
        help("{suggestion}")
    )]
    Launch {
        tool: String,
        error: String,
        suggestion: String,
    },

    #[error("Stage '{stage}' reported an error (exit code {exit_code})")]
    #[diagnostic(
        code(lipiflow::stage_failed),
        help("Inspect the captured stderr of the stage for details")
    )]
    StageFailed { stage: String, exit_code: i32 },

    #[error("Alignment produced no report at {path}")]
    #[diagnostic(
        code(lipiflow::alignment_no_output),
        help("The alignment tool exited cleanly but the expected CSV was not written. \
              Check the data directory and the tool's own log output.")
    )]
    AlignmentNoOutput { path: PathBuf },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(lipiflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(lipiflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(lipiflow::io_error))]
    Io { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(lipiflow::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(lipiflow::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for LipiflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_json::Error> for LipiflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for LipiflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl LipiflowError {
    /// Create a launch error with an installation suggestion for known tools
    pub fn launch_failed(tool: &str, error: String) -> Self {
        let suggestion = match tool {
            "Rscript" => "Install R and ensure Rscript is in your PATH, \
                          or pass --rscript with the full path"
                .to_string(),
            "python" | "python3" => {
                "Install Python with the LipidFinder package and ensure it's in your PATH"
                    .to_string()
            }
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::Launch {
            tool: tool.to_string(),
            error,
            suggestion,
        }
    }

    /// Create a missing-input error with stage context
    pub fn missing_input(stage: &str, detail: &str) -> Self {
        Self::MissingInput {
            stage: stage.to_string(),
            detail: detail.to_string(),
            help: Some(format!(
                "Provide an explicit input, or run the stages feeding '{}' first",
                stage
            )),
        }
    }

    /// Create a configuration error for a missing top-level setting
    pub fn missing_setting(setting: &str) -> Self {
        Self::Configuration {
            setting: setting.to_string(),
            help: Some(format!("Pass --{} or set it in lipiflow.toml", setting)),
        }
    }
}
