// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Workspace configuration
//!
//! Resolves where state and parameter documents live and which interpreters
//! run the external stages. Settings come from an optional `lipiflow.toml`
//! in the base directory, overridden by CLI flags where exposed.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::errors::{LipiflowError, LipiflowResult};
use crate::params::ParamStore;
use crate::state::JsonStateStore;

/// Optional settings read from `lipiflow.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Directory holding state.json and per-stage parameter documents
    pub config_dir: Option<PathBuf>,

    /// Python interpreter running the LipidFinder stage modules
    pub python: Option<String>,

    /// Rscript interpreter running the alignment script
    pub rscript: Option<String>,

    /// Alignment R script, relative to the base directory unless absolute
    pub align_script: Option<PathBuf>,

    /// Optional per-stage timeout in seconds. Off by default: a hung stage
    /// blocks the run, matching the historical behavior.
    pub stage_timeout_secs: Option<u64>,
}

impl WorkspaceConfig {
    pub fn from_file(path: &Path) -> LipiflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LipiflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(Into::into)
    }
}

/// Resolved workspace
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Working directory for all stage subprocesses
    pub base_dir: PathBuf,
    pub config_dir: PathBuf,
    pub python: String,
    pub rscript: String,
    pub align_script: PathBuf,
    pub stage_timeout_secs: Option<u64>,
}

impl Workspace {
    /// Resolve the workspace from the base directory.
    ///
    /// Reads `lipiflow.toml` when present; `config_dir_override` (from the
    /// CLI) wins over both the file and the per-user default.
    pub fn resolve(base_dir: PathBuf, config_dir_override: Option<PathBuf>) -> LipiflowResult<Self> {
        let config_path = base_dir.join("lipiflow.toml");
        let config = if config_path.is_file() {
            WorkspaceConfig::from_file(&config_path)?
        } else {
            WorkspaceConfig::default()
        };

        let config_dir = config_dir_override
            .or(config.config_dir)
            .unwrap_or_else(Self::default_config_dir);

        let align_script = config
            .align_script
            .unwrap_or_else(|| PathBuf::from("docs").join("xcms.R"));
        let align_script = if align_script.is_absolute() {
            align_script
        } else {
            base_dir.join(align_script)
        };

        Ok(Self {
            base_dir,
            config_dir,
            python: config.python.unwrap_or_else(|| "python".to_string()),
            rscript: config.rscript.unwrap_or_else(|| "Rscript".to_string()),
            align_script,
            stage_timeout_secs: config.stage_timeout_secs,
        })
    }

    fn default_config_dir() -> PathBuf {
        directories::ProjectDirs::from("", "", "lipiflow")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".lipiflow"))
    }

    pub fn state_path(&self) -> PathBuf {
        self.config_dir.join("state.json")
    }

    pub fn state_store(&self) -> JsonStateStore {
        JsonStateStore::new(self.state_path())
    }

    pub fn param_store(&self) -> ParamStore {
        ParamStore::new(self.config_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::resolve(temp.path().to_path_buf(), None).unwrap();

        assert_eq!(ws.python, "python");
        assert_eq!(ws.rscript, "Rscript");
        assert_eq!(ws.align_script, temp.path().join("docs").join("xcms.R"));
        assert!(ws.stage_timeout_secs.is_none());
    }

    #[test]
    fn test_config_file_and_override() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("lipiflow.toml"),
            r#"
python = "python3"
config_dir = "/tmp/lf-config"
stage_timeout_secs = 3600
"#,
        )
        .unwrap();

        let ws = Workspace::resolve(temp.path().to_path_buf(), None).unwrap();
        assert_eq!(ws.python, "python3");
        assert_eq!(ws.config_dir, PathBuf::from("/tmp/lf-config"));
        assert_eq!(ws.stage_timeout_secs, Some(3600));

        // CLI override beats the file
        let ws = Workspace::resolve(
            temp.path().to_path_buf(),
            Some(PathBuf::from("/tmp/other")),
        )
        .unwrap();
        assert_eq!(ws.config_dir, PathBuf::from("/tmp/other"));
    }

    #[test]
    fn test_unknown_config_key_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("lipiflow.toml"), "pythn = \"oops\"\n").unwrap();

        let result = Workspace::resolve(temp.path().to_path_buf(), None);
        assert!(matches!(result, Err(LipiflowError::Toml { .. })));
    }
}
