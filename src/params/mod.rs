// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Stage parameter sets
//!
//! Each stage keeps its saved configuration as one JSON document in the
//! config directory. The existence of that document gates whether the stage
//! may run at all; the orchestrator checks this before spawning anything.
//! Values themselves are opaque to the orchestration core; typed modeling
//! and schema checks live in [`template`].

pub mod template;

pub use template::{ParamType, TemplateEntry, TemplateProvider, JsonTemplateProvider};

use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::{LipiflowError, LipiflowResult};

/// The three parameter-gated pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    PeakFilter,
    Amalgamator,
    MsSearch,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [Self::PeakFilter, Self::Amalgamator, Self::MsSearch];

    /// Stable lowercase name used for config file names and template lookups
    pub fn name(&self) -> &'static str {
        match self {
            Self::PeakFilter => "peakfilter",
            Self::Amalgamator => "amalgamator",
            Self::MsSearch => "mssearch",
        }
    }

    /// Human-facing stage title
    pub fn title(&self) -> &'static str {
        match self {
            Self::PeakFilter => "PeakFilter",
            Self::Amalgamator => "Amalgamator",
            Self::MsSearch => "MSSearch",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "peakfilter" => Some(Self::PeakFilter),
            "amalgamator" => Some(Self::Amalgamator),
            "mssearch" => Some(Self::MsSearch),
            _ => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A saved parameter bag for one stage. Values stay untyped JSON here.
pub type StageParams = Map<String, Value>;

/// Store for per-stage saved parameter sets
pub struct ParamStore {
    config_dir: PathBuf,
}

impl ParamStore {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Path of the saved parameter document for a stage
    pub fn path(&self, stage: StageKind) -> PathBuf {
        self.config_dir.join(format!("{}.json", stage.name()))
    }

    /// Whether a usable parameter set is saved for a stage
    pub fn exists(&self, stage: StageKind) -> bool {
        self.path(stage).is_file()
    }

    /// Load the saved parameter set for a stage
    pub fn load(&self, stage: StageKind) -> LipiflowResult<StageParams> {
        let path = self.path(stage);
        let content = std::fs::read_to_string(&path).map_err(|e| LipiflowError::FileReadError {
            path: path.clone(),
            error: e.to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| LipiflowError::FileReadError {
            path,
            error: e.to_string(),
        })
    }

    /// Save a parameter set for a stage
    pub fn save(&self, stage: StageKind, params: &StageParams) -> LipiflowResult<()> {
        let path = self.path(stage);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(params)?;
        std::fs::write(&path, json).map_err(|e| LipiflowError::FileWriteError {
            path,
            error: e.to_string(),
        })
    }

    /// Write the transient MSSearch overlay used by full pipeline runs.
    ///
    /// Clones the saved search parameters, defaults `plotCategories` and
    /// `summary` to true, and forces `figFormat` to `"png"` so chart output
    /// is web-renderable. The saved document is never touched; the overlay
    /// goes to its own scratch file, overwritten on every run.
    pub fn write_search_overlay(&self) -> LipiflowResult<PathBuf> {
        let mut params = self.load(StageKind::MsSearch).unwrap_or_default();

        params
            .entry("plotCategories".to_string())
            .or_insert(Value::Bool(true));
        params
            .entry("summary".to_string())
            .or_insert(Value::Bool(true));
        params.insert("figFormat".to_string(), Value::String("png".into()));

        let path = self.config_dir.join("mssearch_pipeline.json");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&params)?;
        std::fs::write(&path, &json).map_err(|e| LipiflowError::FileWriteError {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Ok(path)
    }

    /// Search database name from the saved MSSearch set, lowercased, with
    /// the upstream default when unset
    pub fn search_database(&self) -> String {
        self.load(StageKind::MsSearch)
            .ok()
            .and_then(|p| {
                p.get("database")
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase())
            })
            .unwrap_or_else(|| "all_lmsd".to_string())
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ParamStore) {
        let temp = TempDir::new().unwrap();
        let store = ParamStore::new(temp.path().to_path_buf());
        (temp, store)
    }

    #[test]
    fn test_exists_gates_on_file() {
        let (_temp, store) = store();
        assert!(!store.exists(StageKind::PeakFilter));

        store
            .save(StageKind::PeakFilter, &StageParams::new())
            .unwrap();
        assert!(store.exists(StageKind::PeakFilter));
        assert!(!store.exists(StageKind::Amalgamator));
    }

    #[test]
    fn test_save_load_round_trip() {
        let (_temp, store) = store();
        let mut params = StageParams::new();
        params.insert("mzFixedError".into(), Value::from(0.005));
        params.insert("database".into(), Value::from("LMSD"));

        store.save(StageKind::MsSearch, &params).unwrap();
        let loaded = store.load(StageKind::MsSearch).unwrap();
        assert_eq!(loaded, params);
    }

    #[test]
    fn test_search_overlay_forces_defaults_without_mutating_saved() {
        let (_temp, store) = store();
        let mut params = StageParams::new();
        params.insert("figFormat".into(), Value::from("pdf"));
        params.insert("plotCategories".into(), Value::Bool(false));
        store.save(StageKind::MsSearch, &params).unwrap();

        let overlay_path = store.write_search_overlay().unwrap();
        let overlay: StageParams =
            serde_json::from_str(&std::fs::read_to_string(&overlay_path).unwrap()).unwrap();

        // figFormat forced, plotCategories only defaulted (kept as saved),
        // summary defaulted in
        assert_eq!(overlay.get("figFormat"), Some(&Value::from("png")));
        assert_eq!(overlay.get("plotCategories"), Some(&Value::Bool(false)));
        assert_eq!(overlay.get("summary"), Some(&Value::Bool(true)));

        // Saved document untouched
        let saved = store.load(StageKind::MsSearch).unwrap();
        assert_eq!(saved.get("figFormat"), Some(&Value::from("pdf")));
        assert!(!saved.contains_key("summary"));
    }

    #[test]
    fn test_search_database_default() {
        let (_temp, store) = store();
        assert_eq!(store.search_database(), "all_lmsd");

        let mut params = StageParams::new();
        params.insert("database".into(), Value::from("COMP_DB"));
        store.save(StageKind::MsSearch, &params).unwrap();
        assert_eq!(store.search_database(), "comp_db");
    }

    #[test]
    fn test_stage_kind_from_name() {
        assert_eq!(StageKind::from_name("MSSearch"), Some(StageKind::MsSearch));
        assert_eq!(StageKind::from_name("nope"), None);
    }
}
