// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Persistent run state
//!
//! A flat string→string document recording where prior stage runs left their
//! artifacts, so later stages can auto-resolve their inputs. The store is
//! deliberately forgiving: a missing or corrupt document reads as empty, and
//! write failures are reported as warnings rather than errors, because the
//! current request never depends on the write succeeding; only future
//! auto-resolution does.
//!
//! There is no locking. Concurrent pipeline runs can interleave updates and
//! the whole document is rewritten on each update (last writer wins). This is
//! an accepted relaxation for a single-operator local tool.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Flat key→value record of artifact locations from prior runs
pub type RunState = BTreeMap<String, String>;

// State keys, kept identical to documents written by earlier releases so
// recorded state stays readable.
pub const XCMS_LAST_CSV: &str = "xcms_last_csv";
pub const XCMS_LAST_NEGATIVE_CSV: &str = "xcms_last_negative_csv";
pub const XCMS_LAST_POSITIVE_CSV: &str = "xcms_last_positive_csv";
pub const PEAKFILTER_LAST_NEGATIVE_SUMMARY: &str = "peakfilter_last_negative_summary";
pub const PEAKFILTER_LAST_POSITIVE_SUMMARY: &str = "peakfilter_last_positive_summary";
pub const PEAKFILTER_LAST_SUMMARY: &str = "peakfilter_last_summary";
pub const AMALGAMATOR_LAST_CSV: &str = "amalgamator_last_csv";

/// Non-fatal persistence problem, surfaced alongside results instead of
/// failing the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceWarning {
    pub message: String,
}

impl std::fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "state not recorded: {}", self.message)
    }
}

/// Durable key→value store consulted by the input resolver and updated by
/// the orchestrator after each successful stage
pub trait StateStore: Send + Sync {
    /// Read the whole state document. Never fails: any read or parse
    /// problem yields an empty map.
    fn read(&self) -> RunState;

    /// Merge non-empty entries into the persisted document and rewrite it.
    /// Best-effort: an `Err` is a warning for the caller to log, not a
    /// failure of the current operation.
    fn update(&self, partial: &[(&str, Option<String>)]) -> Result<(), PersistenceWarning>;
}

/// JSON-file-backed state store
///
/// Persists the document at a fixed path, pretty-printed for hand inspection.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonStateStore {
    fn read(&self) -> RunState {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return RunState::new();
        };

        // Tolerate non-string values left by other writers by keeping only
        // the string entries.
        match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|(k, v)| match v {
                    Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect(),
            Err(_) => RunState::new(),
        }
    }

    fn update(&self, partial: &[(&str, Option<String>)]) -> Result<(), PersistenceWarning> {
        let mut state = self.read();
        for (key, value) in partial {
            if let Some(value) = value {
                state.insert((*key).to_string(), value.clone());
            }
        }

        let json = serde_json::to_string_pretty(&state).map_err(|e| PersistenceWarning {
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| PersistenceWarning {
                message: e.to_string(),
            })?;
        }

        std::fs::write(&self.path, json).map_err(|e| PersistenceWarning {
            message: format!("{}: {}", self.path.display(), e),
        })
    }
}

/// In-memory state store for tests and dry runs
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<RunState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with initial entries
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock().unwrap();
            for (k, v) in entries {
                state.insert((*k).to_string(), (*v).to_string());
            }
        }
        store
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self) -> RunState {
        self.state.lock().unwrap().clone()
    }

    fn update(&self, partial: &[(&str, Option<String>)]) -> Result<(), PersistenceWarning> {
        let mut state = self.state.lock().unwrap();
        for (key, value) in partial {
            if let Some(value) = value {
                state.insert((*key).to_string(), value.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_empty() {
        let temp = TempDir::new().unwrap();
        let store = JsonStateStore::new(temp.path().join("state.json"));
        assert!(store.read().is_empty());
    }

    #[test]
    fn test_corrupt_file_reads_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");

        for garbage in ["", "{\"truncated\": \"doc", "[1, 2, 3]"] {
            std::fs::write(&path, garbage).unwrap();
            let store = JsonStateStore::new(path.clone());
            assert!(store.read().is_empty(), "garbage input: {:?}", garbage);
        }
    }

    #[test]
    fn test_non_string_values_dropped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, r#"{"a": "x", "b": 3, "c": null}"#).unwrap();

        let store = JsonStateStore::new(path);
        let state = store.read();
        assert_eq!(state.get("a").map(String::as_str), Some("x"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_update_merges_and_skips_none() {
        let temp = TempDir::new().unwrap();
        let store = JsonStateStore::new(temp.path().join("state.json"));

        store
            .update(&[("a", Some("x".into())), ("b", None)])
            .unwrap();
        store.update(&[("c", Some("y".into()))]).unwrap();

        let state = store.read();
        assert_eq!(state.get("a").map(String::as_str), Some("x"));
        assert!(!state.contains_key("b"));
        assert_eq!(state.get("c").map(String::as_str), Some("y"));
    }

    #[test]
    fn test_update_idempotent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json");
        let store = JsonStateStore::new(path.clone());

        store.update(&[("a", Some("x".into()))]).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();

        store.update(&[("a", Some("x".into()))]).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_update_overwrites_existing_key() {
        let store = MemoryStateStore::new();
        store.update(&[("a", Some("x".into()))]).unwrap();
        store.update(&[("a", Some("y".into()))]).unwrap();

        assert_eq!(store.read().get("a").map(String::as_str), Some("y"));
    }

    #[test]
    fn test_unwritable_path_is_warning_not_panic() {
        let temp = TempDir::new().unwrap();
        // A plain file where the parent directory should be makes both
        // create_dir_all and the write fail.
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let store = JsonStateStore::new(blocker.join("state.json"));
        let result = store.update(&[("a", Some("x".into()))]);
        assert!(result.is_err());
    }
}
