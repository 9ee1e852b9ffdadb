// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Parameter template provider
//!
//! The upstream toolkit ships a `parameters_template.json` describing every
//! recognized parameter: its type tag, default, and which stages use it.
//! The orchestration core never validates values against this schema; it is
//! consumed only by the `params` CLI for inspection and key checking.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::{StageKind, StageParams};
use crate::errors::{LipiflowError, LipiflowResult};

/// Declared type of a template parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ParamType {
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "str")]
    Str,
    #[serde(rename = "path")]
    Path,
    #[serde(rename = "selection")]
    Selection,
    #[serde(rename = "int range")]
    IntRange,
    #[serde(rename = "float range")]
    FloatRange,
    #[serde(rename = "multiselection")]
    MultiSelection,
    #[serde(rename = "pairs")]
    Pairs,
}

/// One entry of the parameter template
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateEntry {
    #[serde(rename = "type")]
    pub param_type: ParamType,

    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default)]
    pub description: Option<String>,

    /// Stages this parameter applies to
    #[serde(default)]
    pub modules: Vec<String>,
}

impl TemplateEntry {
    /// Initial value for an unset parameter, following the upstream rules:
    /// bools default to false, ranges to an open pair, collections to empty.
    pub fn default_value(&self) -> Value {
        if let Some(ref default) = self.default {
            return default.clone();
        }
        match self.param_type {
            ParamType::Bool => Value::Bool(false),
            ParamType::Path | ParamType::Str => Value::String(String::new()),
            ParamType::IntRange | ParamType::FloatRange => {
                Value::Array(vec![Value::Null, Value::Null])
            }
            ParamType::MultiSelection | ParamType::Pairs => Value::Array(vec![]),
            _ => Value::Null,
        }
    }
}

/// Provider of recognized parameter keys per stage
pub trait TemplateProvider {
    /// Entries applicable to the given stage, keyed by parameter name
    fn entries_for(&self, stage: StageKind) -> BTreeMap<String, TemplateEntry>;
}

/// Template provider backed by the upstream `parameters_template.json`
pub struct JsonTemplateProvider {
    entries: BTreeMap<String, TemplateEntry>,
}

impl JsonTemplateProvider {
    pub fn from_file(path: &Path) -> LipiflowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LipiflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> LipiflowResult<Self> {
        let entries: BTreeMap<String, TemplateEntry> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }
}

impl TemplateProvider for JsonTemplateProvider {
    fn entries_for(&self, stage: StageKind) -> BTreeMap<String, TemplateEntry> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.modules.iter().any(|m| m == stage.name()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Keys of a saved parameter set that the template does not recognize for
/// the stage
pub fn unknown_keys(
    provider: &dyn TemplateProvider,
    stage: StageKind,
    saved: &StageParams,
) -> Vec<String> {
    let known = provider.entries_for(stage);
    saved
        .keys()
        .filter(|k| !known.contains_key(*k))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"{
        "polarity": {
            "type": "selection",
            "default": "Negative",
            "modules": ["peakfilter"]
        },
        "mzFixedError": {
            "type": "float",
            "default": 0.005,
            "modules": ["peakfilter", "amalgamator"]
        },
        "database": {
            "type": "selection",
            "default": "all_lmsd",
            "modules": ["mssearch"]
        },
        "rtRange": {
            "type": "float range",
            "modules": ["peakfilter"]
        },
        "adducts": {
            "type": "pairs",
            "modules": ["mssearch"]
        }
    }"#;

    #[test]
    fn test_entries_filtered_by_stage() {
        let provider = JsonTemplateProvider::from_json(TEMPLATE).unwrap();

        let filter_keys: Vec<_> = provider
            .entries_for(StageKind::PeakFilter)
            .into_keys()
            .collect();
        assert_eq!(filter_keys, vec!["mzFixedError", "polarity", "rtRange"]);

        let search_keys: Vec<_> = provider
            .entries_for(StageKind::MsSearch)
            .into_keys()
            .collect();
        assert_eq!(search_keys, vec!["adducts", "database"]);
    }

    #[test]
    fn test_default_values() {
        let provider = JsonTemplateProvider::from_json(TEMPLATE).unwrap();
        let entries = provider.entries_for(StageKind::PeakFilter);

        assert_eq!(
            entries["polarity"].default_value(),
            Value::String("Negative".into())
        );
        // Ranges without an explicit default open up as [null, null]
        assert_eq!(
            entries["rtRange"].default_value(),
            Value::Array(vec![Value::Null, Value::Null])
        );
        let entries = provider.entries_for(StageKind::MsSearch);
        assert_eq!(entries["adducts"].default_value(), Value::Array(vec![]));
    }

    #[test]
    fn test_unknown_keys() {
        let provider = JsonTemplateProvider::from_json(TEMPLATE).unwrap();
        let mut saved = StageParams::new();
        saved.insert("polarity".into(), Value::from("Negative"));
        saved.insert("typo_key".into(), Value::from(1));

        let unknown = unknown_keys(&provider, StageKind::PeakFilter, &saved);
        assert_eq!(unknown, vec!["typo_key"]);
    }
}
