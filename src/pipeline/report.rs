// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Execution log and downstream artifact report
//!
//! Collects per-stage results into an ordered log, derives the artifact
//! paths the search stage is expected to have written, and computes a
//! best-effort category breakdown from the summary workbook.

use calamine::{open_workbook, Reader, Xlsx};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::runner::StageResult;

/// One attempted stage in the execution log
#[derive(Debug, Clone, Serialize)]
pub struct StageLogEntry {
    pub title: String,
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl StageLogEntry {
    pub fn new(title: &str, result: StageResult) -> Self {
        Self {
            title: title.to_string(),
            command: result.command,
            stdout: result.stdout,
            stderr: result.stderr,
            exit_code: result.exit_code,
            success: result.success,
        }
    }
}

/// Downstream artifacts derived from the search database name. The summary
/// and full tables are the xlsx workbooks the search tool writes; only paths
/// that exist on disk are reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactSet {
    pub amalgamated_csv: Option<PathBuf>,
    pub summary_table: Option<PathBuf>,
    pub category_chart: Option<PathBuf>,
    pub full_table: Option<PathBuf>,
}

impl ArtifactSet {
    /// Probe the output directory for the artifacts a search run against
    /// `db_name` would have produced
    pub fn probe(output_dir: &Path, db_name: &str, amalgamated: Option<&Path>) -> Self {
        Self {
            amalgamated_csv: amalgamated.filter(|p| p.is_file()).map(Path::to_path_buf),
            summary_table: existing(output_dir.join(format!("mssearch_{}_summary.xlsx", db_name))),
            category_chart: existing(output_dir.join(format!("category_scatterplot_{}.png", db_name))),
            full_table: existing(output_dir.join(format!("mssearch_{}.xlsx", db_name))),
        }
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

/// Full record of one pipeline invocation
#[derive(Debug, Serialize)]
pub struct PipelineRun {
    /// Stages attempted so far, in execution order
    pub entries: Vec<StageLogEntry>,
    /// AND of all attempted stage successes
    pub success: bool,
    pub output_dir: PathBuf,
    pub artifacts: ArtifactSet,
    /// Category → row count from the search summary table; empty when the
    /// summary is absent or unreadable
    pub category_counts: BTreeMap<String, u64>,
    /// Non-fatal problems (state not recorded, overlay fallback, ...)
    pub warnings: Vec<String>,
}

impl PipelineRun {
    pub fn started(output_dir: PathBuf) -> Self {
        Self {
            entries: Vec::new(),
            success: true,
            output_dir,
            artifacts: ArtifactSet::default(),
            category_counts: BTreeMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Append a stage result; a failed stage flips the overall flag
    pub fn push(&mut self, title: &str, result: StageResult) -> bool {
        let entry = StageLogEntry::new(title, result);
        let success = entry.success;
        self.success &= success;
        self.entries.push(entry);
        success
    }

    pub fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Count rows per category in a search summary workbook.
///
/// Best-effort: a missing file, an unreadable workbook, or an absent
/// `Category` column all yield an empty map, never an error.
pub fn category_counts(summary_table: &Path) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();

    let mut workbook: Xlsx<_> = match open_workbook(summary_table) {
        Ok(workbook) => workbook,
        Err(_) => return counts,
    };
    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        _ => return counts,
    };

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return counts;
    };
    let Some(category_idx) = header.iter().position(|cell| cell.to_string() == "Category") else {
        return counts;
    };

    for row in rows {
        if let Some(cell) = row.get(category_idx) {
            let category = cell.to_string();
            if !category.is_empty() {
                *counts.entry(category).or_insert(0) += 1;
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ok_result(command: &str) -> StageResult {
        StageResult {
            command: command.into(),
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            success: true,
        }
    }

    fn write_summary(path: &Path, rows: &[(&str, &str)]) {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Category").unwrap();
        for (i, (name, category)) in rows.iter().enumerate() {
            let row = (i + 1) as u32;
            sheet.write_string(row, 0, *name).unwrap();
            sheet.write_string(row, 1, *category).unwrap();
        }
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_push_tracks_overall_success() {
        let mut run = PipelineRun::started(PathBuf::from("/out"));
        assert!(run.push("PeakFilter (negative)", ok_result("cmd1")));

        let failed = StageResult {
            success: false,
            exit_code: 1,
            ..ok_result("cmd2")
        };
        assert!(!run.push("Amalgamator", failed));
        assert!(!run.success);
        assert_eq!(run.entries.len(), 2);
    }

    #[test]
    fn test_artifact_probe_reports_only_existing() {
        let temp = TempDir::new().unwrap();
        let summary = temp.path().join("mssearch_lmsd_summary.xlsx");
        std::fs::write(&summary, b"stub").unwrap();

        let artifacts = ArtifactSet::probe(temp.path(), "lmsd", None);
        assert_eq!(artifacts.summary_table, Some(summary));
        assert!(artifacts.category_chart.is_none());
        assert!(artifacts.full_table.is_none());
        assert!(artifacts.amalgamated_csv.is_none());
    }

    #[test]
    fn test_probe_finds_search_tool_workbooks() {
        // The search tool writes mssearch_<db>_summary.xlsx and
        // mssearch_<db>.xlsx; the probe must look for exactly those names.
        let temp = TempDir::new().unwrap();
        let summary = temp.path().join("mssearch_all_lmsd_summary.xlsx");
        let full = temp.path().join("mssearch_all_lmsd.xlsx");
        std::fs::write(&summary, b"stub").unwrap();
        std::fs::write(&full, b"stub").unwrap();

        let artifacts = ArtifactSet::probe(temp.path(), "all_lmsd", None);
        assert_eq!(artifacts.summary_table, Some(summary));
        assert_eq!(artifacts.full_table, Some(full));
    }

    #[test]
    fn test_category_counts() {
        let temp = TempDir::new().unwrap();
        let summary = temp.path().join("summary.xlsx");
        write_summary(
            &summary,
            &[
                ("a", "Glycerolipids"),
                ("b", "Sterols"),
                ("c", "Glycerolipids"),
                ("d", ""),
            ],
        );

        let counts = category_counts(&summary);
        assert_eq!(counts.get("Glycerolipids"), Some(&2));
        assert_eq!(counts.get("Sterols"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn test_category_counts_best_effort() {
        let temp = TempDir::new().unwrap();

        // Missing file
        assert!(category_counts(&temp.path().join("nope.xlsx")).is_empty());

        // Not a workbook at all
        let garbage = temp.path().join("garbage.xlsx");
        std::fs::write(&garbage, b"Name,Category\na,1\n").unwrap();
        assert!(category_counts(&garbage).is_empty());

        // No Category column
        let no_col = temp.path().join("no_col.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Name").unwrap();
        sheet.write_string(0, 1, "Mass").unwrap();
        sheet.write_string(1, 0, "a").unwrap();
        workbook.save(&no_col).unwrap();
        assert!(category_counts(&no_col).is_empty());
    }
}
