// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Stage runner
//!
//! Spawns one external stage executable, captures both output streams fully,
//! and classifies success strictly as exit code zero. A spawn failure (the
//! interpreter is missing) surfaces as a `Launch` error, distinct from a
//! tool that ran and reported failure. Stages are never retried here.

pub mod align;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::errors::{LipiflowError, LipiflowResult};
use crate::workspace::Workspace;

/// One planned subprocess invocation. Ephemeral: only the derived artifact
/// paths outlive the run, via the state store.
#[derive(Debug, Clone)]
pub struct StageInvocation {
    /// Human-facing title for the execution log ("PeakFilter (negative)")
    pub title: String,
    /// Program to spawn
    pub program: String,
    /// Ordered argument vector
    pub args: Vec<String>,
    /// Data fed to the child's stdin, if any
    pub stdin: Option<String>,
}

impl StageInvocation {
    /// The command line as shown in logs
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured outcome of one stage subprocess
#[derive(Debug, Clone)]
pub struct StageResult {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// Seam between the orchestrator and the operating system, so tests can
/// substitute a scripted runner and count spawns
#[async_trait]
pub trait StageRunner: Send + Sync {
    /// Run one stage to completion. `Err` means the process could not be
    /// started at all; a tool that ran and failed is an `Ok` result with
    /// `success == false`.
    async fn run(&self, invocation: &StageInvocation) -> LipiflowResult<StageResult>;
}

/// Real subprocess runner with a fixed working directory
pub struct ProcessRunner {
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            timeout: None,
        }
    }

    /// Construct from workspace settings, including the optional stage
    /// timeout
    pub fn for_workspace(workspace: &Workspace) -> Self {
        Self {
            working_dir: workspace.base_dir.clone(),
            timeout: workspace.stage_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[async_trait]
impl StageRunner for ProcessRunner {
    async fn run(&self, invocation: &StageInvocation) -> LipiflowResult<StageResult> {
        let command = invocation.command_line();
        tracing::debug!(stage = %invocation.title, %command, "spawning stage");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .current_dir(&self.working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd.stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });

        let mut child = cmd
            .spawn()
            .map_err(|e| LipiflowError::launch_failed(&invocation.program, e.to_string()))?;

        if let Some(ref input) = invocation.stdin {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
            }
        }

        let wait = child.wait_with_output();
        let output = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(output) => output?,
                Err(_) => {
                    // kill_on_drop reaps the child when the future is dropped
                    tracing::warn!(stage = %invocation.title, "stage timed out");
                    return Ok(StageResult {
                        command,
                        stdout: String::new(),
                        stderr: format!("stage timed out after {}s", limit.as_secs()),
                        exit_code: -1,
                        success: false,
                    });
                }
            },
            None => wait.await?,
        };

        let exit_code = output.status.code().unwrap_or(-1);
        Ok(StageResult {
            command,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code,
            success: output.status.success(),
        })
    }
}

/// Locate an interpreter up front, so a missing tool is reported before any
/// stage is attempted rather than as a mid-pipeline spawn failure
pub fn locate_tool(program: &str) -> LipiflowResult<PathBuf> {
    which::which(program).map_err(|e| LipiflowError::launch_failed(program, e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Invocation builders for the LipidFinder stage modules
// ─────────────────────────────────────────────────────────────────────────────

fn python_module(workspace: &Workspace, title: &str, module: &str, args: Vec<String>) -> StageInvocation {
    let mut full_args = vec!["-m".to_string(), module.to_string()];
    full_args.extend(args);
    StageInvocation {
        title: title.to_string(),
        program: workspace.python.clone(),
        args: full_args,
        stdin: None,
    }
}

/// PeakFilter: `-i <input> -p <params> [-o <outdir>] [--verbose] [--timestamp]`
pub fn peakfilter_invocation(
    workspace: &Workspace,
    title: &str,
    input: &Path,
    params_path: &Path,
    output_dir: Option<&Path>,
    verbose: bool,
    timestamp: bool,
) -> StageInvocation {
    let mut args = vec![
        "-i".to_string(),
        input.display().to_string(),
        "-p".to_string(),
        params_path.display().to_string(),
    ];
    if let Some(out) = output_dir {
        args.push("-o".to_string());
        args.push(out.display().to_string());
    }
    if verbose {
        args.push("--verbose".to_string());
    }
    if timestamp {
        args.push("--timestamp".to_string());
    }
    python_module(workspace, title, "LipidFinder.run_peakfilter", args)
}

/// Amalgamator: `-neg <file> -pos <file> -p <params> [-o <outdir>]`
pub fn amalgamator_invocation(
    workspace: &Workspace,
    neg_file: &Path,
    pos_file: &Path,
    params_path: &Path,
    output_dir: Option<&Path>,
) -> StageInvocation {
    let mut args = vec![
        "-neg".to_string(),
        neg_file.display().to_string(),
        "-pos".to_string(),
        pos_file.display().to_string(),
        "-p".to_string(),
        params_path.display().to_string(),
    ];
    if let Some(out) = output_dir {
        args.push("-o".to_string());
        args.push(out.display().to_string());
    }
    python_module(workspace, "Amalgamator", "LipidFinder.run_amalgamator", args)
}

/// MSSearch: `-i <input> -p <params> [-o <outdir>]`
pub fn mssearch_invocation(
    workspace: &Workspace,
    input: &Path,
    params_path: &Path,
    output_dir: Option<&Path>,
) -> StageInvocation {
    let mut args = vec![
        "-i".to_string(),
        input.display().to_string(),
        "-p".to_string(),
        params_path.display().to_string(),
    ];
    if let Some(out) = output_dir {
        args.push("-o".to_string());
        args.push(out.display().to_string());
    }
    python_module(workspace, "MSSearch", "LipidFinder.run_mssearch", args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(title: &str, script: &str) -> StageInvocation {
        StageInvocation {
            title: title.into(),
            program: "sh".into(),
            args: vec!["-c".into(), script.into()],
            stdin: None,
        }
    }

    #[tokio::test]
    async fn test_zero_exit_is_success() {
        let runner = ProcessRunner::new(std::env::temp_dir());
        let result = runner.run(&sh("ok", "echo out; echo err >&2")).await.unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, 0);
        assert!(result.stdout.contains("out"));
        assert!(result.stderr.contains("err"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure_not_error() {
        let runner = ProcessRunner::new(std::env::temp_dir());
        let result = runner.run(&sh("fail", "exit 3")).await.unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, 3);
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_error() {
        let runner = ProcessRunner::new(std::env::temp_dir());
        let invocation = StageInvocation {
            title: "missing".into(),
            program: "definitely-not-a-real-tool-xyz".into(),
            args: vec![],
            stdin: None,
        };

        let result = runner.run(&invocation).await;
        assert!(matches!(result, Err(LipiflowError::Launch { .. })));
    }

    #[tokio::test]
    async fn test_stdin_is_fed_to_child() {
        let runner = ProcessRunner::new(std::env::temp_dir());
        let invocation = StageInvocation {
            stdin: Some("hello-stdin\n".into()),
            ..sh("cat", "cat")
        };

        let result = runner.run(&invocation).await.unwrap();
        assert!(result.stdout.contains("hello-stdin"));
    }

    #[tokio::test]
    async fn test_timeout_reports_failure() {
        let mut runner = ProcessRunner::new(std::env::temp_dir());
        runner.timeout = Some(Duration::from_millis(100));

        let result = runner.run(&sh("slow", "sleep 5")).await.unwrap();
        assert!(!result.success);
        assert!(result.stderr.contains("timed out"));
    }

    #[test]
    fn test_locate_tool_missing_is_launch_error() {
        let result = locate_tool("definitely-not-a-real-tool-xyz");
        assert!(matches!(result, Err(LipiflowError::Launch { .. })));
    }

    #[test]
    fn test_invocation_builders() {
        let workspace = Workspace {
            base_dir: PathBuf::from("/work"),
            config_dir: PathBuf::from("/cfg"),
            python: "python3".into(),
            rscript: "Rscript".into(),
            align_script: PathBuf::from("/work/docs/xcms.R"),
            stage_timeout_secs: None,
        };

        let inv = peakfilter_invocation(
            &workspace,
            "PeakFilter (negative)",
            Path::new("/data/neg.csv"),
            Path::new("/cfg/peakfilter.json"),
            Some(Path::new("/out")),
            true,
            false,
        );
        assert_eq!(inv.program, "python3");
        assert_eq!(
            inv.args,
            vec![
                "-m",
                "LipidFinder.run_peakfilter",
                "-i",
                "/data/neg.csv",
                "-p",
                "/cfg/peakfilter.json",
                "-o",
                "/out",
                "--verbose"
            ]
        );

        let inv = amalgamator_invocation(
            &workspace,
            Path::new("/out/neg.csv"),
            Path::new("/out/pos.csv"),
            Path::new("/cfg/amalgamator.json"),
            None,
        );
        assert_eq!(inv.args[1], "LipidFinder.run_amalgamator");
        assert!(inv.command_line().starts_with("python3 -m"));
    }
}
