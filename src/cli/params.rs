// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! Params command - inspect saved stage parameters against the template

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::ParamsAction;
use crate::params::template::{unknown_keys, JsonTemplateProvider, TemplateProvider};
use crate::params::StageKind;

pub async fn run(action: ParamsAction, config_dir: Option<PathBuf>, verbose: bool) -> Result<()> {
    let workspace = super::resolve_workspace(config_dir)?;
    let params = workspace.param_store();

    match action {
        ParamsAction::Show { stage, template } => {
            let stage = parse_stage(&stage)?;
            let provider = JsonTemplateProvider::from_file(&template)?;
            let entries = provider.entries_for(stage);
            let saved = params.load(stage).unwrap_or_default();

            println!(
                "{} parameters ({})",
                stage.title().bold(),
                params.path(stage).display()
            );
            for (key, entry) in &entries {
                let value = saved
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| entry.default_value());
                println!("  {} = {}", key.bold(), value);
                if verbose {
                    if let Some(ref description) = entry.description {
                        println!("      {}", description.dimmed());
                    }
                }
            }
        }

        ParamsAction::Check { stage, template } => {
            let stage = parse_stage(&stage)?;

            if !params.exists(stage) {
                println!(
                    "  {} no saved parameters for {} (expected {})",
                    "✗".red(),
                    stage.title().bold(),
                    params.path(stage).display()
                );
                return Err(crate::LipiflowError::MissingParameters {
                    stages: vec![stage.title().to_string()],
                }
                .into());
            }

            let provider = JsonTemplateProvider::from_file(&template)?;
            let saved = params.load(stage)?;
            let unknown = unknown_keys(&provider, stage, &saved);

            if unknown.is_empty() {
                println!(
                    "  {} {} parameters look good ({} keys)",
                    "✓".green(),
                    stage.title().bold(),
                    saved.len()
                );
            } else {
                println!(
                    "  {} {} has keys the template does not recognize:",
                    "⚠".yellow(),
                    stage.title().bold()
                );
                for key in &unknown {
                    println!("    - {}", key);
                }
            }
        }
    }

    Ok(())
}

fn parse_stage(name: &str) -> Result<StageKind> {
    StageKind::from_name(name).ok_or_else(|| {
        miette::miette!(
            "Unknown stage '{}'. Expected one of: peakfilter, amalgamator, mssearch",
            name
        )
    })
}
