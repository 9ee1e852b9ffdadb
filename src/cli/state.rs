// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 lipiflow contributors

//! State command - inspect the persistent run state

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::StateAction;
use crate::state::StateStore;

pub async fn run(action: StateAction, config_dir: Option<PathBuf>, _verbose: bool) -> Result<()> {
    let workspace = super::resolve_workspace(config_dir)?;
    let store = workspace.state_store();

    match action {
        StateAction::Show => {
            let state = store.read();
            if state.is_empty() {
                println!(
                    "No recorded state at {}",
                    workspace.state_path().display().to_string().dimmed()
                );
                return Ok(());
            }

            println!("{} ({})", "Run state".bold(), workspace.state_path().display());
            for (key, value) in &state {
                // Entries may point at files deleted since they were
                // recorded; show which ones are still usable.
                let marker = if Path::new(value).is_file() {
                    "✓".green()
                } else {
                    "✗".red()
                };
                println!("  {} {} = {}", marker, key.bold(), value);
            }
        }
    }

    Ok(())
}
