// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portage status` command implementation.
//!
//! Reads the checkpoint file and displays migration progress. Falls back
//! gracefully when no checkpoint exists yet.

use std::io::IsTerminal;

use portage_checkpoint::{Checkpoint, CheckpointStore};
use serde::Serialize;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub found: bool,
    pub completed: bool,
    pub posted: usize,
    pub total: usize,
    pub errors: usize,
    pub last_posted: i64,
    pub completed_at: Option<String>,
}

impl StatusReport {
    fn from_checkpoint(cp: &Checkpoint) -> Self {
        Self {
            found: true,
            completed: cp.completed,
            posted: cp.posted,
            total: cp.total,
            errors: cp.errors.len(),
            last_posted: cp.last_posted,
            completed_at: cp.completed_at.clone(),
        }
    }

    fn absent() -> Self {
        Self {
            found: false,
            completed: false,
            posted: 0,
            total: 0,
            errors: 0,
            last_posted: -1,
            completed_at: None,
        }
    }
}

/// Run the `portage status` command. Returns the process exit code.
///
/// If `--json` is passed, outputs structured JSON for scripting.
/// If `--plain` is passed or stdout is not a TTY, disables colors.
pub fn run_status(checkpoint_path: &str, json: bool, plain: bool) -> i32 {
    let use_color = !plain && std::io::stdout().is_terminal();

    match CheckpointStore::read(checkpoint_path) {
        Ok(cp) => {
            if json {
                print_json(&StatusReport::from_checkpoint(&cp));
            } else {
                print_progress(&cp, use_color);
            }
            0
        }
        Err(_) => {
            if json {
                print_json(&StatusReport::absent());
            } else {
                print_absent(checkpoint_path, use_color);
            }
            1
        }
    }
}

fn print_json(report: &StatusReport) {
    println!(
        "{}",
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Print checkpoint progress with optional colors.
fn print_progress(cp: &Checkpoint, use_color: bool) {
    println!();
    println!("  portage status");
    println!("  {}", "-".repeat(35));

    let counts = format!("{}/{}", cp.posted, cp.total);
    if use_color {
        use colored::Colorize;
        if cp.completed {
            println!("    State:    {} completed", "✓".green());
        } else {
            println!("    State:    {} in progress", "…".yellow());
        }
        println!("    Posted:   {}", counts.green());
    } else {
        let state = if cp.completed { "completed" } else { "in progress" };
        println!("    State:    {state}");
        println!("    Posted:   {counts}");
    }

    if let Some(at) = &cp.completed_at {
        println!("    Finished: {at}");
    }
    if !cp.errors.is_empty() {
        println!("    Errors:   {}", cp.errors.len());
        for failure in &cp.errors {
            println!(
                "      [{}] {}: {}",
                failure.index, failure.sender, failure.message
            );
        }
    }
    println!();
}

/// Print the no-checkpoint fallback.
fn print_absent(checkpoint_path: &str, use_color: bool) {
    println!();
    println!("  portage status");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        println!("    State:    {} {}", "✗".red(), "no checkpoint".red());
    } else {
        println!("    State:    [none] no checkpoint");
    }

    println!("    Path:     {checkpoint_path}");
    println!();
    println!("  Start with: portage run");
    println!();
}
