// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `portage run` command implementation.
//!
//! Assembles the full delivery stack from configuration: normalized
//! export feed, token manager, checkpoint store, destination client,
//! and the delivery engine. Prints a posted/total summary on both
//! success and fatal halt, with itemized per-message errors.

use std::io::IsTerminal;
use std::time::Duration;

use portage_checkpoint::{CheckpointStore, DeliveryFailure};
use portage_config::PortageConfig;
use portage_core::PortageError;
use portage_engine::{DeliveryEngine, DestinationClient};
use portage_format::Locale;
use tracing::{error, info};

/// Run a migration to completion. Returns the process exit code.
pub async fn run_migration(config: &PortageConfig) -> i32 {
    init_tracing(&config.migration.log_level);

    match execute(config).await {
        Ok(summary) => {
            print_summary(summary.posted, summary.total, &summary.errors, use_color());
            0
        }
        Err(err) => {
            error!(%err, "migration halted");
            // The checkpoint keeps the last-good partial progress.
            if let Ok(cp) = CheckpointStore::read(&config.migration.checkpoint_path) {
                print_summary(cp.posted, cp.total, &cp.errors, use_color());
            }
            eprintln!("Error: {err}");
            1
        }
    }
}

/// Wire up the stack and hand control to the engine.
async fn execute(config: &PortageConfig) -> Result<portage_engine::RunSummary, PortageError> {
    for (key, value) in [
        ("destination.base_url", &config.destination.base_url),
        ("destination.room_id", &config.destination.room_id),
        ("auth.token_url", &config.auth.token_url),
    ] {
        if value.trim().is_empty() {
            return Err(PortageError::Config(format!(
                "{key} is required to run a migration"
            )));
        }
    }

    let offset = portage_format::parse_offset(&config.migration.timezone)?;
    let locale = Locale::parse(&config.migration.locale);

    let spill_path = format!("{}.spill", config.migration.checkpoint_path);
    let feed = portage_source::open_export(
        &config.migration.export_path,
        &spill_path,
        config.migration.spill_threshold_bytes,
        config.migration.include_deleted,
    )?;
    info!(
        total = feed.len(),
        export = %config.migration.export_path,
        "export ready for delivery"
    );

    let tokens = portage_auth::TokenManager::load(&config.auth.cache_path, &config.auth.token_url)?
        .with_client_id(config.auth.client_id.clone());
    let checkpoint = CheckpointStore::open(&config.migration.checkpoint_path, feed.len())?;
    let destination =
        DestinationClient::new(&config.destination.base_url, &config.destination.room_id)?;

    let engine = DeliveryEngine::new(
        destination,
        tokens,
        checkpoint,
        Duration::from_millis(config.migration.pacing_ms),
        config.migration.error_budget,
        offset,
        locale,
    );
    engine.run(&feed).await
}

fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

/// Print the operator-facing completion summary.
fn print_summary(posted: usize, total: usize, errors: &[DeliveryFailure], use_color: bool) {
    println!();
    println!("  portage migration");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let counts = format!("{posted}/{total}");
        if errors.is_empty() && posted == total {
            println!("    Posted:   {} {}", "✓".green(), counts.green());
        } else {
            println!("    Posted:   {counts}");
        }
    } else {
        println!("    Posted:   {posted}/{total}");
    }

    if !errors.is_empty() {
        println!("    Errors:   {}", errors.len());
        for failure in errors {
            println!(
                "      [{}] {}: {}",
                failure.index, failure.sender, failure.message
            );
        }
    }
    println!();
}

/// Initialize the tracing subscriber from the configured log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("portage={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
