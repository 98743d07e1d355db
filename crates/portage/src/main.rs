// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Portage - resumable chat message migration.
//!
//! This is the binary entry point: load and validate configuration,
//! apply CLI overrides, and dispatch to the run/status commands.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Args, Parser, Subcommand};
use portage_config::PortageConfig;

mod run;
mod status;

/// Portage - resumable chat message migration.
#[derive(Parser, Debug)]
#[command(name = "portage", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute (or resume) a migration run.
    Run(RunArgs),
    /// Show checkpoint progress for a migration.
    Status(StatusArgs),
}

/// Overrides for `[migration]`, `[auth]`, and `[destination]` config.
#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Path to the message export (JSON array).
    #[arg(long)]
    export: Option<String>,

    /// Path to the checkpoint file.
    #[arg(long)]
    checkpoint: Option<String>,

    /// UTC offset for timestamps, e.g. "+05:30".
    #[arg(long)]
    timezone: Option<String>,

    /// Locale tag for timestamps (en-US, en-GB).
    #[arg(long)]
    locale: Option<String>,

    /// Delay between successful sends, in milliseconds.
    #[arg(long)]
    pacing_ms: Option<u64>,

    /// Maximum tolerated per-message delivery failures.
    #[arg(long)]
    error_budget: Option<usize>,

    /// Also migrate messages marked deleted at the source.
    #[arg(long)]
    include_deleted: bool,

    /// Destination API base URL.
    #[arg(long)]
    base_url: Option<String>,

    /// Destination room/channel identifier.
    #[arg(long)]
    room: Option<String>,

    /// Path to the credential cache file.
    #[arg(long)]
    cache: Option<String>,

    /// OAuth2 token endpoint for refresh.
    #[arg(long)]
    token_url: Option<String>,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Path to the checkpoint file.
    #[arg(long)]
    checkpoint: Option<String>,

    /// Output structured JSON for scripting.
    #[arg(long)]
    json: bool,

    /// Disable colored output.
    #[arg(long)]
    plain: bool,
}

impl RunArgs {
    /// Apply CLI overrides on top of the loaded configuration.
    fn apply(self, config: &mut PortageConfig) {
        let m = &mut config.migration;
        if let Some(v) = self.export {
            m.export_path = v;
        }
        if let Some(v) = self.checkpoint {
            m.checkpoint_path = v;
        }
        if let Some(v) = self.timezone {
            m.timezone = v;
        }
        if let Some(v) = self.locale {
            m.locale = v;
        }
        if let Some(v) = self.pacing_ms {
            m.pacing_ms = v;
        }
        if let Some(v) = self.error_budget {
            m.error_budget = v;
        }
        if self.include_deleted {
            m.include_deleted = true;
        }
        if let Some(v) = self.base_url {
            config.destination.base_url = v;
        }
        if let Some(v) = self.room {
            config.destination.room_id = v;
        }
        if let Some(v) = self.cache {
            config.auth.cache_path = v;
        }
        if let Some(v) = self.token_url {
            config.auth.token_url = v;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match portage_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            portage_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let exit_code = match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            run::run_migration(&config).await
        }
        Commands::Status(args) => {
            let checkpoint_path = args
                .checkpoint
                .unwrap_or_else(|| config.migration.checkpoint_path.clone());
            status::run_status(&checkpoint_path, args.json, args.plain)
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_override_config() {
        let mut config = PortageConfig::default();
        let args = RunArgs {
            export: Some("chat.json".into()),
            error_budget: Some(9),
            include_deleted: true,
            room: Some("general".into()),
            ..RunArgs::default()
        };
        args.apply(&mut config);
        assert_eq!(config.migration.export_path, "chat.json");
        assert_eq!(config.migration.error_budget, 9);
        assert!(config.migration.include_deleted);
        assert_eq!(config.destination.room_id, "general");
        // Untouched fields keep their defaults.
        assert_eq!(config.migration.pacing_ms, 100);
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = portage_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.migration.error_budget, 5);
    }
}
