// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Portage.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so that a mistyped
//! key fails at startup with an actionable diagnostic instead of being
//! silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Portage configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides and CLI flag overrides on top.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortageConfig {
    /// Migration run parameters.
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Token endpoint and credential cache settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Destination API settings.
    #[serde(default)]
    pub destination: DestinationConfig,
}

/// Parameters governing a migration run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationConfig {
    /// Path to the message export (JSON array, upstream descending order).
    #[serde(default = "default_export_path")]
    pub export_path: String,

    /// Path to the checkpoint file (read on resume, rewritten per delivery).
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// UTC offset for timestamp localization, e.g. "+05:30".
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Locale tag for timestamp rendering (en-US, en-GB; anything else
    /// falls back to ISO formatting).
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Self-imposed delay between successful sends, in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    /// Maximum tolerated per-message delivery failures before aborting.
    #[serde(default = "default_error_budget")]
    pub error_budget: usize,

    /// Migrate messages marked deleted at the source.
    #[serde(default)]
    pub include_deleted: bool,

    /// Export files larger than this are staged to a spill file instead
    /// of being held in memory.
    #[serde(default = "default_spill_threshold")]
    pub spill_threshold_bytes: u64,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            export_path: default_export_path(),
            checkpoint_path: default_checkpoint_path(),
            timezone: default_timezone(),
            locale: default_locale(),
            pacing_ms: default_pacing_ms(),
            error_budget: default_error_budget(),
            include_deleted: false,
            spill_threshold_bytes: default_spill_threshold(),
            log_level: default_log_level(),
        }
    }
}

fn default_export_path() -> String {
    "export.json".to_string()
}

fn default_checkpoint_path() -> String {
    "migration-state.json".to_string()
}

fn default_timezone() -> String {
    "+00:00".to_string()
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_pacing_ms() -> u64 {
    100
}

fn default_error_budget() -> usize {
    5
}

fn default_spill_threshold() -> u64 {
    8 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Token endpoint and credential cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Path to the persisted credential cache file.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// OAuth2 token endpoint for the refresh-token exchange.
    #[serde(default)]
    pub token_url: String,

    /// OAuth client identifier. Overrides the cache entry when set.
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            token_url: String::new(),
            client_id: None,
        }
    }
}

fn default_cache_path() -> String {
    "credentials.json".to_string()
}

/// Destination API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    /// Base URL of the destination API, e.g. "https://chat.example.com/api".
    #[serde(default)]
    pub base_url: String,

    /// Identifier of the destination room/channel to post into.
    #[serde(default)]
    pub room_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = PortageConfig::default();
        assert_eq!(config.migration.pacing_ms, 100);
        assert_eq!(config.migration.error_budget, 5);
        assert_eq!(config.migration.timezone, "+00:00");
        assert!(!config.migration.include_deleted);
        assert_eq!(config.auth.cache_path, "credentials.json");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml_str = r#"
[migration]
export_path = "chat.json"
pacing_milis = 50
"#;
        assert!(toml::from_str::<PortageConfig>(toml_str).is_err());
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let toml_str = r#"
[migration]
error_budget = 10

[destination]
base_url = "https://chat.example.com/api"
room_id = "general"
"#;
        let config: PortageConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.migration.error_budget, 10);
        assert_eq!(config.migration.pacing_ms, 100);
        assert_eq!(config.destination.room_id, "general");
    }
}
