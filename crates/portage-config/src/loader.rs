// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./portage.toml` > `~/.config/portage/portage.toml`
//! > `/etc/portage-tools/portage.toml` with environment variable overrides
//! via the `PORTAGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PortageConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/portage-tools/portage.toml` (system-wide)
/// 3. `~/.config/portage/portage.toml` (user XDG config)
/// 4. `./portage.toml` (local directory)
/// 5. `PORTAGE_*` environment variables
pub fn load_config() -> Result<PortageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortageConfig::default()))
        .merge(Toml::file("/etc/portage-tools/portage.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("portage/portage.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("portage.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<PortageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortageConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PortageConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PortageConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `PORTAGE_MIGRATION_ERROR_BUDGET` must
/// map to `migration.error_budget`, not `migration.error.budget`.
fn env_provider() -> Env {
    Env::prefixed("PORTAGE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("migration_", "migration.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("destination_", "destination.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_defaults_from_empty_string() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.migration.pacing_ms, 100);
        assert_eq!(config.migration.error_budget, 5);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
[migration]
pacing_ms = 250
timezone = "+05:30"

[auth]
token_url = "https://login.example.com/oauth2/token"
"#,
        )
        .unwrap();
        assert_eq!(config.migration.pacing_ms, 250);
        assert_eq!(config.migration.timezone, "+05:30");
        assert_eq!(config.auth.token_url, "https://login.example.com/oauth2/token");
    }

    #[test]
    fn env_var_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "portage.toml",
                r#"
[migration]
error_budget = 3
"#,
            )?;
            jail.set_env("PORTAGE_MIGRATION_ERROR_BUDGET", "7");
            let config: PortageConfig = Figment::new()
                .merge(Serialized::defaults(PortageConfig::default()))
                .merge(Toml::file("portage.toml"))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.migration.error_budget, 7);
            Ok(())
        });
    }

    #[test]
    fn env_mapping_preserves_underscored_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PORTAGE_MIGRATION_SPILL_THRESHOLD_BYTES", "1024");
            jail.set_env("PORTAGE_DESTINATION_ROOM_ID", "general");
            let config: PortageConfig = Figment::new()
                .merge(Serialized::defaults(PortageConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.migration.spill_threshold_bytes, 1024);
            assert_eq!(config.destination.room_id, "general");
            Ok(())
        });
    }
}
