// SPDX-FileCopyrightText: 2026 Portage Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: offset syntax, URL schemes, non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::PortageConfig;

/// Log levels accepted by the tracing subscriber.
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &PortageConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.migration.export_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "migration.export_path must not be empty".to_string(),
        });
    }

    if config.migration.checkpoint_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "migration.checkpoint_path must not be empty".to_string(),
        });
    }

    if !is_valid_offset(&config.migration.timezone) {
        errors.push(ConfigError::Validation {
            message: format!(
                "migration.timezone `{}` is not a UTC offset of the form +HH:MM or -HH:MM",
                config.migration.timezone
            ),
        });
    }

    if config.migration.spill_threshold_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "migration.spill_threshold_bytes must be positive".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.migration.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "migration.log_level `{}` is not one of: {}",
                config.migration.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.auth.cache_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "auth.cache_path must not be empty".to_string(),
        });
    }

    // URLs are optional at load time (the run command requires them),
    // but when present they must be http(s).
    for (key, url) in [
        ("auth.token_url", &config.auth.token_url),
        ("destination.base_url", &config.destination.base_url),
    ] {
        if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{url}` must be an http(s) URL"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a `+HH:MM` / `-HH:MM` UTC offset string.
fn is_valid_offset(s: &str) -> bool {
    let bytes = s.as_bytes();
    if !s.is_ascii() || bytes.len() != 6 || (bytes[0] != b'+' && bytes[0] != b'-') || bytes[3] != b':'
    {
        return false;
    }
    let hours: u32 = match s[1..3].parse() {
        Ok(h) => h,
        Err(_) => return false,
    };
    let minutes: u32 = match s[4..6].parse() {
        Ok(m) => m,
        Err(_) => return false,
    };
    hours <= 14 && minutes < 60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = PortageConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_checkpoint_path_fails_validation() {
        let mut config = PortageConfig::default();
        config.migration.checkpoint_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("checkpoint_path"))
        ));
    }

    #[test]
    fn malformed_timezone_fails_validation() {
        for tz in ["UTC", "+5:30", "+25:00", "+05:75", "05:30"] {
            let mut config = PortageConfig::default();
            config.migration.timezone = tz.to_string();
            let errors = validate_config(&config).unwrap_err();
            assert!(
                errors.iter().any(
                    |e| matches!(e, ConfigError::Validation { message } if message.contains("timezone"))
                ),
                "`{tz}` should fail"
            );
        }
    }

    #[test]
    fn valid_offsets_pass() {
        for tz in ["+00:00", "-08:00", "+05:30", "+14:00"] {
            let mut config = PortageConfig::default();
            config.migration.timezone = tz.to_string();
            assert!(validate_config(&config).is_ok(), "`{tz}` should pass");
        }
    }

    #[test]
    fn non_http_token_url_fails_validation() {
        let mut config = PortageConfig::default();
        config.auth.token_url = "ftp://login.example.com/token".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("token_url"))
        ));
    }

    #[test]
    fn bad_log_level_fails_validation() {
        let mut config = PortageConfig::default();
        config.migration.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("log_level"))
        ));
    }
}
