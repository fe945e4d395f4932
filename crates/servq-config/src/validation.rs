// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express. All errors are
//! collected; validation does not stop at the first one.

use crate::diagnostic::ConfigError;
use crate::model::ServqConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest offset in use by any real timezone (UTC+14:00).
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &ServqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        errors.push(ConfigError::invalid(
            "service.log_level",
            format!(
                "`{}` is not one of {}",
                config.service.log_level,
                LOG_LEVELS.join(", ")
            ),
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid(
            "storage.database_path",
            "must not be empty",
        ));
    }

    if config.storage.busy_timeout_ms == 0 {
        errors.push(ConfigError::invalid(
            "storage.busy_timeout_ms",
            "must be at least 1 so lock waits fail as retryable errors instead of immediately",
        ));
    }

    if config.queue.rolling_window == 0 {
        errors.push(ConfigError::invalid(
            "queue.rolling_window",
            "must be at least 1",
        ));
    }

    if config.queue.seed_service_seconds < 1 {
        errors.push(ConfigError::invalid(
            "queue.seed_service_seconds",
            format!("must be positive, got {}", config.queue.seed_service_seconds),
        ));
    }

    if config.queue.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        errors.push(ConfigError::invalid(
            "queue.utc_offset_minutes",
            format!(
                "must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}",
                config.queue.utc_offset_minutes
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fails_on(config: &ServqConfig, field: &str) -> bool {
        validate_config(config)
            .unwrap_err()
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { field: f, .. } if f == field))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&ServqConfig::default()).is_ok());
    }

    #[test]
    fn zero_window_fails() {
        let mut config = ServqConfig::default();
        config.queue.rolling_window = 0;
        assert!(fails_on(&config, "queue.rolling_window"));
    }

    #[test]
    fn non_positive_seed_fails() {
        let mut config = ServqConfig::default();
        config.queue.seed_service_seconds = 0;
        assert!(fails_on(&config, "queue.seed_service_seconds"));
    }

    #[test]
    fn offset_beyond_fourteen_hours_fails() {
        let mut config = ServqConfig::default();
        config.queue.utc_offset_minutes = -15 * 60;
        assert!(fails_on(&config, "queue.utc_offset_minutes"));

        config.queue.utc_offset_minutes = 330;
        assert!(validate_config(&config).is_ok());
        assert!(config.queue.utc_offset().is_some());
    }

    #[test]
    fn unknown_log_level_fails() {
        let mut config = ServqConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(fails_on(&config, "service.log_level"));
    }

    #[test]
    fn collects_every_error() {
        let mut config = ServqConfig::default();
        config.storage.database_path = "  ".to_string();
        config.storage.busy_timeout_ms = 0;
        config.queue.rolling_window = 0;
        assert_eq!(validate_config(&config).unwrap_err().len(), 3);
    }

    #[test]
    fn partial_toml_validates() {
        let toml_str = r#"
[queue]
rolling_window = 10
ahead_policy = "position"
"#;
        let config: ServqConfig = toml::from_str(toml_str).unwrap();
        assert!(validate_config(&config).is_ok());
        assert_eq!(config.queue.rolling_window, 10);
        assert_eq!(config.queue.seed_service_seconds, 900);
    }

    #[test]
    fn unknown_queue_key_is_rejected() {
        let toml_str = r#"
[queue]
rolling_windw = 10
"#;
        assert!(toml::from_str::<ServqConfig>(toml_str).is_err());
    }
}
