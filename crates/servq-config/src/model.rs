// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for servq.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use servq_core::types::{AheadPolicy, AverageWindow};

/// Top-level servq configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServqConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Scheduling and estimation settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Notification hook settings.
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Service identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Display name used in log lines.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "servq".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// How long a transaction waits for the write lock before failing as
    /// a retryable error.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("servq").join("servq.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("servq.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Scheduling and wait-estimation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Number of most recent completions in the rolling service average.
    #[serde(default = "default_rolling_window")]
    pub rolling_window: u32,

    /// Average service time assumed before any token has completed.
    #[serde(default = "default_seed_service_seconds")]
    pub seed_service_seconds: i64,

    /// Offset from UTC that decides which calendar day is "today".
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Which waiting tokens count as ahead of a customer.
    #[serde(default)]
    pub ahead_policy: AheadPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            rolling_window: default_rolling_window(),
            seed_service_seconds: default_seed_service_seconds(),
            utc_offset_minutes: 0,
            ahead_policy: AheadPolicy::default(),
        }
    }
}

impl QueueConfig {
    /// Rolling-average parameters for the store.
    pub fn average_window(&self) -> AverageWindow {
        AverageWindow {
            size: self.rolling_window,
            seed_seconds: self.seed_service_seconds,
        }
    }

    /// The configured offset, or `None` when it is out of range.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
    }
}

fn default_rolling_window() -> u32 {
    20
}

fn default_seed_service_seconds() -> i64 {
    900
}

/// Notification hook configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// Dispatch committed transitions to the configured notifier.
    #[serde(default = "default_notify_enabled")]
    pub enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_notify_enabled(),
        }
    }
}

fn default_notify_enabled() -> bool {
    true
}
