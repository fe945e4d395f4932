// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./servq.toml` > `~/.config/servq/servq.toml` > `/etc/servq/servq.toml`
//! with environment variable overrides via `SERVQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ServqConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/servq/servq.toml` (system-wide)
/// 3. `~/.config/servq/servq.toml` (user XDG config)
/// 4. `./servq.toml` (local directory)
/// 5. `SERVQ_*` environment variables
pub fn load_config() -> Result<ServqConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ServqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ServqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ServqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ServqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ServqConfig::default()))
        .merge(Toml::file("/etc/servq/servq.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("servq/servq.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("servq.toml"))
        .merge(env_provider())
}

/// Config sections that `SERVQ_<SECTION>_<KEY>` variables can address.
const ENV_SECTIONS: [&str; 4] = ["service", "storage", "queue", "notify"];

/// Map a prefix-stripped env var name to its dotted config key.
///
/// Figment hands over the name in its original case, so it is lowercased
/// first. Only a leading section name is split off: `QUEUE_ROLLING_WINDOW`
/// becomes `queue.rolling_window`, not `queue.rolling.window`.
fn env_key(raw: &str) -> String {
    let key = raw.to_ascii_lowercase();
    ENV_SECTIONS
        .iter()
        .find_map(|section| {
            key.strip_prefix(*section)
                .and_then(|rest| rest.strip_prefix('_'))
                .map(|field| format!("{section}.{field}"))
        })
        .unwrap_or(key)
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
fn env_provider() -> Env {
    Env::prefixed("SERVQ_").map(|key| env_key(key.as_str()).into())
}
