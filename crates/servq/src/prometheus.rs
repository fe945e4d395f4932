// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus recorder behind the `--metrics` flag.
//!
//! The CLI runs one command per process, so there is no scrape endpoint:
//! the collected metrics are rendered once, after the command finished.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use servq_core::ServqError;

/// Install the Prometheus recorder globally. Only one recorder can be
/// installed per process.
pub(crate) fn install() -> Result<PrometheusHandle, ServqError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServqError::Internal(format!("failed to install Prometheus recorder: {e}")))?;
    tracing::debug!("prometheus metrics recorder installed");
    Ok(handle)
}
