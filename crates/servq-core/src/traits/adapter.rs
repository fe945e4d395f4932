// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base trait shared by the durable collaborators.

use async_trait::async_trait;

use crate::error::ServqError;
use crate::types::HealthStatus;

/// Identity, health and shutdown for a backing store.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, ServqError>;

    /// Gracefully shuts down the adapter, flushing pending writes.
    async fn shutdown(&self) -> Result<(), ServqError>;
}
