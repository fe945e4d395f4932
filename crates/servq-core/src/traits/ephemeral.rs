// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived keyed state with expiry (verification codes, pending sign-ups).
//!
//! Kept in the shared store rather than in process memory so that every
//! service instance sees the same entries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ServqError;
use crate::traits::adapter::Adapter;

/// Expiring key-value store.
#[async_trait]
pub trait EphemeralStore: Adapter {
    /// Insert or replace `key` in `namespace`, valid until `expires_at`.
    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ServqError>;

    /// Read a live entry without consuming it.
    async fn get(
        &self,
        namespace: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, ServqError>;

    /// Read and delete a live entry in one step. A second `take` sees nothing.
    async fn take(
        &self,
        namespace: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, ServqError>;

    /// Drop every entry that expired at or before `now`. Returns how many went.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ServqError>;
}
