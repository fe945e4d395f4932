// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value entries shared across service instances.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use servq_core::ServqError;

use crate::database::Database;
use crate::models::format_ts;

/// Insert or replace an entry.
pub async fn put(
    db: &Database,
    namespace: &str,
    key: &str,
    value: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), ServqError> {
    let (namespace, key, value) = (namespace.to_string(), key.to_string(), value.to_string());
    db.write(move |tx| {
        tx.execute(
            "INSERT INTO ephemeral (namespace, key, value, expires_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at",
            params![namespace, key, value, format_ts(expires_at)],
        )?;
        Ok(())
    })
    .await
}

/// Read a live entry.
pub async fn get(
    db: &Database,
    namespace: &str,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, ServqError> {
    let (namespace, key) = (namespace.to_string(), key.to_string());
    db.read(move |tx| {
        Ok(tx
            .query_row(
                "SELECT value FROM ephemeral
                 WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3",
                params![namespace, key, format_ts(now)],
                |row| row.get(0),
            )
            .optional()?)
    })
    .await
}

/// Read and delete a live entry under the write lock.
pub async fn take(
    db: &Database,
    namespace: &str,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<String>, ServqError> {
    let (namespace, key) = (namespace.to_string(), key.to_string());
    db.write(move |tx| {
        let value: Option<String> = tx
            .query_row(
                "SELECT value FROM ephemeral
                 WHERE namespace = ?1 AND key = ?2 AND expires_at > ?3",
                params![namespace, key, format_ts(now)],
                |row| row.get(0),
            )
            .optional()?;
        tx.execute(
            "DELETE FROM ephemeral WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
        )?;
        Ok(value)
    })
    .await
}

/// Delete every entry that expired at or before `now`.
pub async fn purge_expired(db: &Database, now: DateTime<Utc>) -> Result<u64, ServqError> {
    db.write(move |tx| {
        let removed = tx.execute(
            "DELETE FROM ephemeral WHERE expires_at <= ?1",
            params![format_ts(now)],
        )?;
        Ok(removed as u64)
    })
    .await
}
