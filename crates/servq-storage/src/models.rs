// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mapping between SQLite and the servq domain types.
//!
//! Timestamps are stored as fixed-width UTC text
//! (`2026-03-01T09:00:00.000Z`) so that string order is time order, and
//! service dates as `YYYY-MM-DD`.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use servq_core::types::{QueueStats, Token};
use servq_core::{CustomerId, ProviderId, ServiceId, TokenId, TokenStatus};

/// Column list matching [`token_from_row`].
pub const TOKEN_COLUMNS: &str = "id, code, provider_id, customer_id, service_id, service_date, \
     slot_time, queue_position, is_priority, status, created_at, started_at, completed_at";

/// Column list matching [`stats_from_row`].
pub const STATS_COLUMNS: &str =
    "provider_id, queue_date, current_running, average_service_seconds, total_served, last_updated";

/// Format an instant for storage.
pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Format a service date for storage.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

/// Parse a stored timestamp; `idx` names the column in the error.
pub fn parse_ts(raw: &str, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| conversion_err(idx, e))
}

fn ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_ts(&raw, idx)
}

fn opt_ts_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_ts(&raw, idx)).transpose()
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| conversion_err(idx, e))
}

/// Map a row selected with [`TOKEN_COLUMNS`].
pub fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    let status: String = row.get(9)?;
    Ok(Token {
        id: TokenId(row.get(0)?),
        code: row.get(1)?,
        provider_id: ProviderId(row.get(2)?),
        customer_id: CustomerId(row.get(3)?),
        service_id: ServiceId(row.get(4)?),
        service_date: date_at(row, 5)?,
        slot_time: row.get(6)?,
        position: row.get(7)?,
        priority: row.get(8)?,
        status: TokenStatus::from_str(&status).map_err(|e| conversion_err(9, e))?,
        created_at: ts_at(row, 10)?,
        started_at: opt_ts_at(row, 11)?,
        completed_at: opt_ts_at(row, 12)?,
    })
}

/// Map a row selected with [`STATS_COLUMNS`].
pub fn stats_from_row(row: &Row<'_>) -> rusqlite::Result<QueueStats> {
    Ok(QueueStats {
        provider_id: ProviderId(row.get(0)?),
        queue_date: date_at(row, 1)?,
        current_running: row.get::<_, Option<i64>>(2)?.map(TokenId),
        average_service_seconds: row.get(3)?,
        total_served: row.get(4)?,
        last_updated: ts_at(row, 5)?,
    })
}
