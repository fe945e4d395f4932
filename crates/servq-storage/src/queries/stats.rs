// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue-stats row upserts and the rolling service average.
//!
//! All writers take an open write transaction; the stats row for a
//! (provider, date) is created by the first upsert that touches it.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, Transaction, params};
use servq_core::schedule::rolling_average;
use servq_core::types::{AverageWindow, QueueStats};
use servq_core::{ProviderId, TokenId};

use crate::models::{STATS_COLUMNS, format_date, format_ts, parse_ts, stats_from_row};

/// Point the stats row at the token that just started running.
pub fn set_running(
    tx: &Transaction<'_>,
    provider: ProviderId,
    date: NaiveDate,
    token: TokenId,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO queue_stats (provider_id, queue_date, current_running, total_served, last_updated)
         VALUES (?1, ?2, ?3, 0, ?4)
         ON CONFLICT(provider_id, queue_date) DO UPDATE SET
            current_running = excluded.current_running,
            last_updated = excluded.last_updated",
        params![provider.0, format_date(date), token.0, format_ts(now)],
    )?;
    Ok(())
}

/// Clear the running reference after a skip or cancel of the running token.
pub fn clear_running(
    tx: &Transaction<'_>,
    provider: ProviderId,
    date: NaiveDate,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO queue_stats (provider_id, queue_date, current_running, total_served, last_updated)
         VALUES (?1, ?2, NULL, 0, ?3)
         ON CONFLICT(provider_id, queue_date) DO UPDATE SET
            current_running = NULL,
            last_updated = excluded.last_updated",
        params![provider.0, format_date(date), format_ts(now)],
    )?;
    Ok(())
}

/// Record one completion: clear the running reference, store the new
/// average and bump the served counter.
pub fn record_completion(
    tx: &Transaction<'_>,
    provider: ProviderId,
    date: NaiveDate,
    average_seconds: i64,
    now: DateTime<Utc>,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO queue_stats
            (provider_id, queue_date, current_running, average_service_seconds, total_served, last_updated)
         VALUES (?1, ?2, NULL, ?3, 1, ?4)
         ON CONFLICT(provider_id, queue_date) DO UPDATE SET
            current_running = NULL,
            average_service_seconds = excluded.average_service_seconds,
            total_served = total_served + 1,
            last_updated = excluded.last_updated",
        params![provider.0, format_date(date), average_seconds, format_ts(now)],
    )?;
    Ok(())
}

/// Mean duration of the provider's most recent completions, across dates.
pub fn recent_average(
    tx: &Transaction<'_>,
    provider: ProviderId,
    window: AverageWindow,
) -> rusqlite::Result<i64> {
    let mut stmt = tx.prepare(
        "SELECT started_at, completed_at FROM tokens
         WHERE provider_id = ?1 AND status = 'completed'
           AND started_at IS NOT NULL AND completed_at IS NOT NULL
         ORDER BY completed_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![provider.0, window.size], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut durations = Vec::new();
    for row in rows {
        let (started, completed) = row?;
        let started = parse_ts(&started, 0)?;
        let completed = parse_ts(&completed, 1)?;
        durations.push((completed - started).num_milliseconds());
    }
    Ok(rolling_average(&durations, window.seed_seconds))
}

/// The stats row for `(provider, date)`, if one was ever written.
pub fn load(
    tx: &Transaction<'_>,
    provider: ProviderId,
    date: NaiveDate,
) -> rusqlite::Result<Option<QueueStats>> {
    let sql = format!(
        "SELECT {STATS_COLUMNS} FROM queue_stats WHERE provider_id = ?1 AND queue_date = ?2"
    );
    tx.query_row(&sql, params![provider.0, format_date(date)], stats_from_row)
        .optional()
}
