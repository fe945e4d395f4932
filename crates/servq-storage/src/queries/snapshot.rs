// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only snapshots for the queue projections.
//!
//! Each snapshot is taken inside one deferred transaction, so the tokens and
//! the stats row it returns are mutually consistent. No write lock is held.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::{OptionalExtension, Transaction, params};
use servq_core::types::{CustomerSnapshot, LaneSnapshot, ProviderSnapshot, Token};
use servq_core::{CustomerId, ProviderId, ServqError};

use crate::database::{Database, TxAbort};
use crate::models::{TOKEN_COLUMNS, format_date, token_from_row};
use crate::queries::stats;

/// Tokens of `provider` dated `from` or later in display order, plus the
/// stats row for `from`.
pub async fn provider_snapshot(
    db: &Database,
    provider: ProviderId,
    from: NaiveDate,
) -> Result<ProviderSnapshot, ServqError> {
    db.read(move |tx| {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE provider_id = ?1 AND service_date >= ?2
             ORDER BY
                CASE status
                    WHEN 'running' THEN 0
                    WHEN 'pending' THEN 1
                    WHEN 'completed' THEN 2
                    WHEN 'skipped' THEN 3
                    WHEN 'cancelled' THEN 4
                END,
                is_priority DESC,
                queue_position ASC"
        );
        let mut stmt = tx.prepare(&sql)?;
        let tokens = stmt
            .query_map(params![provider.0, format_date(from)], token_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        let stats = stats::load(tx, provider, from)?;
        Ok(ProviderSnapshot { tokens, stats })
    })
    .await
}

fn lane(
    tx: &Transaction<'_>,
    provider: ProviderId,
    date: NaiveDate,
) -> Result<LaneSnapshot, TxAbort> {
    let day = format_date(date);
    let sql = format!(
        "SELECT {TOKEN_COLUMNS} FROM tokens
         WHERE provider_id = ?1 AND service_date = ?2 AND status = 'pending'
         ORDER BY is_priority DESC, queue_position ASC"
    );
    let mut stmt = tx.prepare(&sql)?;
    let pending = stmt
        .query_map(params![provider.0, day], token_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let sql = format!(
        "SELECT {TOKEN_COLUMNS} FROM tokens
         WHERE provider_id = ?1 AND service_date = ?2 AND status = 'running'
         LIMIT 1"
    );
    let running = tx
        .query_row(&sql, params![provider.0, day], token_from_row)
        .optional()?;

    Ok(LaneSnapshot {
        provider_id: provider,
        date,
        pending,
        running,
        stats: stats::load(tx, provider, date)?,
    })
}

/// Active tokens of `customer` on `today` and one lane per provider involved.
pub async fn customer_snapshot(
    db: &Database,
    customer: CustomerId,
    today: NaiveDate,
) -> Result<CustomerSnapshot, ServqError> {
    db.read(move |tx| {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE customer_id = ?1 AND service_date = ?2
               AND status IN ('pending', 'running')
             ORDER BY queue_position ASC"
        );
        let mut stmt = tx.prepare(&sql)?;
        let tokens: Vec<Token> = stmt
            .query_map(params![customer.0, format_date(today)], token_from_row)?
            .collect::<Result<_, _>>()?;

        let providers: BTreeSet<ProviderId> = tokens.iter().map(|t| t.provider_id).collect();
        let lanes = providers
            .into_iter()
            .map(|provider| lane(tx, provider, today))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CustomerSnapshot { tokens, lanes })
    })
    .await
}

/// Completions recorded for `provider` across all days.
pub async fn total_served(db: &Database, provider: ProviderId) -> Result<i64, ServqError> {
    db.read(move |tx| {
        Ok(tx.query_row(
            "SELECT COALESCE(SUM(total_served), 0) FROM queue_stats WHERE provider_id = ?1",
            params![provider.0],
            |row| row.get(0),
        )?)
    })
    .await
}
