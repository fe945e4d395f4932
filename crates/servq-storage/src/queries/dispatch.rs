// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dequeue: activate the next pending token of a provider's lane.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, params};
use servq_core::types::Token;
use servq_core::{ProviderId, ServqError, TokenId, TokenStatus};

use crate::database::Database;
use crate::models::{TOKEN_COLUMNS, format_date, format_ts, token_from_row};
use crate::queries::stats;

/// Activate the next pending token of `provider` for `today`.
///
/// The running check, the selection (priority first, then position) and the
/// activation run under one write lock. Returns `Ok(None)` on an empty lane.
pub async fn call_next(
    db: &Database,
    provider: ProviderId,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> Result<Option<Token>, ServqError> {
    db.write(move |tx| {
        let date = format_date(today);

        let running: Option<i64> = tx
            .query_row(
                "SELECT id FROM tokens
                 WHERE provider_id = ?1 AND service_date = ?2 AND status = 'running'
                 LIMIT 1",
                params![provider.0, date],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(id) = running {
            return Err(ServqError::ActiveTokenExists {
                token_id: TokenId(id),
            }
            .into());
        }

        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens
             WHERE provider_id = ?1 AND service_date = ?2 AND status = 'pending'
             ORDER BY is_priority DESC, queue_position ASC
             LIMIT 1"
        );
        let Some(mut token) = tx
            .query_row(&sql, params![provider.0, date], token_from_row)
            .optional()?
        else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE tokens SET status = 'running', started_at = ?1
             WHERE id = ?2 AND status = 'pending'",
            params![format_ts(now), token.id.0],
        )?;
        stats::set_running(tx, provider, today, token.id, now)?;

        token.status = TokenStatus::Running;
        token.started_at = Some(now);
        Ok(Some(token))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::tokens::{create_booking, get_token};
    use chrono::TimeZone;
    use servq_core::types::NewBooking;
    use servq_core::{CustomerId, ServiceId};
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, min, 0).unwrap()
    }

    async fn book(db: &Database, customer: i64) -> TokenId {
        let booking = NewBooking {
            customer_id: CustomerId(customer),
            provider_id: ProviderId(1),
            service_id: ServiceId(1),
            service_date: day(),
            slot_time: None,
        };
        create_booking(db, &booking, at(8, 0)).await.unwrap().token_id
    }

    #[tokio::test]
    async fn empty_lane_returns_none() {
        let (db, _dir) = setup_db().await;
        let next = call_next(&db, ProviderId(1), day(), at(9, 0)).await.unwrap();
        assert!(next.is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn activates_lowest_position_and_stamps_start() {
        let (db, _dir) = setup_db().await;
        let first = book(&db, 10).await;
        book(&db, 11).await;

        let token = call_next(&db, ProviderId(1), day(), at(9, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.id, first);
        assert_eq!(token.status, TokenStatus::Running);
        assert_eq!(token.started_at, Some(at(9, 0)));

        let stored = get_token(&db, first).await.unwrap().unwrap();
        assert_eq!(stored.status, TokenStatus::Running);
        assert_eq!(stored.started_at, Some(at(9, 0)));

        let stats = db
            .read(move |tx| Ok(stats::load(tx, ProviderId(1), day())?))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.current_running, Some(first));
        assert_eq!(stats.total_served, 0);
        assert_eq!(stats.average_service_seconds, None);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn second_call_reports_the_running_token() {
        let (db, _dir) = setup_db().await;
        let first = book(&db, 10).await;
        book(&db, 11).await;

        call_next(&db, ProviderId(1), day(), at(9, 0)).await.unwrap();
        let err = call_next(&db, ProviderId(1), day(), at(9, 1))
            .await
            .unwrap_err();
        match err {
            ServqError::ActiveTokenExists { token_id } => assert_eq!(token_id, first),
            other => panic!("expected ActiveTokenExists, got {other:?}"),
        }
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn priority_token_jumps_the_line() {
        let (db, _dir) = setup_db().await;
        book(&db, 10).await;
        book(&db, 11).await;
        let third = book(&db, 12).await;
        db.write(move |tx| {
            tx.execute(
                "UPDATE tokens SET is_priority = 1 WHERE id = ?1",
                params![third.0],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let token = call_next(&db, ProviderId(1), day(), at(9, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(token.id, third);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn other_days_are_not_dispatched() {
        let (db, _dir) = setup_db().await;
        book(&db, 10).await;
        let tomorrow = day().succ_opt().unwrap();
        let next = call_next(&db, ProviderId(1), tomorrow, at(9, 0)).await.unwrap();
        assert!(next.is_none());
        db.close().await.unwrap();
    }
}
