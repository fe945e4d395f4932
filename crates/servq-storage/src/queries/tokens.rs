// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Booking creation, position assignment and token lookups.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension, Transaction, params};
use servq_core::types::{BookingReceipt, NewBooking, Token};
use servq_core::{CustomerId, ProviderId, ServqError, TokenId};

use crate::database::{Database, TxAbort};
use crate::models::{TOKEN_COLUMNS, format_date, format_ts, token_from_row};

/// Next queue position for `(provider, date)`: one past the largest position
/// ever handed out for the pair, whatever its status, or 1.
///
/// Must run inside a write transaction that also inserts the token, so that
/// the read and the insert are covered by the same lock.
pub fn assign_position(
    tx: &Transaction<'_>,
    provider: ProviderId,
    date: NaiveDate,
) -> rusqlite::Result<i64> {
    tx.query_row(
        "SELECT COALESCE(MAX(queue_position), 0) + 1 FROM tokens
         WHERE provider_id = ?1 AND service_date = ?2",
        params![provider.0, format_date(date)],
        |row| row.get(0),
    )
}

/// Display code: `TKN-` + base36 creation millis + 4 random hex digits.
pub fn token_code(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("TKN-{}-{}", base36(millis), suffix[..4].to_uppercase())
}

/// Short random suffixes tried before falling back to a full UUID.
const CODE_ATTEMPTS: usize = 8;

/// A display code no other token holds.
///
/// Runs under the booking's write lock, so a code found free here cannot be
/// taken before the insert.
fn unique_code(tx: &Transaction<'_>, now: DateTime<Utc>) -> rusqlite::Result<String> {
    for _ in 0..CODE_ATTEMPTS {
        let code = token_code(now);
        let taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM tokens WHERE code = ?1)",
            params![code],
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(code);
        }
    }
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let suffix = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    Ok(format!("TKN-{}-{suffix}", base36(millis)))
}

fn base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Insert a pending token with a fresh position.
///
/// A live token (not cancelled or skipped) already holding the requested slot
/// rejects the booking before any position is taken.
pub async fn create_booking(
    db: &Database,
    booking: &NewBooking,
    now: DateTime<Utc>,
) -> Result<BookingReceipt, ServqError> {
    let booking = booking.clone();
    db.write(move |tx| {
        let date = format_date(booking.service_date);
        if let Some(slot) = &booking.slot_time {
            let taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM tokens
                 WHERE provider_id = ?1 AND service_date = ?2 AND slot_time = ?3
                 AND status NOT IN ('cancelled', 'skipped'))",
                params![booking.provider_id.0, date, slot],
                |row| row.get(0),
            )?;
            if taken {
                return Err(ServqError::SlotUnavailable {
                    provider_id: booking.provider_id,
                    date: booking.service_date,
                    slot: slot.clone(),
                }
                .into());
            }
        }

        let position = assign_position(tx, booking.provider_id, booking.service_date)?;
        let code = unique_code(tx, now)?;
        tx.execute(
            "INSERT INTO tokens (code, provider_id, customer_id, service_id, service_date,
                                 slot_time, queue_position, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', ?8)",
            params![
                code,
                booking.provider_id.0,
                booking.customer_id.0,
                booking.service_id.0,
                date,
                booking.slot_time,
                position,
                format_ts(now),
            ],
        )?;
        Ok(BookingReceipt {
            token_id: TokenId(tx.last_insert_rowid()),
            code,
            position,
            service_date: booking.service_date,
        })
    })
    .await
}

/// Load one token inside an open transaction.
pub(crate) fn load(tx: &Transaction<'_>, id: TokenId) -> Result<Option<Token>, TxAbort> {
    let sql = format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1");
    Ok(tx.query_row(&sql, params![id.0], token_from_row).optional()?)
}

/// Look up a single token.
pub async fn get_token(db: &Database, id: TokenId) -> Result<Option<Token>, ServqError> {
    db.read(move |tx| load(tx, id)).await
}

/// Every token of `customer`, newest service date first.
pub async fn customer_tokens(
    db: &Database,
    customer: CustomerId,
) -> Result<Vec<Token>, ServqError> {
    db.read(move |tx| {
        let sql = format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE customer_id = ?1
             ORDER BY service_date DESC, created_at DESC, id DESC"
        );
        let mut stmt = tx.prepare(&sql)?;
        let rows = stmt.query_map(params![customer.0], token_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    })
    .await
}
