// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal transitions (complete, skip, cancel) and the priority toggle.
//!
//! Each operation re-reads the token under the write lock and checks its
//! source state there, so a concurrent transition that won the lock first
//! turns this one into an `InvalidTransition`.

use chrono::{DateTime, Utc};
use rusqlite::{Transaction, params};
use servq_core::types::{
    AverageWindow, CompletedToken, PriorityChange, Removal, RemovedToken, Token,
};
use servq_core::schedule::whole_seconds;
use servq_core::{CustomerId, ProviderId, ServqError, TokenId, TokenStatus};

use crate::database::{Database, TxAbort};
use crate::models::format_ts;
use crate::queries::{stats, tokens};

fn owned_by_provider(
    tx: &Transaction<'_>,
    provider: ProviderId,
    id: TokenId,
) -> Result<Token, TxAbort> {
    match tokens::load(tx, id)? {
        Some(token) if token.provider_id == provider => Ok(token),
        _ => Err(ServqError::invalid_transition(
            id,
            format!("no such token for provider {provider}"),
        )
        .into()),
    }
}

fn owned_by_customer(
    tx: &Transaction<'_>,
    customer: CustomerId,
    id: TokenId,
) -> Result<Token, TxAbort> {
    match tokens::load(tx, id)? {
        Some(token) if token.customer_id == customer => Ok(token),
        _ => Err(ServqError::invalid_transition(
            id,
            format!("no such token for customer {customer}"),
        )
        .into()),
    }
}

/// Complete the running token and fold its duration into the rolling average.
pub async fn complete(
    db: &Database,
    provider: ProviderId,
    id: TokenId,
    now: DateTime<Utc>,
    window: AverageWindow,
) -> Result<CompletedToken, ServqError> {
    db.write(move |tx| {
        let token = owned_by_provider(tx, provider, id)?;
        if token.status != TokenStatus::Running {
            return Err(ServqError::invalid_transition(
                id,
                format!("token is {}, not running", token.status),
            )
            .into());
        }
        let started = token.started_at.unwrap_or(now);

        tx.execute(
            "UPDATE tokens SET status = 'completed', completed_at = ?1 WHERE id = ?2",
            params![format_ts(now), id.0],
        )?;
        let average = stats::recent_average(tx, provider, window)?;
        stats::record_completion(tx, provider, token.service_date, average, now)?;

        Ok(CompletedToken {
            token_id: id,
            customer_id: token.customer_id,
            service_seconds: whole_seconds((now - started).num_milliseconds()),
            average_service_seconds: average,
        })
    })
    .await
}

fn finish_removal(
    tx: &Transaction<'_>,
    token: Token,
    removal: Removal,
    now: DateTime<Utc>,
) -> Result<RemovedToken, TxAbort> {
    if token.status.is_terminal() {
        return Err(ServqError::invalid_transition(
            token.id,
            format!("token is already {}", token.status),
        )
        .into());
    }
    let status = removal.status();
    tx.execute(
        "UPDATE tokens SET status = ?1 WHERE id = ?2",
        params![status.as_ref(), token.id.0],
    )?;
    let was_running = token.status == TokenStatus::Running;
    if was_running {
        stats::clear_running(tx, token.provider_id, token.service_date, now)?;
    }
    Ok(RemovedToken {
        token_id: token.id,
        customer_id: token.customer_id,
        status,
        was_running,
    })
}

/// Skip or cancel a pending or running token of `provider`.
pub async fn remove(
    db: &Database,
    provider: ProviderId,
    id: TokenId,
    removal: Removal,
    now: DateTime<Utc>,
) -> Result<RemovedToken, ServqError> {
    db.write(move |tx| {
        let token = owned_by_provider(tx, provider, id)?;
        finish_removal(tx, token, removal, now)
    })
    .await
}

/// Cancel a pending or running token on behalf of the customer who owns it.
pub async fn cancel_by_customer(
    db: &Database,
    customer: CustomerId,
    id: TokenId,
    now: DateTime<Utc>,
) -> Result<RemovedToken, ServqError> {
    db.write(move |tx| {
        let token = owned_by_customer(tx, customer, id)?;
        finish_removal(tx, token, Removal::Cancel, now)
    })
    .await
}

/// Flip the priority flag of a pending token.
pub async fn toggle_priority(
    db: &Database,
    provider: ProviderId,
    id: TokenId,
) -> Result<PriorityChange, ServqError> {
    db.write(move |tx| {
        let token = owned_by_provider(tx, provider, id)?;
        if token.status != TokenStatus::Pending {
            return Err(ServqError::invalid_transition(
                id,
                format!("priority only applies to pending tokens; token is {}", token.status),
            )
            .into());
        }
        let priority = !token.priority;
        tx.execute(
            "UPDATE tokens SET is_priority = ?1 WHERE id = ?2",
            params![priority, id.0],
        )?;
        Ok(PriorityChange {
            token_id: id,
            priority,
        })
    })
    .await
}
