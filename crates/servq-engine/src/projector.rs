// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-side views built from store snapshots.
//!
//! Pure functions: no I/O, no clock. Missing stats rows fall back to the
//! seed average.

use servq_core::schedule::{display_order, tokens_ahead, wait_minutes};
use servq_core::types::{
    AheadPolicy, CustomerSnapshot, CustomerTokenStatus, ProviderQueueView, ProviderSnapshot,
    QueueStats, ServingToken, StatusCounts,
};
use servq_core::TokenStatus;

fn average_or_seed(stats: Option<&QueueStats>, seed_seconds: i64) -> i64 {
    stats
        .and_then(|s| s.average_service_seconds)
        .unwrap_or(seed_seconds)
}

/// Provider-facing queue: display-ordered tokens, per-status counts, the
/// running token and the current average.
pub fn provider_view(snapshot: ProviderSnapshot, seed_seconds: i64) -> ProviderQueueView {
    let ProviderSnapshot { mut tokens, stats } = snapshot;
    tokens.sort_by(display_order);

    let mut counts = StatusCounts::default();
    for token in &tokens {
        match token.status {
            TokenStatus::Pending => counts.pending += 1,
            TokenStatus::Running => counts.running += 1,
            TokenStatus::Completed => counts.completed += 1,
            TokenStatus::Skipped => counts.skipped += 1,
            TokenStatus::Cancelled => counts.cancelled += 1,
        }
        counts.total += 1;
    }

    let current_running = tokens
        .iter()
        .find(|t| t.status == TokenStatus::Running)
        .cloned();

    ProviderQueueView {
        average_service_seconds: average_or_seed(stats.as_ref(), seed_seconds),
        tokens,
        stats: counts,
        current_running,
    }
}

/// Customer-facing status of each active token, in the snapshot's order.
pub fn customer_statuses(
    snapshot: &CustomerSnapshot,
    policy: AheadPolicy,
    seed_seconds: i64,
) -> Vec<CustomerTokenStatus> {
    snapshot
        .tokens
        .iter()
        .map(|token| {
            let lane = snapshot
                .lanes
                .iter()
                .find(|l| l.provider_id == token.provider_id && l.date == token.service_date);
            let (pending, running, stats) = match lane {
                Some(l) => (l.pending.as_slice(), l.running.as_ref(), l.stats.as_ref()),
                None => (&[][..], None, None),
            };

            let ahead = tokens_ahead(token, pending, running, policy);
            let average = average_or_seed(stats, seed_seconds);
            let wait = i64::from(ahead) * average;

            CustomerTokenStatus {
                token: token.clone(),
                tokens_ahead: ahead,
                estimated_wait_seconds: wait,
                estimated_wait_minutes: wait_minutes(wait),
                current_serving: running.map(|r| ServingToken {
                    code: r.code.clone(),
                    position: r.position,
                }),
                is_my_turn: token.status == TokenStatus::Running,
            }
        })
        .collect()
}
