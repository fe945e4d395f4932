// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure scheduling rules: queue orderings, the rolling service average and
//! the "tokens ahead" estimate.
//!
//! The store encodes the same orderings in SQL; these functions are the
//! reference the projector and the tests rely on.

use std::cmp::Ordering;

use crate::types::{AheadPolicy, Token, TokenStatus};

/// Dequeue order among pending tokens: priority first, then ascending position.
pub fn dequeue_order(a: &Token, b: &Token) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.position.cmp(&b.position))
}

/// Provider display order: status rank, then the dequeue order.
pub fn display_order(a: &Token, b: &Token) -> Ordering {
    a.status
        .display_rank()
        .cmp(&b.status.display_rank())
        .then_with(|| dequeue_order(a, b))
}

/// Mean of the given service durations in milliseconds, rounded once to the
/// nearest second.
///
/// Negative durations are clamped to zero. Falls back to `seed_seconds`
/// when there is no history.
pub fn rolling_average(durations_ms: &[i64], seed_seconds: i64) -> i64 {
    if durations_ms.is_empty() {
        return seed_seconds;
    }
    let sum: i64 = durations_ms.iter().map(|d| (*d).max(0)).sum();
    (sum as f64 / durations_ms.len() as f64 / 1000.0).round() as i64
}

/// A millisecond duration rounded to the nearest whole second, never negative.
pub fn whole_seconds(millis: i64) -> i64 {
    (millis.max(0) + 500) / 1000
}

/// Number of tokens served before `token`.
///
/// A running token has nothing ahead of it. A waiting token counts the other
/// pending tokens that precede it under `policy`, plus the running token of
/// its lane if there is one.
pub fn tokens_ahead(
    token: &Token,
    pending: &[Token],
    running: Option<&Token>,
    policy: AheadPolicy,
) -> u32 {
    if token.status == TokenStatus::Running {
        return 0;
    }
    let waiting = pending
        .iter()
        .filter(|other| other.id != token.id && other.status == TokenStatus::Pending)
        .filter(|other| match policy {
            AheadPolicy::Position => other.position < token.position,
            AheadPolicy::DequeueOrder => dequeue_order(other, token) == Ordering::Less,
        })
        .count() as u32;
    let serving = running.is_some_and(|r| r.id != token.id);
    waiting + u32::from(serving)
}

/// Whole minutes needed to cover `seconds`, rounded up.
pub fn wait_minutes(seconds: i64) -> i64 {
    (seconds.max(0) + 59) / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CustomerId, ProviderId, ServiceId, TokenId};
    use chrono::{NaiveDate, TimeZone, Utc};
    use proptest::prelude::*;

    fn token(id: i64, position: i64, priority: bool, status: TokenStatus) -> Token {
        Token {
            id: TokenId(id),
            code: format!("TKN-{id}"),
            provider_id: ProviderId(1),
            customer_id: CustomerId(100 + id),
            service_id: ServiceId(1),
            service_date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            slot_time: None,
            position,
            priority,
            status,
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn priority_beats_position() {
        let mut queue = vec![
            token(1, 1, false, TokenStatus::Pending),
            token(2, 2, false, TokenStatus::Pending),
            token(3, 3, true, TokenStatus::Pending),
        ];
        queue.sort_by(dequeue_order);
        let ids: Vec<i64> = queue.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn display_order_puts_running_first_and_cancelled_last() {
        let mut queue = vec![
            token(1, 1, false, TokenStatus::Cancelled),
            token(2, 2, false, TokenStatus::Completed),
            token(3, 3, false, TokenStatus::Pending),
            token(4, 4, false, TokenStatus::Running),
            token(5, 5, false, TokenStatus::Skipped),
            token(6, 6, true, TokenStatus::Pending),
        ];
        queue.sort_by(display_order);
        let ids: Vec<i64> = queue.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![4, 6, 3, 2, 5, 1]);
    }

    #[test]
    fn rolling_average_of_three() {
        assert_eq!(rolling_average(&[100_000, 200_000, 300_000], 900), 200);
    }

    #[test]
    fn rolling_average_seeds_without_history() {
        assert_eq!(rolling_average(&[], 900), 900);
    }

    #[test]
    fn rolling_average_rounds_to_nearest_second() {
        assert_eq!(rolling_average(&[10_000, 11_000], 900), 11);
        assert_eq!(rolling_average(&[10_000, 10_000, 11_000], 900), 10);
    }

    #[test]
    fn rolling_average_keeps_sub_second_precision() {
        assert_eq!(rolling_average(&[100_900, 100_900], 900), 101);
        assert_eq!(rolling_average(&[400, 400], 900), 0);
        assert_eq!(rolling_average(&[600, 600], 900), 1);
    }

    #[test]
    fn whole_seconds_rounds_half_up() {
        assert_eq!(whole_seconds(100_900), 101);
        assert_eq!(whole_seconds(100_499), 100);
        assert_eq!(whole_seconds(500), 1);
        assert_eq!(whole_seconds(-2_000), 0);
    }

    #[test]
    fn running_token_has_nothing_ahead() {
        let me = token(1, 4, false, TokenStatus::Running);
        let pending = vec![token(2, 1, false, TokenStatus::Pending)];
        assert_eq!(tokens_ahead(&me, &pending, Some(&me), AheadPolicy::DequeueOrder), 0);
    }

    #[test]
    fn running_token_of_another_customer_counts_once() {
        let me = token(3, 3, false, TokenStatus::Pending);
        let running = token(1, 1, false, TokenStatus::Running);
        let pending = vec![token(2, 2, false, TokenStatus::Pending), me.clone()];
        assert_eq!(
            tokens_ahead(&me, &pending, Some(&running), AheadPolicy::Position),
            2
        );
    }

    #[test]
    fn position_policy_ignores_priority_jumpers() {
        let me = token(2, 2, false, TokenStatus::Pending);
        let pending = vec![
            token(1, 1, false, TokenStatus::Pending),
            me.clone(),
            token(3, 5, true, TokenStatus::Pending),
        ];
        assert_eq!(tokens_ahead(&me, &pending, None, AheadPolicy::Position), 1);
        assert_eq!(tokens_ahead(&me, &pending, None, AheadPolicy::DequeueOrder), 2);
    }

    #[test]
    fn priority_token_only_waits_for_earlier_priority_tokens() {
        let me = token(4, 4, true, TokenStatus::Pending);
        let pending = vec![
            token(1, 1, false, TokenStatus::Pending),
            token(2, 2, true, TokenStatus::Pending),
            me.clone(),
        ];
        assert_eq!(tokens_ahead(&me, &pending, None, AheadPolicy::DequeueOrder), 1);
    }

    #[test]
    fn wait_minutes_rounds_up() {
        assert_eq!(wait_minutes(0), 0);
        assert_eq!(wait_minutes(1), 1);
        assert_eq!(wait_minutes(60), 1);
        assert_eq!(wait_minutes(61), 2);
        assert_eq!(wait_minutes(2700), 45);
    }

    proptest! {
        #[test]
        fn dequeue_order_never_serves_plain_before_priority(
            flags in proptest::collection::vec(any::<bool>(), 1..40)
        ) {
            let mut queue: Vec<Token> = flags
                .iter()
                .enumerate()
                .map(|(i, p)| token(i as i64 + 1, i as i64 + 1, *p, TokenStatus::Pending))
                .collect();
            queue.sort_by(dequeue_order);
            let first_plain = queue.iter().position(|t| !t.priority).unwrap_or(queue.len());
            prop_assert!(queue[first_plain..].iter().all(|t| !t.priority));
            for class in [&queue[..first_plain], &queue[first_plain..]] {
                prop_assert!(class.windows(2).all(|w| w[0].position < w[1].position));
            }
        }

        #[test]
        fn constant_durations_average_to_themselves(d in 0i64..100_000, n in 1usize..25) {
            prop_assert_eq!(rolling_average(&vec![d * 1000; n], 900), d);
        }

        #[test]
        fn ahead_count_is_bounded_by_queue_length(
            flags in proptest::collection::vec(any::<bool>(), 1..30),
            pick in 0usize..30,
        ) {
            let queue: Vec<Token> = flags
                .iter()
                .enumerate()
                .map(|(i, p)| token(i as i64 + 1, i as i64 + 1, *p, TokenStatus::Pending))
                .collect();
            let me = &queue[pick % queue.len()];
            for policy in [AheadPolicy::Position, AheadPolicy::DequeueOrder] {
                prop_assert!((tokens_ahead(me, &queue, None, policy) as usize) < queue.len());
            }
        }
    }
}
