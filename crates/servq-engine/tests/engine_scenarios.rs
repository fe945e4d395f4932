// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios through the engine over a real SQLite store.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use servq_config::model::QueueConfig;
use servq_core::types::{AheadPolicy, NewBooking};
use servq_core::{
    CustomerId, ProviderId, ServiceId, ServqError, TokenEventKind, TokenId, TokenStatus,
};
use servq_test_utils::TestHarness;

const P: ProviderId = ProviderId(1);
const WAIT: StdDuration = StdDuration::from_secs(5);

async fn harness() -> TestHarness {
    TestHarness::builder().build().await.unwrap()
}

async fn book(h: &TestHarness, customer: i64) -> TokenId {
    h.book(P.0, customer).await.unwrap().token_id
}

#[tokio::test]
async fn one_running_token_at_a_time() {
    let h = harness().await;
    let first = book(&h, 10).await;
    let second = book(&h, 11).await;
    book(&h, 12).await;

    let running = h.engine.call_next(P).await.unwrap().unwrap();
    assert_eq!(running.id, first);
    assert_eq!(running.status, TokenStatus::Running);

    let err = h.engine.call_next(P).await.unwrap_err();
    assert!(matches!(err, ServqError::ActiveTokenExists { token_id } if token_id == first));

    h.clock.advance(Duration::minutes(4));
    h.engine.complete(P, first).await.unwrap();
    let next = h.engine.call_next(P).await.unwrap().unwrap();
    assert_eq!(next.id, second);
}

#[tokio::test]
async fn priority_token_jumps_the_queue() {
    let h = harness().await;
    book(&h, 10).await;
    book(&h, 11).await;
    let third = book(&h, 12).await;

    let change = h.engine.toggle_priority(P, third).await.unwrap();
    assert!(change.priority);

    let running = h.engine.call_next(P).await.unwrap().unwrap();
    assert_eq!(running.id, third);
    assert_eq!(running.position, 3);
}

#[tokio::test]
async fn priority_tokens_are_served_in_position_order() {
    let h = harness().await;
    let plain = book(&h, 10).await;
    let second = book(&h, 11).await;
    let third = book(&h, 12).await;
    h.engine.toggle_priority(P, third).await.unwrap();
    h.engine.toggle_priority(P, second).await.unwrap();

    let mut served = Vec::new();
    for _ in 0..3 {
        let token = h.engine.call_next(P).await.unwrap().unwrap();
        h.clock.advance(Duration::minutes(1));
        h.engine.complete(P, token.id).await.unwrap();
        served.push(token.id);
    }
    assert_eq!(served, vec![second, third, plain]);
    assert!(h.engine.call_next(P).await.unwrap().is_none());
}

#[tokio::test]
async fn completing_a_pending_token_changes_nothing() {
    let h = harness().await;
    let id = book(&h, 10).await;

    let err = h.engine.complete(P, id).await.unwrap_err();
    assert!(matches!(err, ServqError::InvalidTransition { token_id, .. } if token_id == id));

    let token = h.engine.token(id).await.unwrap().unwrap();
    assert_eq!(token.status, TokenStatus::Pending);
    assert!(token.started_at.is_none());
    assert_eq!(h.engine.total_served(P).await.unwrap(), 0);
}

#[tokio::test]
async fn rolling_average_follows_completions() {
    let h = harness().await;
    for customer in 0..3 {
        book(&h, 10 + customer).await;
    }
    let before = h.engine.provider_queue(P).await.unwrap();
    assert_eq!(before.average_service_seconds, h.queue.seed_service_seconds);

    for secs in [100, 200, 300] {
        let token = h.engine.call_next(P).await.unwrap().unwrap();
        h.clock.advance(Duration::seconds(secs));
        let done = h.engine.complete(P, token.id).await.unwrap();
        assert_eq!(done.service_seconds, secs);
    }

    let view = h.engine.provider_queue(P).await.unwrap();
    assert_eq!(view.average_service_seconds, 200);
    assert_eq!(view.stats.completed, 3);
    assert!(view.current_running.is_none());
    assert_eq!(h.engine.total_served(P).await.unwrap(), 3);
}

#[tokio::test]
async fn customer_status_reports_turn_and_wait() {
    let h = harness().await;
    let first = book(&h, 10).await;
    let second = book(&h, 11).await;
    h.engine.call_next(P).await.unwrap();

    let mine = h.engine.customer_queue_status(CustomerId(10)).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].token.id, first);
    assert_eq!(mine[0].tokens_ahead, 0);
    assert_eq!(mine[0].estimated_wait_seconds, 0);
    assert!(mine[0].is_my_turn);

    let theirs = h.engine.customer_queue_status(CustomerId(11)).await.unwrap();
    assert_eq!(theirs[0].token.id, second);
    assert_eq!(theirs[0].tokens_ahead, 1);
    assert_eq!(theirs[0].estimated_wait_seconds, h.queue.seed_service_seconds);
    assert_eq!(theirs[0].estimated_wait_minutes, h.queue.seed_service_seconds / 60);
    assert!(!theirs[0].is_my_turn);
    let serving = theirs[0].current_serving.as_ref().unwrap();
    assert_eq!(serving.position, 1);
}

#[tokio::test]
async fn position_policy_ignores_priority() {
    let queue = QueueConfig {
        ahead_policy: AheadPolicy::Position,
        ..QueueConfig::default()
    };
    let h = TestHarness::builder()
        .with_queue_config(queue)
        .build()
        .await
        .unwrap();
    book(&h, 10).await;
    let vip = book(&h, 11).await;
    h.engine.toggle_priority(P, vip).await.unwrap();

    let status = h.engine.customer_queue_status(CustomerId(11)).await.unwrap();
    assert_eq!(status[0].tokens_ahead, 1);
}

#[tokio::test]
async fn finished_tokens_leave_the_customer_status() {
    let h = harness().await;
    let id = book(&h, 10).await;
    h.engine.cancel_by_customer(CustomerId(10), id).await.unwrap();

    assert!(
        h.engine
            .customer_queue_status(CustomerId(10))
            .await
            .unwrap()
            .is_empty()
    );
    let history = h.engine.customer_tokens(CustomerId(10)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TokenStatus::Cancelled);
}

#[tokio::test]
async fn committed_transitions_notify_the_customer() {
    let h = harness().await;
    let served = book(&h, 10).await;
    let skipped = book(&h, 11).await;
    let cancelled = book(&h, 12).await;

    h.engine.call_next(P).await.unwrap();
    h.clock.advance(Duration::minutes(3));
    h.engine.complete(P, served).await.unwrap();
    h.engine.skip(P, skipped).await.unwrap();
    h.engine.cancel(P, cancelled).await.unwrap();

    let events = h.notifier.wait_for(4, WAIT).await;
    assert_eq!(events.len(), 4);
    let has = |id: TokenId, kind: TokenEventKind| {
        events.iter().any(|e| e.token_id == id && e.kind == kind)
    };
    assert!(has(served, TokenEventKind::Called));
    assert!(has(served, TokenEventKind::Completed));
    assert!(has(skipped, TokenEventKind::Skipped));
    assert!(has(cancelled, TokenEventKind::Cancelled));
    assert!(events.iter().all(|e| e.provider_id == P));
}

#[tokio::test]
async fn rejected_and_customer_side_actions_do_not_notify() {
    let h = harness().await;
    let first = book(&h, 10).await;
    let second = book(&h, 11).await;

    assert!(h.engine.complete(P, first).await.is_err());
    h.engine.cancel_by_customer(CustomerId(11), second).await.unwrap();
    h.engine.call_next(P).await.unwrap();

    let events = h.notifier.wait_for(1, WAIT).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, TokenEventKind::Called);
    assert_eq!(events[0].token_id, first);
}

#[tokio::test]
async fn flush_waits_for_every_delivery() {
    let h = harness().await;
    let first = book(&h, 10).await;
    let second = book(&h, 11).await;

    h.engine.call_next(P).await.unwrap();
    h.clock.advance(Duration::minutes(2));
    h.engine.complete(P, first).await.unwrap();
    h.engine.flush().await;

    let kinds: Vec<_> = h.notifier.events().await.iter().map(|e| e.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&TokenEventKind::Called));
    assert!(kinds.contains(&TokenEventKind::Completed));

    // Deliveries are still tracked after a flush.
    h.engine.call_next(P).await.unwrap();
    h.engine.flush().await;
    let events = h.notifier.events().await;
    assert_eq!(events.len(), 3);
    assert!(events.iter().any(|e| e.token_id == second));
}

#[tokio::test]
async fn failing_notifier_does_not_undo_the_transition() {
    let h = TestHarness::builder()
        .with_failing_notifier()
        .build()
        .await
        .unwrap();
    let id = book(&h, 10).await;

    let running = h.engine.call_next(P).await.unwrap().unwrap();
    assert_eq!(running.id, id);

    h.engine.flush().await;
    assert_eq!(h.failing.attempts(), 1);

    let token = h.engine.token(id).await.unwrap().unwrap();
    assert_eq!(token.status, TokenStatus::Running);
}

#[tokio::test]
async fn utc_offset_decides_the_service_day() {
    // 23:30 UTC is already the next day at UTC+01:00.
    let late = Utc.with_ymd_and_hms(2026, 3, 2, 23, 30, 0).unwrap();
    let queue = QueueConfig {
        utc_offset_minutes: 60,
        ..QueueConfig::default()
    };
    let h = TestHarness::builder()
        .with_queue_config(queue)
        .starting_at(late)
        .build()
        .await
        .unwrap();
    assert_eq!(h.engine.today().to_string(), "2026-03-03");

    let utc_engine = TestHarness::builder()
        .starting_at(late)
        .build()
        .await
        .unwrap();
    assert_eq!(utc_engine.engine.today().to_string(), "2026-03-02");

    let id = book(&h, 10).await;
    let running = h.engine.call_next(P).await.unwrap().unwrap();
    assert_eq!(running.id, id);
}

#[tokio::test]
async fn tokens_for_other_days_are_not_dispatched() {
    let h = harness().await;
    let tomorrow = h.engine.today().succ_opt().unwrap();
    let booking = NewBooking {
        customer_id: CustomerId(10),
        provider_id: P,
        service_id: ServiceId(1),
        service_date: tomorrow,
        slot_time: None,
    };
    let receipt = h.engine.create_booking(&booking).await.unwrap();
    assert_eq!(receipt.position, 1);

    assert!(h.engine.call_next(P).await.unwrap().is_none());
    let view = h.engine.provider_queue(P).await.unwrap();
    assert_eq!(view.stats.pending, 1, "future tokens are still listed");
}

#[tokio::test]
async fn force_serve_keeps_dequeue_order() {
    let h = harness().await;
    let first = book(&h, 10).await;
    let second = book(&h, 11).await;

    let served = h.engine.force_serve(P, second).await.unwrap().unwrap();
    assert_eq!(served.id, first);
    let err = h.engine.force_serve(P, second).await.unwrap_err();
    assert!(matches!(err, ServqError::ActiveTokenExists { .. }));
}

#[tokio::test]
async fn skipping_the_running_token_frees_the_provider() {
    let h = harness().await;
    let first = book(&h, 10).await;
    let second = book(&h, 11).await;

    h.engine.call_next(P).await.unwrap();
    let removed = h.engine.skip(P, first).await.unwrap();
    assert!(removed.was_running);

    let next = h.engine.call_next(P).await.unwrap().unwrap();
    assert_eq!(next.id, second);
    assert_eq!(h.engine.total_served(P).await.unwrap(), 0);
}

#[tokio::test]
async fn concurrent_call_next_activates_one_token() {
    let h = harness().await;
    for customer in 0..5 {
        book(&h, 10 + customer).await;
    }
    let other = Arc::new(h.second_engine().await.unwrap());

    let mut handles = Vec::new();
    for i in 0..10 {
        let engine = if i % 2 == 0 {
            Arc::clone(&h.engine)
        } else {
            Arc::clone(&other)
        };
        handles.push(tokio::spawn(async move { engine.call_next(P).await }));
    }
    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let winners: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().ok().and_then(|t| t.as_ref()))
        .collect();
    assert_eq!(winners.len(), 1);
    let winner = winners[0].id;
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, ServqError::ActiveTokenExists { token_id } if *token_id == winner),
                "unexpected error: {e}"
            );
        }
    }

    let view = h.engine.provider_queue(P).await.unwrap();
    assert_eq!(view.stats.running, 1);
    assert_eq!(view.stats.pending, 4);
}
