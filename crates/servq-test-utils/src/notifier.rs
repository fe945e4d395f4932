// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notifiers for asserting on post-commit events.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use servq_core::{QueueNotifier, ServqError, TokenEvent};
use tokio::sync::{Mutex, Notify};

/// Captures every delivered event.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<TokenEvent>>>,
    notify: Arc<Notify>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events delivered so far, in delivery order.
    pub async fn events(&self) -> Vec<TokenEvent> {
        self.events.lock().await.clone()
    }

    /// Wait until at least `count` events arrived or `timeout` passed.
    ///
    /// Delivery happens on spawned tasks, so tests poll through this.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<TokenEvent> {
        let _ = tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.events.lock().await.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await;
        self.events().await
    }
}

#[async_trait]
impl QueueNotifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, event: TokenEvent) -> Result<(), ServqError> {
        self.events.lock().await.push(event);
        self.notify.notify_waiters();
        Ok(())
    }
}

/// Rejects every event, counting the attempts.
#[derive(Default)]
pub struct FailingNotifier {
    attempts: AtomicUsize,
}

impl FailingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many deliveries were attempted.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueNotifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn notify(&self, _event: TokenEvent) -> Result<(), ServqError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(ServqError::Internal("notification channel unavailable".into()))
    }
}
