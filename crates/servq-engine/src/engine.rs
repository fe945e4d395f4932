// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue engine: provider and customer operations over a [`QueueStore`].
//!
//! The engine holds no scheduling state of its own. Every mutation is one
//! store call (one atomic unit); the engine supplies the timestamps and the
//! notion of "today", records metrics, and notifies only after commit.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use servq_config::model::QueueConfig;
use servq_core::types::{
    BookingReceipt, CompletedToken, CustomerTokenStatus, NewBooking, PriorityChange,
    ProviderQueueView, Removal, RemovedToken, Token,
};
use servq_core::{
    Clock, CustomerId, ProviderId, QueueNotifier, QueueStore, ServqError, TokenEvent,
    TokenEventKind, TokenId, TokenStatus,
};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::{notify, projector, recording};

/// Scheduling engine for single-provider service queues.
pub struct QueueEngine {
    store: Arc<dyn QueueStore>,
    clock: Arc<dyn Clock>,
    notifier: Option<Arc<dyn QueueNotifier>>,
    deliveries: TaskTracker,
    settings: QueueConfig,
    offset: FixedOffset,
}

impl QueueEngine {
    /// Build an engine over an initialized store.
    pub fn new(store: Arc<dyn QueueStore>, clock: Arc<dyn Clock>, settings: QueueConfig) -> Self {
        let offset = settings.utc_offset().unwrap_or_else(|| {
            warn!(
                utc_offset_minutes = settings.utc_offset_minutes,
                "utc offset out of range, using UTC"
            );
            Utc.fix()
        });
        Self {
            store,
            clock,
            notifier: None,
            deliveries: TaskTracker::new(),
            settings,
            offset,
        }
    }

    /// Attach a notifier for committed transitions.
    pub fn with_notifier(mut self, notifier: Arc<dyn QueueNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// The store this engine writes through.
    pub fn store(&self) -> &Arc<dyn QueueStore> {
        &self.store
    }

    /// The current service date in the configured UTC offset.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.offset).date_naive()
    }

    fn notify(&self, event: TokenEvent) {
        if let Some(notifier) = &self.notifier {
            notify::dispatch(&self.deliveries, notifier, event);
        }
    }

    /// Wait until every notification dispatched so far was attempted.
    ///
    /// Call before dropping the runtime; the engine stays usable afterwards.
    pub async fn flush(&self) {
        self.deliveries.close();
        self.deliveries.wait().await;
        self.deliveries.reopen();
    }

    /// Log and count a failed mutation before handing it back.
    fn observe<T>(
        &self,
        operation: &'static str,
        result: Result<T, ServqError>,
    ) -> Result<T, ServqError> {
        if let Err(e) = &result {
            match e {
                ServqError::TransientStoreFailure { .. } => {
                    recording::record_transient_failure(operation);
                    warn!(operation, error = %e, "store busy, operation rolled back");
                }
                ServqError::ActiveTokenExists { .. }
                | ServqError::InvalidTransition { .. }
                | ServqError::SlotUnavailable { .. } => {
                    debug!(operation, error = %e, "operation rejected");
                }
                _ => warn!(operation, error = %e, "operation failed"),
            }
        }
        result
    }

    // --- Booking collaborator ---

    /// Create a pending token with the next queue position of its lane.
    pub async fn create_booking(
        &self,
        booking: &NewBooking,
    ) -> Result<BookingReceipt, ServqError> {
        let now = self.clock.now();
        let receipt = self.observe(
            "create_booking",
            self.store.create_booking(booking, now).await,
        )?;
        recording::record_booked();
        info!(
            provider_id = %booking.provider_id,
            customer_id = %booking.customer_id,
            token_id = %receipt.token_id,
            code = %receipt.code,
            position = receipt.position,
            date = %receipt.service_date,
            "token booked"
        );
        Ok(receipt)
    }

    // --- Provider actions ---

    /// Activate the next token of today's lane. `Ok(None)` when nobody waits.
    pub async fn call_next(&self, provider: ProviderId) -> Result<Option<Token>, ServqError> {
        let (today, now) = (self.today(), self.clock.now());
        let next = self.observe("call_next", self.store.call_next(provider, today, now).await)?;
        match &next {
            Some(token) => {
                recording::record_called();
                info!(
                    provider_id = %provider,
                    token_id = %token.id,
                    position = token.position,
                    priority = token.priority,
                    "token called"
                );
                self.notify(TokenEvent {
                    customer_id: token.customer_id,
                    provider_id: provider,
                    token_id: token.id,
                    kind: TokenEventKind::Called,
                });
            }
            None => debug!(provider_id = %provider, date = %today, "queue empty"),
        }
        Ok(next)
    }

    /// Serve the next token on request for a specific one.
    ///
    /// Selection stays FIFO with priority, exactly as [`call_next`](Self::call_next);
    /// the requested token is only logged when a different one is activated.
    pub async fn force_serve(
        &self,
        provider: ProviderId,
        requested: TokenId,
    ) -> Result<Option<Token>, ServqError> {
        let next = self.call_next(provider).await?;
        if let Some(token) = &next {
            if token.id != requested {
                info!(
                    provider_id = %provider,
                    requested = %requested,
                    activated = %token.id,
                    "force serve activated the next token in order"
                );
            }
        }
        Ok(next)
    }

    /// Complete the running token and update the rolling average.
    pub async fn complete(
        &self,
        provider: ProviderId,
        token: TokenId,
    ) -> Result<CompletedToken, ServqError> {
        let now = self.clock.now();
        let window = self.settings.average_window();
        let done = self.observe(
            "complete",
            self.store.complete(provider, token, now, window).await,
        )?;
        recording::record_finished(TokenStatus::Completed);
        recording::record_service_duration(done.service_seconds);
        info!(
            provider_id = %provider,
            token_id = %token,
            service_seconds = done.service_seconds,
            average_service_seconds = done.average_service_seconds,
            "token completed"
        );
        self.notify(TokenEvent {
            customer_id: done.customer_id,
            provider_id: provider,
            token_id: token,
            kind: TokenEventKind::Completed,
        });
        Ok(done)
    }

    /// Skip a pending or running token (no-show).
    pub async fn skip(
        &self,
        provider: ProviderId,
        token: TokenId,
    ) -> Result<RemovedToken, ServqError> {
        self.remove(provider, token, Removal::Skip).await
    }

    /// Cancel a pending or running token on the provider's side.
    pub async fn cancel(
        &self,
        provider: ProviderId,
        token: TokenId,
    ) -> Result<RemovedToken, ServqError> {
        self.remove(provider, token, Removal::Cancel).await
    }

    async fn remove(
        &self,
        provider: ProviderId,
        token: TokenId,
        removal: Removal,
    ) -> Result<RemovedToken, ServqError> {
        let now = self.clock.now();
        let removed = self.observe(
            "remove",
            self.store.remove(provider, token, removal, now).await,
        )?;
        recording::record_finished(removed.status);
        info!(
            provider_id = %provider,
            token_id = %token,
            status = %removed.status,
            was_running = removed.was_running,
            "token removed"
        );
        let kind = match removal {
            Removal::Skip => TokenEventKind::Skipped,
            Removal::Cancel => TokenEventKind::Cancelled,
        };
        self.notify(TokenEvent {
            customer_id: removed.customer_id,
            provider_id: provider,
            token_id: token,
            kind,
        });
        Ok(removed)
    }

    /// Flip the priority flag of a pending token.
    pub async fn toggle_priority(
        &self,
        provider: ProviderId,
        token: TokenId,
    ) -> Result<PriorityChange, ServqError> {
        let change = self.observe(
            "toggle_priority",
            self.store.toggle_priority(provider, token).await,
        )?;
        info!(
            provider_id = %provider,
            token_id = %token,
            priority = change.priority,
            "priority toggled"
        );
        Ok(change)
    }

    /// Everything a provider sees: tokens from today on, counts, running token.
    pub async fn provider_queue(
        &self,
        provider: ProviderId,
    ) -> Result<ProviderQueueView, ServqError> {
        let snapshot = self.store.provider_snapshot(provider, self.today()).await?;
        Ok(projector::provider_view(
            snapshot,
            self.settings.seed_service_seconds,
        ))
    }

    /// Completions recorded for `provider` across all days.
    pub async fn total_served(&self, provider: ProviderId) -> Result<i64, ServqError> {
        self.store.total_served(provider).await
    }

    // --- Customer actions ---

    /// Position, ETA and "is it my turn" for each of today's active tokens.
    pub async fn customer_queue_status(
        &self,
        customer: CustomerId,
    ) -> Result<Vec<CustomerTokenStatus>, ServqError> {
        let snapshot = self.store.customer_snapshot(customer, self.today()).await?;
        Ok(projector::customer_statuses(
            &snapshot,
            self.settings.ahead_policy,
            self.settings.seed_service_seconds,
        ))
    }

    /// Cancel one of the customer's own pending or running tokens.
    pub async fn cancel_by_customer(
        &self,
        customer: CustomerId,
        token: TokenId,
    ) -> Result<RemovedToken, ServqError> {
        let now = self.clock.now();
        let removed = self.observe(
            "cancel_by_customer",
            self.store.cancel_by_customer(customer, token, now).await,
        )?;
        recording::record_finished(removed.status);
        info!(
            customer_id = %customer,
            token_id = %token,
            was_running = removed.was_running,
            "token cancelled by customer"
        );
        Ok(removed)
    }

    /// Every token the customer ever booked, newest first.
    pub async fn customer_tokens(&self, customer: CustomerId) -> Result<Vec<Token>, ServqError> {
        self.store.customer_tokens(customer).await
    }

    /// Look up a single token.
    pub async fn token(&self, id: TokenId) -> Result<Option<Token>, ServqError> {
        self.store.token(id).await
    }
}
