// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token and queue-stats store.
//!
//! Every mutating method is one atomic unit: the rows it reads to decide are
//! read under the store's write lock inside the same transaction as the
//! write, and either everything commits or nothing does. Time is passed in
//! by the caller so the store never consults a clock of its own.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::ServqError;
use crate::traits::adapter::Adapter;
use crate::types::{
    AverageWindow, BookingReceipt, CompletedToken, CustomerId, CustomerSnapshot, NewBooking,
    PriorityChange, ProviderId, ProviderSnapshot, Removal, RemovedToken, Token, TokenId,
};

/// Durable, transactional home of tokens and per-day queue stats.
#[async_trait]
pub trait QueueStore: Adapter {
    /// Prepare the backend (open connection, run migrations).
    async fn initialize(&self) -> Result<(), ServqError>;

    /// Insert a `pending` token with a freshly assigned queue position.
    ///
    /// Fails with [`ServqError::SlotUnavailable`] when a live token already
    /// holds the requested slot; in that case no position is consumed.
    async fn create_booking(
        &self,
        booking: &NewBooking,
        now: DateTime<Utc>,
    ) -> Result<BookingReceipt, ServqError>;

    /// Activate the next pending token of `provider` for `today`.
    ///
    /// `Ok(None)` means the queue is empty.
    async fn call_next(
        &self,
        provider: ProviderId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<Token>, ServqError>;

    /// Complete the running token and recompute the provider's rolling average.
    async fn complete(
        &self,
        provider: ProviderId,
        token: TokenId,
        now: DateTime<Utc>,
        window: AverageWindow,
    ) -> Result<CompletedToken, ServqError>;

    /// Skip or cancel a pending or running token of `provider`.
    async fn remove(
        &self,
        provider: ProviderId,
        token: TokenId,
        removal: Removal,
        now: DateTime<Utc>,
    ) -> Result<RemovedToken, ServqError>;

    /// Cancel a pending or running token on behalf of its customer.
    async fn cancel_by_customer(
        &self,
        customer: CustomerId,
        token: TokenId,
        now: DateTime<Utc>,
    ) -> Result<RemovedToken, ServqError>;

    /// Flip the priority flag of a pending token of `provider`.
    async fn toggle_priority(
        &self,
        provider: ProviderId,
        token: TokenId,
    ) -> Result<PriorityChange, ServqError>;

    /// Tokens of `provider` dated `from` or later, plus the stats row for `from`.
    async fn provider_snapshot(
        &self,
        provider: ProviderId,
        from: NaiveDate,
    ) -> Result<ProviderSnapshot, ServqError>;

    /// Active tokens of `customer` on `today` and the lanes they wait in.
    async fn customer_snapshot(
        &self,
        customer: CustomerId,
        today: NaiveDate,
    ) -> Result<CustomerSnapshot, ServqError>;

    /// Every token of `customer`, newest service date first.
    async fn customer_tokens(&self, customer: CustomerId) -> Result<Vec<Token>, ServqError>;

    /// Look up a single token.
    async fn token(&self, id: TokenId) -> Result<Option<Token>, ServqError>;

    /// Completions recorded for `provider` across all days.
    async fn total_served(&self, provider: ProviderId) -> Result<i64, ServqError>;
}
