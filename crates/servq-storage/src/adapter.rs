// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the QueueStore and EphemeralStore traits.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use servq_config::model::StorageConfig;
use servq_core::types::{
    AverageWindow, BookingReceipt, CompletedToken, CustomerSnapshot, NewBooking, PriorityChange,
    ProviderSnapshot, Removal, RemovedToken, Token,
};
use servq_core::{
    Adapter, CustomerId, EphemeralStore, HealthStatus, ProviderId, QueueStore, ServqError,
    TokenId,
};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed queue store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`QueueStore::initialize`].
pub struct SqliteQueueStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteQueueStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`QueueStore::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create a store over an already opened database.
    pub fn with_database(config: StorageConfig, db: Database) -> Self {
        Self {
            config,
            db: OnceCell::new_with(Some(db)),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, ServqError> {
        self.db.get().ok_or_else(|| ServqError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl Adapter for SqliteQueueStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    async fn health_check(&self) -> Result<HealthStatus, ServqError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ServqError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl QueueStore for SqliteQueueStore {
    async fn initialize(&self) -> Result<(), ServqError> {
        let db = Database::open_with(&self.config).await?;
        self.db.set(db).map_err(|_| ServqError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite queue store initialized");
        Ok(())
    }

    async fn create_booking(
        &self,
        booking: &NewBooking,
        now: DateTime<Utc>,
    ) -> Result<BookingReceipt, ServqError> {
        queries::tokens::create_booking(self.db()?, booking, now).await
    }

    async fn call_next(
        &self,
        provider: ProviderId,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Option<Token>, ServqError> {
        queries::dispatch::call_next(self.db()?, provider, today, now).await
    }

    async fn complete(
        &self,
        provider: ProviderId,
        token: TokenId,
        now: DateTime<Utc>,
        window: AverageWindow,
    ) -> Result<CompletedToken, ServqError> {
        queries::lifecycle::complete(self.db()?, provider, token, now, window).await
    }

    async fn remove(
        &self,
        provider: ProviderId,
        token: TokenId,
        removal: Removal,
        now: DateTime<Utc>,
    ) -> Result<RemovedToken, ServqError> {
        queries::lifecycle::remove(self.db()?, provider, token, removal, now).await
    }

    async fn cancel_by_customer(
        &self,
        customer: CustomerId,
        token: TokenId,
        now: DateTime<Utc>,
    ) -> Result<RemovedToken, ServqError> {
        queries::lifecycle::cancel_by_customer(self.db()?, customer, token, now).await
    }

    async fn toggle_priority(
        &self,
        provider: ProviderId,
        token: TokenId,
    ) -> Result<PriorityChange, ServqError> {
        queries::lifecycle::toggle_priority(self.db()?, provider, token).await
    }

    async fn provider_snapshot(
        &self,
        provider: ProviderId,
        from: NaiveDate,
    ) -> Result<ProviderSnapshot, ServqError> {
        queries::snapshot::provider_snapshot(self.db()?, provider, from).await
    }

    async fn customer_snapshot(
        &self,
        customer: CustomerId,
        today: NaiveDate,
    ) -> Result<CustomerSnapshot, ServqError> {
        queries::snapshot::customer_snapshot(self.db()?, customer, today).await
    }

    async fn customer_tokens(&self, customer: CustomerId) -> Result<Vec<Token>, ServqError> {
        queries::tokens::customer_tokens(self.db()?, customer).await
    }

    async fn token(&self, id: TokenId) -> Result<Option<Token>, ServqError> {
        queries::tokens::get_token(self.db()?, id).await
    }

    async fn total_served(&self, provider: ProviderId) -> Result<i64, ServqError> {
        queries::snapshot::total_served(self.db()?, provider).await
    }
}

#[async_trait]
impl EphemeralStore for SqliteQueueStore {
    async fn put(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), ServqError> {
        queries::ephemeral::put(self.db()?, namespace, key, value, expires_at).await
    }

    async fn get(
        &self,
        namespace: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, ServqError> {
        queries::ephemeral::get(self.db()?, namespace, key, now).await
    }

    async fn take(
        &self,
        namespace: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>, ServqError> {
        queries::ephemeral::take(self.db()?, namespace, key, now).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, ServqError> {
        queries::ephemeral::purge_expired(self.db()?, now).await
    }
}
