// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine tests.
//!
//! `TestHarness` assembles a [`QueueEngine`] over a temp SQLite database,
//! a [`ManualClock`] and a capturing notifier.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use servq_config::model::{QueueConfig, StorageConfig};
use servq_core::types::{BookingReceipt, NewBooking};
use servq_core::{CustomerId, ProviderId, QueueNotifier, QueueStore, ServiceId, ServqError};
use servq_engine::QueueEngine;
use servq_storage::SqliteQueueStore;

use crate::clock::ManualClock;
use crate::notifier::{FailingNotifier, RecordingNotifier};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    queue: QueueConfig,
    start: DateTime<Utc>,
    failing_notifier: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            queue: QueueConfig::default(),
            start: Utc
                .with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
            failing_notifier: false,
        }
    }

    /// Use custom scheduling settings.
    pub fn with_queue_config(mut self, queue: QueueConfig) -> Self {
        self.queue = queue;
        self
    }

    /// Start the manual clock at `start`.
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Wire a notifier that rejects every event.
    pub fn with_failing_notifier(mut self) -> Self {
        self.failing_notifier = true;
        self
    }

    /// Build the harness, creating the database and the engine.
    pub async fn build(self) -> Result<TestHarness, ServqError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ServqError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db").to_string_lossy().into_owned();

        let storage = StorageConfig {
            database_path: db_path.clone(),
            ..StorageConfig::default()
        };
        let store = Arc::new(SqliteQueueStore::new(storage.clone()));
        store.initialize().await?;

        let clock = Arc::new(ManualClock::new(self.start));
        let recorder = Arc::new(RecordingNotifier::new());
        let failing = Arc::new(FailingNotifier::new());
        let notifier: Arc<dyn QueueNotifier> = if self.failing_notifier {
            failing.clone()
        } else {
            recorder.clone()
        };

        let engine = QueueEngine::new(store.clone(), clock.clone(), self.queue.clone())
            .with_notifier(notifier);

        Ok(TestHarness {
            engine: Arc::new(engine),
            store,
            clock,
            notifier: recorder,
            failing,
            queue: self.queue,
            storage,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete engine environment over temp storage.
pub struct TestHarness {
    /// The engine under test.
    pub engine: Arc<QueueEngine>,
    /// The store the engine writes through.
    pub store: Arc<SqliteQueueStore>,
    /// Clock shared with the engine.
    pub clock: Arc<ManualClock>,
    /// Captures events unless the harness was built with a failing notifier.
    pub notifier: Arc<RecordingNotifier>,
    /// Counts delivery attempts when the harness was built with a failing notifier.
    pub failing: Arc<FailingNotifier>,
    /// Scheduling settings the engine was built with.
    pub queue: QueueConfig,
    storage: StorageConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test environment.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Path of the temp database file.
    pub fn db_path(&self) -> &str {
        &self.storage.database_path
    }

    /// Book a token for `customer` with `provider` on the engine's today.
    pub async fn book(
        &self,
        provider: i64,
        customer: i64,
    ) -> Result<BookingReceipt, ServqError> {
        let booking = NewBooking {
            customer_id: CustomerId(customer),
            provider_id: ProviderId(provider),
            service_id: ServiceId(1),
            service_date: self.engine.today(),
            slot_time: None,
        };
        self.engine.create_booking(&booking).await
    }

    /// Open an independent store (own connection) on the same database file.
    pub async fn second_store(&self) -> Result<Arc<SqliteQueueStore>, ServqError> {
        let store = Arc::new(SqliteQueueStore::new(self.storage.clone()));
        store.initialize().await?;
        Ok(store)
    }

    /// An engine over a second connection, sharing the clock but not the notifier.
    pub async fn second_engine(&self) -> Result<QueueEngine, ServqError> {
        let store = self.second_store().await?;
        Ok(QueueEngine::new(store, self.clock.clone(), self.queue.clone()))
    }
}
