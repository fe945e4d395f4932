// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All calls from one process are serialized through tokio-rusqlite's single
//! background thread. Every queue mutation additionally runs inside a
//! `BEGIN IMMEDIATE` transaction so that a second connection to the same file
//! (another process, or a second [`Database`]) waits for the write lock
//! instead of interleaving with it.

use std::path::Path;
use std::time::Duration;

use rusqlite::{ErrorCode, Transaction, TransactionBehavior};
use servq_config::model::StorageConfig;
use servq_core::ServqError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Handle to the servq SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open the database at `path` with default storage settings.
    pub async fn open(path: &str) -> Result<Self, ServqError> {
        let config = StorageConfig {
            database_path: path.to_string(),
            ..StorageConfig::default()
        };
        Self::open_with(&config).await
    }

    /// Open the configured database, apply PRAGMAs and run migrations.
    pub async fn open_with(config: &StorageConfig) -> Result<Self, ServqError> {
        let path = config.database_path.clone();
        if let Some(parent) = Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ServqError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;

        let wal_mode = config.wal_mode;
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        let mode = conn
            .call(move |conn| -> Result<Result<String, ServqError>, rusqlite::Error> {
                conn.busy_timeout(busy_timeout)?;
                let journal = if wal_mode { "WAL" } else { "DELETE" };
                let mode: String =
                    conn.pragma_update_and_check(None, "journal_mode", journal, |row| row.get(0))?;
                conn.pragma_update(None, "synchronous", "NORMAL")?;
                conn.pragma_update(None, "foreign_keys", "ON")?;
                Ok(run_migrations(conn).map(|()| mode))
            })
            .await
            .map_err(map_tr_err)??;
        debug!(path = %path, journal_mode = %mode, "database opened");

        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `op` inside a `BEGIN IMMEDIATE` transaction.
    ///
    /// The write lock is taken before `op` reads anything and held until
    /// commit. Any error from `op` or from commit rolls the whole unit back.
    pub async fn write<T, F>(&self, op: F) -> Result<T, ServqError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, TxAbort> + Send + 'static,
    {
        self.run_in(TransactionBehavior::Immediate, op).await
    }

    /// Run `op` inside a deferred (read snapshot) transaction.
    pub async fn read<T, F>(&self, op: F) -> Result<T, ServqError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, TxAbort> + Send + 'static,
    {
        self.run_in(TransactionBehavior::Deferred, op).await
    }

    async fn run_in<T, F>(&self, behavior: TransactionBehavior, op: F) -> Result<T, ServqError>
    where
        T: Send + 'static,
        F: FnOnce(&Transaction<'_>) -> Result<T, TxAbort> + Send + 'static,
    {
        self.conn
            .call(move |conn| -> Result<Result<T, ServqError>, rusqlite::Error> {
                let outcome: Result<T, TxAbort> = (|| {
                    let tx = conn.transaction_with_behavior(behavior)?;
                    let value = op(&tx)?;
                    tx.commit()?;
                    Ok(value)
                })();
                Ok(outcome.map_err(TxAbort::into_error))
            })
            .await
            .map_err(map_tr_err)?
    }

    /// Checkpoint the WAL and close the connection.
    pub async fn close(self) -> Result<(), ServqError> {
        checkpoint(&self.conn).await?;
        self.conn.close().await.map_err(map_tr_err)?;
        debug!("database closed");
        Ok(())
    }
}

/// Flush the WAL into the main database file.
pub(crate) async fn checkpoint(conn: &tokio_rusqlite::Connection) -> Result<(), ServqError> {
    conn.call(|conn| -> Result<(), rusqlite::Error> {
        conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        Ok(())
    })
    .await
    .map_err(map_tr_err)
}

/// Why a transaction closure gave up.
#[derive(Debug)]
pub enum TxAbort {
    /// SQLite failed; classified into transient or permanent on the way out.
    Sqlite(rusqlite::Error),
    /// A queue rule rejected the operation.
    Rejected(ServqError),
}

impl TxAbort {
    fn into_error(self) -> ServqError {
        match self {
            Self::Sqlite(e) => classify(e),
            Self::Rejected(e) => e,
        }
    }
}

impl From<rusqlite::Error> for TxAbort {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

impl From<ServqError> for TxAbort {
    fn from(e: ServqError) -> Self {
        Self::Rejected(e)
    }
}

/// Map a SQLite error to the servq taxonomy.
///
/// Busy and locked databases are lock-wait expiries and therefore retryable.
pub fn classify(e: rusqlite::Error) -> ServqError {
    let transient = matches!(
        e.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    );
    if transient {
        ServqError::TransientStoreFailure {
            source: Box::new(e),
        }
    } else {
        ServqError::Storage {
            source: Box::new(e),
        }
    }
}

/// Convert a tokio-rusqlite error into ServqError::Storage.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ServqError {
    ServqError::Storage {
        source: Box::new(e),
    }
}
