// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the servq queue engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, immediate
//! (write-locked) transactions for every queue mutation, and typed queries
//! for tokens, per-day queue stats and expiring key-value entries.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use adapter::SqliteQueueStore;
pub use database::Database;
