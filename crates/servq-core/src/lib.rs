// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for servq, a single-provider service queue engine.
//!
//! This crate holds the error taxonomy, the domain types, the traits every
//! store and notifier implements, and the pure scheduling rules (queue
//! orderings, rolling service average, tokens-ahead estimate).

pub mod error;
pub mod schedule;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ServqError;
pub use types::{CustomerId, HealthStatus, ProviderId, ServiceId, TokenId, TokenStatus};

pub use traits::{
    Adapter, Clock, EphemeralStore, QueueNotifier, QueueStore, SystemClock, TokenEvent,
    TokenEventKind,
};
