// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the servq queue engine.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{ProviderId, TokenId};

/// The error type shared by every store, engine and projection operation.
///
/// Mutating operations are all-or-nothing: whenever one of these is returned
/// from a mutation, the surrounding transaction has already been rolled back.
#[derive(Debug, Error)]
pub enum ServqError {
    /// Configuration errors (invalid TOML, bad values, missing fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Non-retryable storage failures (schema, corruption, closed connection).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Lock timeout, busy database or a similar contention failure.
    ///
    /// The attempted unit rolled back cleanly; the caller may retry.
    #[error("transient store failure: {source}")]
    TransientStoreFailure {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `call_next` was attempted while another token is still running.
    #[error("token {token_id} is still running; complete, skip or cancel it first")]
    ActiveTokenExists { token_id: TokenId },

    /// The token is not in the required source state, or is not owned by the caller.
    #[error("invalid transition for token {token_id}: {reason}")]
    InvalidTransition { token_id: TokenId, reason: String },

    /// Booking creation found a live token already holding the requested slot.
    #[error("slot {slot} on {date} is already booked for provider {provider_id}")]
    SlotUnavailable {
        provider_id: ProviderId,
        date: NaiveDate,
        slot: String,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServqError {
    /// Build an [`InvalidTransition`](Self::InvalidTransition) error.
    pub fn invalid_transition(token_id: TokenId, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            token_id,
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientStoreFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_failures_are_retryable() {
        let transient = ServqError::TransientStoreFailure {
            source: "database is locked".into(),
        };
        assert!(transient.is_retryable());

        let active = ServqError::ActiveTokenExists {
            token_id: TokenId(7),
        };
        assert!(!active.is_retryable());
        assert!(!ServqError::invalid_transition(TokenId(1), "not running").is_retryable());
    }

    #[test]
    fn messages_name_the_token() {
        let err = ServqError::ActiveTokenExists {
            token_id: TokenId(42),
        };
        assert!(err.to_string().contains("42"));

        let err = ServqError::invalid_transition(TokenId(9), "token is completed");
        let msg = err.to_string();
        assert!(msg.contains('9'));
        assert!(msg.contains("token is completed"));
    }
}
