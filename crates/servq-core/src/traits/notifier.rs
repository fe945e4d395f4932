// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification hook for out-of-band delivery (email, push, SMS).
//!
//! The engine calls the notifier only after the scheduling transaction has
//! committed. A failing notifier never affects queue state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::error::ServqError;
use crate::types::{CustomerId, ProviderId, TokenId};

/// What happened to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenEventKind {
    /// The token was activated by the provider.
    Called,
    Completed,
    Skipped,
    Cancelled,
}

/// A committed queue transition addressed to the token's customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenEvent {
    pub customer_id: CustomerId,
    pub provider_id: ProviderId,
    pub token_id: TokenId,
    pub kind: TokenEventKind,
}

/// Receives committed transitions. Best effort, fire and forget.
#[async_trait]
pub trait QueueNotifier: Send + Sync + 'static {
    /// Name used in log lines when delivery fails.
    fn name(&self) -> &str;

    /// Deliver one event.
    async fn notify(&self, event: TokenEvent) -> Result<(), ServqError>;
}
