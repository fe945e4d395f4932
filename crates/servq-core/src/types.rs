// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the store, the engine and the projections.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Row id of a token.
    TokenId
);
row_id!(
    /// Identifier of the provider whose queue a token belongs to.
    ProviderId
);
row_id!(
    /// Identifier of the customer owning a token.
    CustomerId
);
row_id!(
    /// Identifier of the booked service. Read-only to the engine.
    ServiceId
);

/// Lifecycle state of a token.
///
/// `pending -> running -> {completed, skipped, cancelled}` and
/// `pending -> {skipped, cancelled}`. Terminal states are final.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    Pending,
    Running,
    Completed,
    Skipped,
    Cancelled,
}

impl TokenStatus {
    /// No transition leaves a terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Skipped | Self::Cancelled)
    }

    /// Rank used by the provider display ordering.
    pub fn display_rank(self) -> u8 {
        match self {
            Self::Running => 0,
            Self::Pending => 1,
            Self::Completed => 2,
            Self::Skipped => 3,
            Self::Cancelled => 4,
        }
    }
}

/// How a token leaves the queue without being served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// Provider skip, usually a no-show.
    Skip,
    /// Cancellation by the provider or the customer.
    Cancel,
}

impl Removal {
    /// The terminal status a removal produces.
    pub fn status(self) -> TokenStatus {
        match self {
            Self::Skip => TokenStatus::Skipped,
            Self::Cancel => TokenStatus::Cancelled,
        }
    }
}

/// Which pending tokens count as "ahead" of a waiting token.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AheadPolicy {
    /// Tokens that the dequeue order serves first (priority aware).
    #[default]
    DequeueOrder,
    /// Tokens with a strictly smaller queue position, ignoring priority.
    Position,
}

/// One customer's queued service request for a provider and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    /// Human-readable display code. Never used for ordering.
    pub code: String,
    pub provider_id: ProviderId,
    pub customer_id: CustomerId,
    pub service_id: ServiceId,
    pub service_date: NaiveDate,
    /// Requested slot (`HH:MM`), if the booking named one.
    pub slot_time: Option<String>,
    pub position: i64,
    pub priority: bool,
    pub status: TokenStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Token {
    /// Time between start and completion to the nearest second, once both are stamped.
    pub fn service_seconds(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => {
                Some(crate::schedule::whole_seconds((end - start).num_milliseconds()))
            }
            _ => None,
        }
    }
}

/// Per provider and date bookkeeping row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub provider_id: ProviderId,
    pub queue_date: NaiveDate,
    pub current_running: Option<TokenId>,
    /// Rolling average as of the last completion; `None` until one happens.
    pub average_service_seconds: Option<i64>,
    /// Completions recorded against this provider and date.
    pub total_served: i64,
    pub last_updated: DateTime<Utc>,
}

/// Rolling-average parameters applied when a token completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageWindow {
    /// Number of most recent completions considered.
    pub size: u32,
    /// Value used when no completion history exists.
    pub seed_seconds: i64,
}

impl Default for AverageWindow {
    fn default() -> Self {
        Self {
            size: 20,
            seed_seconds: 900,
        }
    }
}

/// Input of the booking collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub customer_id: CustomerId,
    pub provider_id: ProviderId,
    pub service_id: ServiceId,
    pub service_date: NaiveDate,
    #[serde(default)]
    pub slot_time: Option<String>,
}

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub token_id: TokenId,
    pub code: String,
    pub position: i64,
    pub service_date: NaiveDate,
}

/// Result of completing the running token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedToken {
    pub token_id: TokenId,
    pub customer_id: CustomerId,
    pub service_seconds: i64,
    pub average_service_seconds: i64,
}

/// Result of skipping or cancelling a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedToken {
    pub token_id: TokenId,
    pub customer_id: CustomerId,
    pub status: TokenStatus,
    /// The token was the running one, so the provider is unblocked.
    pub was_running: bool,
}

/// Result of flipping a pending token's priority flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityChange {
    pub token_id: TokenId,
    pub priority: bool,
}

// --- Store snapshots (raw reads the projector works from) ---

/// Every token of a provider from a given date forward, plus that day's stats row.
#[derive(Debug, Clone, Default)]
pub struct ProviderSnapshot {
    pub tokens: Vec<Token>,
    pub stats: Option<QueueStats>,
}

/// One provider and date queue as seen by a waiting customer.
#[derive(Debug, Clone)]
pub struct LaneSnapshot {
    pub provider_id: ProviderId,
    pub date: NaiveDate,
    pub pending: Vec<Token>,
    pub running: Option<Token>,
    pub stats: Option<QueueStats>,
}

/// A customer's active tokens for a day and the lanes they wait in.
#[derive(Debug, Clone, Default)]
pub struct CustomerSnapshot {
    pub tokens: Vec<Token>,
    pub lanes: Vec<LaneSnapshot>,
}

// --- Projections ---

/// Per-status counts for the provider view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: u32,
    pub running: u32,
    pub completed: u32,
    pub skipped: u32,
    pub cancelled: u32,
    pub total: u32,
}

/// Provider-facing queue view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderQueueView {
    pub tokens: Vec<Token>,
    pub stats: StatusCounts,
    pub current_running: Option<Token>,
    pub average_service_seconds: i64,
}

/// The token a provider is serving right now, as shown to customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServingToken {
    pub code: String,
    pub position: i64,
}

/// Customer-facing status of one waiting or running token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerTokenStatus {
    pub token: Token,
    pub tokens_ahead: u32,
    pub estimated_wait_seconds: i64,
    pub estimated_wait_minutes: i64,
    pub current_serving: Option<ServingToken>,
    pub is_my_turn: bool,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}
