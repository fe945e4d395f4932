// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits at the engine's seams.
//!
//! Stores extend the [`Adapter`] base trait and use `#[async_trait]` for
//! dynamic dispatch compatibility.

pub mod adapter;
pub mod clock;
pub mod ephemeral;
pub mod notifier;
pub mod store;

pub use adapter::Adapter;
pub use clock::{Clock, SystemClock};
pub use ephemeral::EphemeralStore;
pub use notifier::{QueueNotifier, TokenEvent, TokenEventKind};
pub use store::QueueStore;
