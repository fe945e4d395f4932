// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue scheduling engine for servq.
//!
//! [`QueueEngine`] turns provider and customer actions into atomic store
//! operations, stamps them with the configured clock, fans committed
//! transitions out to the notifier and builds the read-side views.

pub mod engine;
pub mod notify;
pub mod projector;
pub mod recording;

pub use engine::QueueEngine;
pub use notify::LogNotifier;
