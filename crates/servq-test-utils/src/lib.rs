// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for servq integration tests.
//!
//! Provides a manual clock, capturing notifiers and a harness that wires a
//! temp SQLite store into a [`QueueEngine`](servq_engine::QueueEngine).

pub mod clock;
pub mod harness;
pub mod notifier;

pub use clock::ManualClock;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use notifier::{FailingNotifier, RecordingNotifier};
