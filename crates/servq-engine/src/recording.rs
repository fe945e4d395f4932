// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder can collect these
//! metrics. Without a recorder every call is a no-op.

use metrics::{describe_counter, describe_histogram};
use servq_core::TokenStatus;

/// Register all servq metric descriptions.
///
/// Call once after a recorder is installed. The engine never installs one
/// itself: the embedding process chooses the sink (the `servq` binary
/// installs a Prometheus recorder for `--metrics`).
pub fn register_metrics() {
    describe_counter!("servq_tokens_booked_total", "Tokens created by booking");
    describe_counter!("servq_tokens_called_total", "Tokens activated by call-next");
    describe_counter!(
        "servq_tokens_finished_total",
        "Tokens that reached a terminal state, by status"
    );
    describe_histogram!(
        "servq_service_duration_seconds",
        "Time between start and completion of a served token"
    );
    describe_counter!(
        "servq_transient_failures_total",
        "Store operations that gave up waiting for the write lock"
    );
}

/// Record a new booking.
pub fn record_booked() {
    metrics::counter!("servq_tokens_booked_total").increment(1);
}

/// Record a token activation.
pub fn record_called() {
    metrics::counter!("servq_tokens_called_total").increment(1);
}

/// Record a terminal transition.
pub fn record_finished(status: TokenStatus) {
    metrics::counter!("servq_tokens_finished_total", "status" => status.to_string()).increment(1);
}

/// Record how long a completed service took.
pub fn record_service_duration(seconds: i64) {
    metrics::histogram!("servq_service_duration_seconds").record(seconds.max(0) as f64);
}

/// Record a retryable store failure for `operation`.
pub fn record_transient_failure(operation: &'static str) {
    metrics::counter!("servq_transient_failures_total", "operation" => operation).increment(1);
}
