// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-commit notification fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use servq_core::{QueueNotifier, ServqError, TokenEvent};
use tokio_util::task::TaskTracker;
use tracing::{Instrument, info, warn};

/// Hand `event` to `notifier` on a task tracked by `tasks`.
///
/// Only called after the transition committed. Delivery failures are logged
/// and dropped. Waiting on `tasks` waits for the delivery attempt.
pub fn dispatch(
    tasks: &TaskTracker,
    notifier: &Arc<dyn QueueNotifier>,
    event: TokenEvent,
) -> tokio::task::JoinHandle<()> {
    let notifier = Arc::clone(notifier);
    tasks.spawn(
        async move {
            let (token_id, kind) = (event.token_id, event.kind);
            if let Err(e) = notifier.notify(event).await {
                warn!(
                    notifier = notifier.name(),
                    token_id = %token_id,
                    kind = %kind,
                    error = %e,
                    "queue notification failed"
                );
            }
        }
        .in_current_span(),
    )
}

/// Notifier that only writes a log line per event.
///
/// Used by the CLI when notifications are enabled but no delivery channel
/// is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl QueueNotifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, event: TokenEvent) -> Result<(), ServqError> {
        info!(
            customer_id = %event.customer_id,
            provider_id = %event.provider_id,
            token_id = %event.token_id,
            kind = %event.kind,
            "token event"
        );
        Ok(())
    }
}
