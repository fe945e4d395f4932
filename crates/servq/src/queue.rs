// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue subcommands: open the store, run one engine operation, print JSON.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use servq_config::ServqConfig;
use servq_core::types::NewBooking;
use servq_core::{
    Adapter, CustomerId, EphemeralStore, ProviderId, QueueStore, ServiceId, ServqError,
    SystemClock, TokenId,
};
use servq_engine::{LogNotifier, QueueEngine};
use servq_storage::SqliteQueueStore;
use tracing::debug;

use crate::Commands;

/// Pretty-print `value` as JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), ServqError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ServqError::Internal(format!("failed to encode output: {e}")))?;
    println!("{json}");
    Ok(())
}

/// Open the configured store and build an engine over it.
async fn open_engine(
    config: &ServqConfig,
) -> Result<(Arc<SqliteQueueStore>, QueueEngine), ServqError> {
    let store = Arc::new(SqliteQueueStore::new(config.storage.clone()));
    store.initialize().await?;

    let purged = store.purge_expired(Utc::now()).await?;
    if purged > 0 {
        debug!(purged, "expired ephemeral entries removed");
    }

    let mut engine =
        QueueEngine::new(store.clone(), Arc::new(SystemClock), config.queue.clone());
    if config.notify.enabled {
        engine = engine.with_notifier(Arc::new(LogNotifier));
    }
    Ok((store, engine))
}

/// Run one queue subcommand and shut the store down afterwards.
pub(crate) async fn run(config: ServqConfig, command: Commands) -> Result<(), ServqError> {
    servq_engine::recording::register_metrics();
    let (store, engine) = open_engine(&config).await?;
    let result = execute(&engine, command).await;
    engine.flush().await;
    store.shutdown().await?;
    result
}

async fn execute(engine: &QueueEngine, command: Commands) -> Result<(), ServqError> {
    match command {
        Commands::Book {
            provider,
            customer,
            service,
            date,
            slot,
        } => {
            let booking = NewBooking {
                customer_id: CustomerId(customer),
                provider_id: ProviderId(provider),
                service_id: ServiceId(service),
                service_date: date.unwrap_or_else(|| engine.today()),
                slot_time: slot,
            };
            print_json(&engine.create_booking(&booking).await?)
        }
        Commands::CallNext { provider } => {
            print_json(&engine.call_next(ProviderId(provider)).await?)
        }
        Commands::ForceServe { provider, token } => {
            print_json(&engine.force_serve(ProviderId(provider), TokenId(token)).await?)
        }
        Commands::Complete { provider, token } => {
            print_json(&engine.complete(ProviderId(provider), TokenId(token)).await?)
        }
        Commands::Skip { provider, token } => {
            print_json(&engine.skip(ProviderId(provider), TokenId(token)).await?)
        }
        Commands::Cancel {
            provider,
            customer,
            token,
        } => {
            let removed = match (provider, customer) {
                (Some(provider), _) => engine.cancel(ProviderId(provider), TokenId(token)).await?,
                (None, Some(customer)) => {
                    engine
                        .cancel_by_customer(CustomerId(customer), TokenId(token))
                        .await?
                }
                (None, None) => {
                    return Err(ServqError::Config(
                        "cancel needs --provider or --customer".into(),
                    ));
                }
            };
            print_json(&removed)
        }
        Commands::Priority { provider, token } => {
            print_json(&engine.toggle_priority(ProviderId(provider), TokenId(token)).await?)
        }
        Commands::Queue { provider } => {
            print_json(&engine.provider_queue(ProviderId(provider)).await?)
        }
        Commands::Status { customer } => {
            print_json(&engine.customer_queue_status(CustomerId(customer)).await?)
        }
        Commands::History { customer } => {
            print_json(&engine.customer_tokens(CustomerId(customer)).await?)
        }
        Commands::Config => Err(ServqError::Internal(
            "config is handled before the store is opened".into(),
        )),
    }
}
