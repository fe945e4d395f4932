// SPDX-FileCopyrightText: 2026 Servq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Servq - a single-provider service queue engine.
//!
//! This is the binary entry point. Every subcommand runs one engine
//! operation against the configured SQLite database and prints JSON.

mod prometheus;
mod queue;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Servq - a single-provider service queue engine.
#[derive(Parser, Debug)]
#[command(name = "servq", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the collected metrics in Prometheus text format on stderr.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Book a token for a customer.
    Book {
        #[arg(long)]
        provider: i64,
        #[arg(long)]
        customer: i64,
        #[arg(long, default_value_t = 1)]
        service: i64,
        /// Service date (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Optional appointment slot, e.g. 10:30.
        #[arg(long)]
        slot: Option<String>,
    },
    /// Activate the next waiting token.
    CallNext {
        #[arg(long)]
        provider: i64,
    },
    /// Serve on request for a specific token.
    ForceServe {
        #[arg(long)]
        provider: i64,
        token: i64,
    },
    /// Complete the running token.
    Complete {
        #[arg(long)]
        provider: i64,
        token: i64,
    },
    /// Skip a token (no-show).
    Skip {
        #[arg(long)]
        provider: i64,
        token: i64,
    },
    /// Cancel a token, as the provider or with --customer as its owner.
    Cancel {
        #[arg(long, conflicts_with = "customer", required_unless_present = "customer")]
        provider: Option<i64>,
        #[arg(long)]
        customer: Option<i64>,
        token: i64,
    },
    /// Toggle the priority flag of a pending token.
    Priority {
        #[arg(long)]
        provider: i64,
        token: i64,
    },
    /// Show a provider's queue.
    Queue {
        #[arg(long)]
        provider: i64,
    },
    /// Show a customer's position and estimated wait.
    Status {
        #[arg(long)]
        customer: i64,
    },
    /// List every token a customer booked.
    History {
        #[arg(long)]
        customer: i64,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => servq_config::load_and_validate_path(path),
        None => servq_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            servq_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.service.log_level);

    let metrics = if cli.metrics {
        match prometheus::install() {
            Ok(handle) => Some(handle),
            Err(e) => {
                eprintln!("servq: {e}");
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let result = match cli.command {
        Some(Commands::Config) => queue::print_json(&config),
        Some(command) => queue::run(config, command).await,
        None => {
            println!("servq: use --help for available commands");
            Ok(())
        }
    };

    if let Some(handle) = metrics {
        eprint!("{}", handle.render());
    }

    if let Err(e) = result {
        eprintln!("servq: {e}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with an env filter on stderr.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("servq={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
