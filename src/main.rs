//! Reward Engine CLI
//!
//! Reads transactions from a JSONL file, computes a reward decision for each
//! against the active policy snapshot, and writes the decisions as JSONL to
//! stdout. Logs go to stderr so the output stream stays clean.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- transactions.jsonl > decisions.jsonl
//! cargo run -- --config policy/prod.yaml --reload-interval 60 transactions.jsonl
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (policy document invalid, input file unreadable, etc.)

use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use reward_engine::cli;
use reward_engine::config::ConfigStore;
use reward_engine::core::{overrides, DecisionEngine};
use reward_engine::io::{write_decision, JsonlReader};
use reward_engine::store::MemoryStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();

    // A bad policy document at startup is fatal; there is nothing to fall
    // back to
    let config = match ConfigStore::load(&args.config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let reload_handle = (args.reload_interval > 0)
        .then(|| Arc::clone(&config).spawn_reload_timer(Duration::from_secs(args.reload_interval)));

    let store = Arc::new(MemoryStore::new());
    let override_source = overrides::from_settings(&config.get_active().persona_overrides);
    let engine = DecisionEngine::new(store, Arc::clone(&config), override_source);

    let mut reader = match JsonlReader::open(&args.input_file).await {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", args.input_file.display(), e);
            process::exit(1);
        }
    };

    let mut output = std::io::stdout().lock();
    while let Some(txn) = reader.next_transaction().await {
        match engine.decide(&txn).await {
            Ok(decision) => {
                if let Err(e) = write_decision(&mut output, &decision) {
                    eprintln!("Error: cannot write decision: {}", e);
                    process::exit(1);
                }
            }
            Err(e) => {
                warn!(txn_id = %txn.txn_id, error = %e, "transaction rejected");
            }
        }
    }

    if let Some(handle) = reload_handle {
        handle.abort();
    }
}
