use clap::Parser;
use std::path::PathBuf;

/// Compute reward decisions for a stream of transactions
#[derive(Parser, Debug)]
#[command(name = "reward-engine")]
#[command(about = "Compute reward decisions for a stream of transactions", long_about = None)]
pub struct CliArgs {
    /// Input JSONL file of transactions
    #[arg(value_name = "INPUT", help = "Path to the input JSONL transaction file")]
    pub input_file: PathBuf,

    /// Policy document to load at startup and watch for changes
    #[arg(
        long = "config",
        value_name = "PATH",
        default_value = "config.yaml",
        help = "Path to the YAML policy document"
    )]
    pub config: PathBuf,

    /// How often to re-read the policy document
    #[arg(
        long = "reload-interval",
        value_name = "SECONDS",
        default_value_t = 300,
        help = "Policy reload interval in seconds (0 disables reloading)"
    )]
    pub reload_interval: u64,
}
