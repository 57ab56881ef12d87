//! TierTally daemon: inspect a persisted tally from the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tally_crypto::generate_leaf;
use tally_node::{init_logging, LogFormat, NodeConfig, TallyNode};
use tally_store::AuditRecord;
use tally_store_lmdb::{check_integrity, LmdbEnvironment};
use tally_types::{Timestamp, VoterId};

#[derive(Parser)]
#[command(name = "tally-daemon", about = "TierTally three-tier vote tally")]
struct Cli {
    /// Path to a TOML configuration file. Flags and env vars override its values.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// LMDB directory.
    #[arg(long, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the national result and per-division batch status as JSON.
    Status,
    /// Print the audit trail as JSON lines.
    Audit,
    /// Check every database for readable entries.
    Check,
    /// Print the leaf hash of a vote.
    Leaf {
        #[arg(long)]
        voter: String,
        #[arg(long)]
        candidate: u32,
        /// Seconds since the Unix epoch.
        #[arg(long)]
        timestamp: u64,
    },
    /// Print the default TOML configuration.
    DefaultConfig,
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

fn audit_line(record: &AuditRecord) -> serde_json::Value {
    json!({
        "sequence": record.sequence,
        "action": record.action,
        "data_hash": record.data_hash.to_string(),
        "validators": record.validators.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "recorded_at": record.recorded_at.as_secs(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Leaf {
            voter,
            candidate,
            timestamp,
        } => {
            tally_utils::init_tracing("warn");
            let voter = VoterId::new(voter.as_str()).context("invalid voter id")?;
            println!("{}", generate_leaf(&voter, *candidate, Timestamp::new(*timestamp)));
            return Ok(());
        }
        Command::DefaultConfig => {
            print!("{}", NodeConfig::default().to_toml_string()?);
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    init_logging(config.log_format, &config.log_level).context("installing log subscriber")?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        rollup_window = %tally_utils::format_duration(config.params.rollup_window_secs),
        "starting tally daemon"
    );

    match cli.command {
        Command::Status => {
            let node = TallyNode::open(config)?;
            println!("{}", serde_json::to_string_pretty(&node.status()?)?);
        }
        Command::Audit => {
            let node = TallyNode::open(config)?;
            for record in node.audit_trail()? {
                println!("{}", audit_line(&record));
            }
        }
        Command::Check => {
            let env = LmdbEnvironment::open(&config.data_dir, config.map_size)?;
            let report = check_integrity(&env)?;
            println!(
                "{}",
                json!({
                    "databases_checked": report.databases_checked,
                    "total_entries": report.total_entries,
                    "errors": report.errors,
                })
            );
            if !report.is_healthy() {
                anyhow::bail!("{} integrity error(s)", report.errors.len());
            }
        }
        Command::Leaf { .. } | Command::DefaultConfig => {}
    }

    Ok(())
}
