//! Leader-log process
//! Resolves the leader schedule inputs of one pool and prints the oracle's answer

use anyhow::{Context, Result};
use clap::Parser;
use leaderlog_common::{configuration::RunConfig, EpochNonce, ReplayMode};
use leaderlog_module_cardano_cli::CardanoCli;
use leaderlog_module_leader_schedule::{LeaderSchedule, ProcessOracle, RunContext};
use leaderlog_module_node_stats::NodeStatsClient;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{filter, fmt, EnvFilter, Registry};

#[derive(Parser, Debug)]
#[command(name = "leader-logs")]
#[command(about = "Compute a stake pool's leader schedule")]
struct Args {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Nonce of the epoch being evaluated
    epoch_nonce: String,

    /// Evaluate the epoch that just ended instead of the current one
    #[arg(long)]
    replay: bool,

    /// Positional replay marker; "1" means replay
    #[arg(hide = true)]
    legacy_replay: Option<String>,

    /// Directory for the regenerated ledger state
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,
}

impl Args {
    fn replay_mode(&self) -> ReplayMode {
        ReplayMode::from(self.replay || self.legacy_replay.as_deref() == Some("1"))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Standard logging using RUST_LOG for log levels default to INFO for events only
    let fmt_layer = fmt::layer()
        .with_filter(EnvFilter::from_default_env().add_directive(filter::LevelFilter::INFO.into()))
        .with_filter(filter::filter_fn(|meta| meta.is_event()));
    Registry::default().with(fmt_layer).init();

    let args = Args::parse();
    let mode = args.replay_mode();
    info!("Leader logs for {} epoch", mode);

    let config = RunConfig::load(&args.config)
        .with_context(|| format!("Loading {}", args.config.display()))?;
    let nonce = EpochNonce::new(&args.epoch_nonce)?;
    let context = RunContext::prepare(&config, &args.work_dir)?;

    let node = CardanoCli::new(
        &config.cardano_cli,
        config.cardano_cli_era.as_deref(),
        context.genesis.network,
    );
    let oracle = ProcessOracle::new(&config.oracle_program, &config.oracle_args);
    let stats = NodeStatsClient::new(
        &config.node_stats_url,
        Duration::from_secs(config.node_stats_timeout_secs),
    )?;

    let schedule = LeaderSchedule::new(&node, &oracle);
    let (stats_result, outcome) = tokio::join!(stats.update(), schedule.run(&context, &nonce, mode));

    if let Err(e) = stats_result {
        warn!("Could not update node stats: {e}");
    }
    let outcome = outcome?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&outcome.output)?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("leader-logs").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn current_epoch_by_default() {
        let args = parse(&["config.json", "abcd"]);
        assert_eq!(args.replay_mode(), ReplayMode::Current);
        assert_eq!(args.work_dir, PathBuf::from("."));
    }

    #[test]
    fn replay_flag_and_marker() {
        assert_eq!(
            parse(&["config.json", "abcd", "--replay"]).replay_mode(),
            ReplayMode::PreviousEpoch
        );
        assert_eq!(
            parse(&["config.json", "abcd", "1"]).replay_mode(),
            ReplayMode::PreviousEpoch
        );
        assert_eq!(
            parse(&["config.json", "abcd", "0"]).replay_mode(),
            ReplayMode::Current
        );
    }

    #[test]
    fn nonce_is_required() {
        assert!(Args::try_parse_from(["leader-logs", "config.json"]).is_err());
    }
}
