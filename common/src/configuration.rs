//! Run configuration, read once at start-up

use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Shelley transition epoch unknown for network magic {0}; set shelleyTransitionEpoch")]
    UnknownTransitionEpoch(u32),
}

/// Leader-log configuration file (JSON).
///
/// The eight core keys are required; `ledgerState` must be
/// present but may be `null`. The remaining keys are optional.
// config sources may lower-case keys, hence the aliases
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    #[serde(rename = "poolId", alias = "poolid")]
    pub pool_id: String,

    /// Path to the VRF signing key text envelope
    #[serde(rename = "vrfSkey", alias = "vrfskey")]
    pub vrf_skey: PathBuf,

    #[serde(rename = "genesisShelley", alias = "genesisshelley")]
    pub genesis_shelley: PathBuf,

    #[serde(rename = "genesisByron", alias = "genesisbyron")]
    pub genesis_byron: PathBuf,

    /// Pre-generated ledger state dump, if any
    #[serde(
        rename = "ledgerState",
        alias = "ledgerstate",
        deserialize_with = "Option::deserialize"
    )]
    pub ledger_state: Option<PathBuf>,

    #[serde(rename = "libsodiumBinary", alias = "libsodiumbinary")]
    pub libsodium_binary: PathBuf,

    #[serde(rename = "nodeStatsURL", alias = "nodestatsurl")]
    pub node_stats_url: String,

    #[serde(rename = "cardanoCLI", alias = "cardanocli")]
    pub cardano_cli: PathBuf,

    /// Era sub-command placed before `query`, e.g. `shelley` for old node releases
    #[serde(rename = "cardanoCLIEra", alias = "cardanocliera", default)]
    pub cardano_cli_era: Option<String>,

    #[serde(rename = "shelleyTransitionEpoch", alias = "shelleytransitionepoch", default)]
    pub shelley_transition_epoch: Option<u64>,

    #[serde(rename = "oracleProgram", alias = "oracleprogram", default = "defaults::oracle_program")]
    pub oracle_program: String,

    #[serde(rename = "oracleArgs", alias = "oracleargs", default = "defaults::oracle_args")]
    pub oracle_args: Vec<String>,

    #[serde(
        rename = "nodeStatsTimeoutSecs",
        alias = "nodestatstimeoutsecs",
        default = "defaults::node_stats_timeout"
    )]
    pub node_stats_timeout_secs: u64,
}

mod defaults {
    pub fn oracle_program() -> String {
        "python3".to_string()
    }
    pub fn oracle_args() -> Vec<String> {
        vec!["./isSlotLeader.py".to_string()]
    }
    pub fn node_stats_timeout() -> u64 {
        10
    }
}

impl RunConfig {
    /// Load and validate the configuration file at `path`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(true))
            .build()?;
        let run_config: RunConfig = config.try_deserialize()?;
        run_config.validate()?;
        Ok(run_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_id.trim().is_empty() {
            return Err(ConfigError::Invalid("poolId is empty".to_string()));
        }
        if self.node_stats_url.trim().is_empty() {
            return Err(ConfigError::Invalid("nodeStatsURL is empty".to_string()));
        }
        if self.oracle_program.trim().is_empty() {
            return Err(ConfigError::Invalid("oracleProgram is empty".to_string()));
        }
        if self.cardano_cli.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("cardanoCLI is empty".to_string()));
        }
        Ok(())
    }
}
