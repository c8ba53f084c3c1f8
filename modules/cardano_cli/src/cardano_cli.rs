//! Leader-log node query module
//! Runs the node's command line tool and decodes its JSON answers

use async_trait::async_trait;
use leaderlog_common::{
    queries::{ChainTip, ProtocolParameters},
    NetworkMagic,
};
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

mod command;
pub use command::Query;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Cannot run {program}: {source}")]
    Spawn { program: PathBuf, source: io::Error },

    #[error("{query} exited with {status}: {stderr}")]
    Failed {
        query: Query,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Unparseable output from {query}: {source}")]
    Parse {
        query: Query,
        source: serde_json::Error,
    },

    #[error("Cannot write {path}: {source}")]
    Output { path: PathBuf, source: io::Error },
}

/// Node queries needed by a leader-log run
#[async_trait]
pub trait NodeQuery: Send + Sync {
    /// Dump the full ledger state into `out_file`, replacing it
    async fn ledger_state(&self, out_file: &Path) -> Result<(), QueryError>;

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, QueryError>;

    async fn tip(&self) -> Result<ChainTip, QueryError>;
}

/// [`NodeQuery`] backed by `cardano-cli`
#[derive(Debug, Clone)]
pub struct CardanoCli {
    program: PathBuf,
    era: Option<String>,
    network: NetworkMagic,
}

impl CardanoCli {
    pub fn new(program: &Path, era: Option<&str>, network: NetworkMagic) -> Self {
        Self {
            program: program.to_path_buf(),
            era: era.map(str::to_string),
            network,
        }
    }

    fn command(&self, query: Query) -> Command {
        let args = query.args(self.era.as_deref(), &self.network);
        debug!("Running {} {}", self.program.display(), args.join(" "));
        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null());
        command
    }

    async fn run_for_json<T: DeserializeOwned>(&self, query: Query) -> Result<T, QueryError> {
        info!("Running {query}");
        let output = self.command(query).output().await.map_err(|e| QueryError::Spawn {
            program: self.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            return Err(QueryError::Failed {
                query,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| QueryError::Parse { query, source: e })
    }
}

#[async_trait]
impl NodeQuery for CardanoCli {
    async fn ledger_state(&self, out_file: &Path) -> Result<(), QueryError> {
        let query = Query::LedgerState;
        info!("Running {query} into {}", out_file.display());

        let tmp_path = out_file.with_extension("partial");
        let output_error = |path: &Path, e: io::Error| QueryError::Output {
            path: path.to_path_buf(),
            source: e,
        };

        let result = async {
            // Child stdout goes straight to the partial file
            let file = tokio::fs::File::create(&tmp_path)
                .await
                .map_err(|e| output_error(&tmp_path, e))?
                .into_std()
                .await;

            let child = self
                .command(query)
                .stdout(Stdio::from(file))
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| QueryError::Spawn {
                    program: self.program.clone(),
                    source: e,
                })?;
            let output = child.wait_with_output().await.map_err(|e| QueryError::Spawn {
                program: self.program.clone(),
                source: e,
            })?;

            if !output.status.success() {
                return Err(QueryError::Failed {
                    query,
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }

            tokio::fs::rename(&tmp_path, out_file)
                .await
                .map_err(|e| output_error(out_file, e))?;
            Ok(())
        }
        .await;

        if result.is_err() {
            let _ = tokio::fs::remove_file(&tmp_path).await;
        }

        result
    }

    async fn protocol_parameters(&self) -> Result<ProtocolParameters, QueryError> {
        self.run_for_json(Query::ProtocolParameters).await
    }

    async fn tip(&self) -> Result<ChainTip, QueryError> {
        self.run_for_json(Query::Tip).await
    }
}
