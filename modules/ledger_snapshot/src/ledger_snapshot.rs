//! Leader-log ledger snapshot module
//! Acquires a ledger state snapshot and resolves a pool's stake share from it

use leaderlog_common::{rational_number::RationalNumber, PoolId, ReplayMode};
use leaderlog_module_cardano_cli::{NodeQuery, QueryError};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

mod ledger;
mod sigma;

use ledger::{EsSnapshots, LedgerRoot};
pub use ledger::StakeSnapshot;
pub use sigma::calculate_sigma;

/// Where a regenerated snapshot is written, relative to the working directory
pub const SNAPSHOT_CACHE_FILE: &str = "ledgerstate.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Cannot read ledger state {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Cannot parse ledger state {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Ledger state {0} has no stake snapshots")]
    MissingSnapshots(PathBuf),

    #[error("Ledger state query failed: {0}")]
    Query(#[from] QueryError),

    #[error("Ledger state parsing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Total stake in ledger state overflows")]
    StakeOverflow,
}

/// Stake distributions of a ledger state, at one point in time
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    set: StakeSnapshot,
    go: StakeSnapshot,
}

impl LedgerSnapshot {
    pub fn new(set: StakeSnapshot, go: StakeSnapshot) -> Self {
        Self { set, go }
    }

    fn from_snapshots(snapshots: EsSnapshots) -> Self {
        Self::new(snapshots.set, snapshots.go)
    }

    /// Parse a ledger state dump. Blocking; see [`LedgerSnapshot::load`].
    pub fn read(path: &Path) -> Result<Self, SnapshotError> {
        let file = File::open(path).map_err(|e| SnapshotError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let root: LedgerRoot =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| SnapshotError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        let snapshots = root
            .into_snapshots()
            .ok_or_else(|| SnapshotError::MissingSnapshots(path.to_path_buf()))?;
        Ok(Self::from_snapshots(snapshots))
    }

    /// Parse a ledger state dump off the async runtime
    pub async fn load(path: &Path) -> Result<Self, SnapshotError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::read(&path)).await?
    }

    /// The stake distribution in force for the evaluated epoch: "set" while it
    /// runs, "go" once it has ended and the snapshots have rotated.
    pub fn stake_view(&self, mode: ReplayMode) -> &StakeSnapshot {
        match mode {
            ReplayMode::Current => &self.set,
            ReplayMode::PreviousEpoch => &self.go,
        }
    }

    /// Stake share of `pool` for the epoch selected by `mode`
    pub fn sigma(&self, pool: &PoolId, mode: ReplayMode) -> Result<RationalNumber, SnapshotError> {
        let view = self.stake_view(mode);
        debug!(
            "Resolving sigma for {pool} ({mode}) over {} credentials",
            view.credential_count()
        );
        calculate_sigma(view, pool)
    }
}

/// Provides the run's ledger snapshot, regenerating it through the node when
/// no usable one was supplied
pub struct SnapshotProvider<'a, Q: NodeQuery + ?Sized> {
    query: &'a Q,
    work_dir: PathBuf,
}

impl<'a, Q: NodeQuery + ?Sized> SnapshotProvider<'a, Q> {
    pub fn new(query: &'a Q, work_dir: &Path) -> Self {
        Self {
            query,
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.work_dir.join(SNAPSHOT_CACHE_FILE)
    }

    /// Load `source` if given and readable, otherwise regenerate.
    ///
    /// Only a failed regeneration is an error.
    pub async fn acquire(&self, source: Option<&Path>) -> Result<LedgerSnapshot, SnapshotError> {
        let Some(path) = source else {
            info!("No ledger state configured, generating a new one");
            return self.regenerate().await;
        };

        info!("Loading ledger state: {}", path.display());
        match LedgerSnapshot::load(path).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!("Could not load ledger state from config ({e}), generating a new one");
                self.regenerate().await
            }
        }
    }

    /// Query a fresh ledger state into the working directory and parse it
    pub async fn regenerate(&self) -> Result<LedgerSnapshot, SnapshotError> {
        let path = self.cache_path();
        self.query.ledger_state(&path).await?;
        let snapshot = LedgerSnapshot::load(&path).await?;
        info!("Generated ledger state {}", path.display());
        Ok(snapshot)
    }
}
