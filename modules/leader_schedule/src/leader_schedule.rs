//! Leader-log leader schedule module
//! Resolves the inputs of a pool's leader schedule and hands them to the
//! eligibility oracle

use leaderlog_common::{
    calculations::{resolve_first_slot_of_epoch, BoundaryError},
    configuration::{ConfigError, RunConfig},
    genesis_values::{ByronGenesis, GenesisValues, ShelleyGenesis},
    EpochNonce, PoolId, ReplayMode, VrfSigningKey,
};
use leaderlog_module_cardano_cli::{NodeQuery, QueryError};
use leaderlog_module_ledger_snapshot::{SnapshotError, SnapshotProvider};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};

mod oracle;
mod parameters;

pub use oracle::{EligibilityOracle, OracleError, ProcessOracle};
pub use parameters::{
    adjust_decentralisation, assemble, replay_decentralisation_offset, strip_vrf_key_prefix,
    AssembleError, EligibilityParameters, EligibilityParametersBuilder, ScheduleInputs,
    VRF_KEY_PREFIX_LEN,
};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Node query failed: {0}")]
    Query(#[from] QueryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Boundary(#[from] BoundaryError),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Static inputs of a run, read from the configuration before any node query
#[derive(Debug, Clone)]
pub struct RunContext {
    pub pool: PoolId,
    pub vrf_key: VrfSigningKey,
    pub genesis: GenesisValues,
    pub ledger_state: Option<PathBuf>,
    pub libsodium_binary: PathBuf,
    pub work_dir: PathBuf,
}

impl RunContext {
    /// Read the key and genesis files named by `config`
    pub fn prepare(config: &RunConfig, work_dir: &Path) -> Result<Self, ConfigError> {
        let vrf_key = VrfSigningKey::read(&config.vrf_skey)?;
        let shelley = ShelleyGenesis::read(&config.genesis_shelley)?;
        let byron = ByronGenesis::read(&config.genesis_byron)?;
        let genesis =
            GenesisValues::from_genesis(&byron, &shelley, config.shelley_transition_epoch)?;

        Ok(Self {
            pool: PoolId::new(&config.pool_id),
            vrf_key,
            genesis,
            ledger_state: config.ledger_state.clone(),
            libsodium_binary: config.libsodium_binary.clone(),
            work_dir: work_dir.to_path_buf(),
        })
    }
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub parameters: EligibilityParameters,
    /// Oracle output, byte for byte
    pub output: Vec<u8>,
}

/// The input resolution pipeline, over its two external collaborators
pub struct LeaderSchedule<'a> {
    query: &'a dyn NodeQuery,
    oracle: &'a dyn EligibilityOracle,
}

impl<'a> LeaderSchedule<'a> {
    pub fn new(query: &'a dyn NodeQuery, oracle: &'a dyn EligibilityOracle) -> Self {
        Self { query, oracle }
    }

    /// Resolve every input for the epoch selected by `mode` and run the oracle
    pub async fn run(
        &self,
        context: &RunContext,
        nonce: &EpochNonce,
        mode: ReplayMode,
    ) -> Result<ScheduleOutcome, PipelineError> {
        let span = info_span!("leader_schedule", pool = %context.pool, mode = %mode);
        async {
            let parameters = self.resolve(context, nonce, mode).await?;
            let output = self.oracle.evaluate(&parameters).await?;
            Ok(ScheduleOutcome { parameters, output })
        }
        .instrument(span)
        .await
    }

    /// Everything up to, not including, the oracle
    pub async fn resolve(
        &self,
        context: &RunContext,
        nonce: &EpochNonce,
        mode: ReplayMode,
    ) -> Result<EligibilityParameters, PipelineError> {
        info!("Network: {}", context.genesis.network);

        let provider = SnapshotProvider::new(self.query, &context.work_dir);
        let (snapshot, protocol_parameters, tip) = tokio::try_join!(
            async {
                provider
                    .acquire(context.ledger_state.as_deref())
                    .await
                    .map_err(PipelineError::from)
            },
            async { self.query.protocol_parameters().await.map_err(PipelineError::from) },
            async { self.query.tip().await.map_err(PipelineError::from) },
        )?;
        info!("Tip at slot {}", tip.slot);
        if protocol_parameters.decentralisation_param.is_none() {
            warn!("Node reports no decentralisation parameter, using d = 0");
        }

        let first_slot_of_epoch = resolve_first_slot_of_epoch(&context.genesis, tip.slot, mode)?;
        let sigma = snapshot.sigma(&context.pool, mode)?;
        drop(snapshot);

        info!("firstSlotOfEpoch {first_slot_of_epoch}");

        let parameters = assemble(
            ScheduleInputs {
                genesis: &context.genesis,
                protocol_parameters: &protocol_parameters,
                first_slot_of_epoch,
                sigma,
                epoch_nonce: nonce,
                vrf_key: &context.vrf_key,
                libsodium_binary: &context.libsodium_binary,
            },
            mode,
        )?;
        info!("sigma {}", parameters.sigma);
        info!("d {}", parameters.decentralisation);

        Ok(parameters)
    }
}
