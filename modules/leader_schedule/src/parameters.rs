//! Eligibility parameter assembly

use bigdecimal::BigDecimal;
use leaderlog_common::{
    genesis_values::GenesisValues,
    queries::ProtocolParameters,
    rational_number::{rational_to_decimal, RationalNumber},
    EpochNonce, ReplayMode, VrfSigningKey,
};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Length of the CBOR byte-string header in front of the VRF key hex
pub const VRF_KEY_PREFIX_LEN: usize = 4;

/// Added to `d` when replaying the previous epoch: 0.02
pub fn replay_decentralisation_offset() -> BigDecimal {
    BigDecimal::new(2.into(), 2)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("Missing eligibility parameter: {0}")]
    Missing(&'static str),

    #[error("VRF signing key has fewer than 4 characters")]
    ShortVrfKey,
}

/// `d` as used for the evaluated epoch
pub fn adjust_decentralisation(d: &BigDecimal, mode: ReplayMode) -> BigDecimal {
    match mode {
        ReplayMode::Current => d.clone(),
        ReplayMode::PreviousEpoch => d + replay_decentralisation_offset(),
    }
}

/// Key material handed to the oracle, without its format tag
pub fn strip_vrf_key_prefix(cbor_hex: &str) -> Result<&str, AssembleError> {
    cbor_hex.get(VRF_KEY_PREFIX_LEN..).ok_or(AssembleError::ShortVrfKey)
}

/// Everything the eligibility oracle needs for one epoch
#[derive(Clone, PartialEq)]
pub struct EligibilityParameters {
    pub first_slot_of_epoch: u64,
    pub epoch_nonce: EpochNonce,
    pub pool_vrf_skey: String,
    pub sigma: BigDecimal,
    pub decentralisation: BigDecimal,
    pub epoch_length: u64,
    pub active_slots_coeff: BigDecimal,
    pub libsodium_binary: PathBuf,
}

impl EligibilityParameters {
    pub fn builder() -> EligibilityParametersBuilder {
        EligibilityParametersBuilder::default()
    }

    /// Named arguments in the order the oracle expects
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--first-slot-of-epoch".to_string(),
            self.first_slot_of_epoch.to_string(),
            "--epoch-nonce".to_string(),
            self.epoch_nonce.to_string(),
            "--vrf-skey".to_string(),
            self.pool_vrf_skey.clone(),
            "--sigma".to_string(),
            self.sigma.to_string(),
            "--d".to_string(),
            self.decentralisation.to_string(),
            "--epoch-length".to_string(),
            self.epoch_length.to_string(),
            "--active-slots-coeff".to_string(),
            self.active_slots_coeff.to_string(),
            "--libsodium-binary".to_string(),
            self.libsodium_binary.display().to_string(),
        ]
    }
}

// Keep key material out of logs
impl fmt::Debug for EligibilityParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EligibilityParameters")
            .field("first_slot_of_epoch", &self.first_slot_of_epoch)
            .field("epoch_nonce", &self.epoch_nonce)
            .field("pool_vrf_skey", &"<redacted>")
            .field("sigma", &self.sigma)
            .field("decentralisation", &self.decentralisation)
            .field("epoch_length", &self.epoch_length)
            .field("active_slots_coeff", &self.active_slots_coeff)
            .field("libsodium_binary", &self.libsodium_binary)
            .finish()
    }
}

/// Builder for [`EligibilityParameters`]; every field must be set
#[derive(Default)]
pub struct EligibilityParametersBuilder {
    first_slot_of_epoch: Option<u64>,
    epoch_nonce: Option<EpochNonce>,
    pool_vrf_skey: Option<String>,
    sigma: Option<BigDecimal>,
    decentralisation: Option<BigDecimal>,
    epoch_length: Option<u64>,
    active_slots_coeff: Option<BigDecimal>,
    libsodium_binary: Option<PathBuf>,
}

impl EligibilityParametersBuilder {
    pub fn first_slot_of_epoch(mut self, slot: u64) -> Self {
        self.first_slot_of_epoch = Some(slot);
        self
    }

    pub fn epoch_nonce(mut self, nonce: EpochNonce) -> Self {
        self.epoch_nonce = Some(nonce);
        self
    }

    pub fn pool_vrf_skey(mut self, key: &str) -> Self {
        self.pool_vrf_skey = Some(key.to_string());
        self
    }

    pub fn sigma(mut self, sigma: BigDecimal) -> Self {
        self.sigma = Some(sigma);
        self
    }

    pub fn decentralisation(mut self, d: BigDecimal) -> Self {
        self.decentralisation = Some(d);
        self
    }

    pub fn epoch_length(mut self, length: u64) -> Self {
        self.epoch_length = Some(length);
        self
    }

    pub fn active_slots_coeff(mut self, coeff: BigDecimal) -> Self {
        self.active_slots_coeff = Some(coeff);
        self
    }

    pub fn libsodium_binary(mut self, path: &Path) -> Self {
        self.libsodium_binary = Some(path.to_path_buf());
        self
    }

    pub fn build(self) -> Result<EligibilityParameters, AssembleError> {
        Ok(EligibilityParameters {
            first_slot_of_epoch: self
                .first_slot_of_epoch
                .ok_or(AssembleError::Missing("first slot of epoch"))?,
            epoch_nonce: self.epoch_nonce.ok_or(AssembleError::Missing("epoch nonce"))?,
            pool_vrf_skey: self.pool_vrf_skey.ok_or(AssembleError::Missing("pool VRF key"))?,
            sigma: self.sigma.ok_or(AssembleError::Missing("sigma"))?,
            decentralisation: self
                .decentralisation
                .ok_or(AssembleError::Missing("decentralisation parameter"))?,
            epoch_length: self.epoch_length.ok_or(AssembleError::Missing("epoch length"))?,
            active_slots_coeff: self
                .active_slots_coeff
                .ok_or(AssembleError::Missing("active slots coefficient"))?,
            libsodium_binary: self
                .libsodium_binary
                .ok_or(AssembleError::Missing("libsodium binary"))?,
        })
    }
}

/// Resolved inputs for one run
pub struct ScheduleInputs<'a> {
    pub genesis: &'a GenesisValues,
    pub protocol_parameters: &'a ProtocolParameters,
    pub first_slot_of_epoch: u64,
    pub sigma: RationalNumber,
    pub epoch_nonce: &'a EpochNonce,
    pub vrf_key: &'a VrfSigningKey,
    pub libsodium_binary: &'a Path,
}

/// Combine the resolved inputs, applying the replay adjustment to `d`
pub fn assemble(
    inputs: ScheduleInputs<'_>,
    mode: ReplayMode,
) -> Result<EligibilityParameters, AssembleError> {
    let d = adjust_decentralisation(&inputs.protocol_parameters.decentralisation(), mode);

    EligibilityParameters::builder()
        .first_slot_of_epoch(inputs.first_slot_of_epoch)
        .epoch_nonce(inputs.epoch_nonce.clone())
        .pool_vrf_skey(strip_vrf_key_prefix(inputs.vrf_key.cbor_hex())?)
        .sigma(rational_to_decimal(&inputs.sigma))
        .decentralisation(d)
        .epoch_length(inputs.genesis.shelley_epoch_len)
        .active_slots_coeff(inputs.genesis.active_slots_coeff.clone())
        .libsodium_binary(inputs.libsodium_binary)
        .build()
}
