//! Core type definitions for leader-log

use crate::configuration::ConfigError;
use serde::Deserialize;
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// Network magic of Cardano mainnet
pub const MAINNET_MAGIC: u32 = 764824073;

/// Which epoch a run evaluates.
///
/// Passed by value to every stage that depends on it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// The epoch the chain tip is in
    #[default]
    Current,

    /// The epoch that just ended, re-evaluated with its now-final nonce
    PreviousEpoch,
}

impl ReplayMode {
    pub fn is_replay(self) -> bool {
        matches!(self, ReplayMode::PreviousEpoch)
    }
}

impl From<bool> for ReplayMode {
    fn from(replay: bool) -> Self {
        if replay {
            ReplayMode::PreviousEpoch
        } else {
            ReplayMode::Current
        }
    }
}

impl Display for ReplayMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ReplayMode::Current => write!(f, "current"),
            ReplayMode::PreviousEpoch => write!(f, "previous-epoch"),
        }
    }
}

/// Network selector handed to every node query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkMagic {
    Mainnet,
    Testnet(u32),
}

impl NetworkMagic {
    /// Derive from the Shelley genesis `networkId` / `networkMagic` pair
    pub fn from_network_id(network_id: &str, network_magic: u32) -> Self {
        if network_id == "Testnet" {
            NetworkMagic::Testnet(network_magic)
        } else {
            NetworkMagic::Mainnet
        }
    }

    pub fn magic(&self) -> u32 {
        match self {
            NetworkMagic::Mainnet => MAINNET_MAGIC,
            NetworkMagic::Testnet(magic) => *magic,
        }
    }

    /// Arguments selecting this network on the query tool's command line
    pub fn cli_args(&self) -> Vec<String> {
        match self {
            NetworkMagic::Mainnet => vec!["--mainnet".to_string()],
            NetworkMagic::Testnet(magic) => {
                vec!["--testnet-magic".to_string(), magic.to_string()]
            }
        }
    }
}

impl Display for NetworkMagic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cli_args().join(" "))
    }
}

/// Stake pool identifier, as it appears in the ledger state (hex key hash)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolId(String);

impl PoolId {
    pub fn new(id: &str) -> Self {
        Self(id.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against an id read from a ledger dump
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Display for PoolId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Epoch nonce, passed through to the oracle untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochNonce(String);

impl EpochNonce {
    pub fn new(nonce: &str) -> Result<Self, ConfigError> {
        let nonce = nonce.trim();
        if nonce.is_empty() {
            return Err(ConfigError::Invalid("epoch nonce is empty".to_string()));
        }
        Ok(Self(nonce.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for EpochNonce {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextEnvelope {
    cbor_hex: String,
}

/// VRF signing key, held as the hex of its CBOR encoding
#[derive(Clone, PartialEq, Eq)]
pub struct VrfSigningKey {
    cbor_hex: String,
}

impl VrfSigningKey {
    pub fn from_cbor_hex(cbor_hex: &str) -> Result<Self, ConfigError> {
        let cbor_hex = cbor_hex.trim();
        hex::decode(cbor_hex)
            .map_err(|e| ConfigError::Invalid(format!("VRF signing key is not hex: {e}")))?;
        Ok(Self {
            cbor_hex: cbor_hex.to_string(),
        })
    }

    /// Read a key file in the node's JSON text-envelope format
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let envelope: TextEnvelope =
            serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_cbor_hex(&envelope.cbor_hex)
    }

    pub fn cbor_hex(&self) -> &str {
        &self.cbor_hex
    }
}

// Keep key material out of logs
impl fmt::Debug for VrfSigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "VrfSigningKey(<{} hex chars>)", self.cbor_hex.len())
    }
}
