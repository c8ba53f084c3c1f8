use crate::{
    calculations::{epoch_to_first_slot_with_shelley_params, slot_to_epoch_with_shelley_params},
    configuration::ConfigError,
    serialization::DecimalAs,
    NetworkMagic, MAINNET_MAGIC,
};
use bigdecimal::BigDecimal;
use serde::{de::DeserializeOwned, Deserialize};
use serde_with::serde_as;
use std::path::Path;

/// Byron epochs are `10 * k` slots long
const BYRON_EPOCH_LENGTH_FACTOR: u64 = 10;

/// First Shelley epoch of the public networks, by network magic
const KNOWN_TRANSITION_EPOCHS: [(u32, u64); 4] = [
    (MAINNET_MAGIC, 208),
    (1097911063, 74), // legacy testnet
    (1, 4),           // preprod
    (2, 0),           // preview
];

/// The subset of the Shelley genesis file used here
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShelleyGenesis {
    pub network_id: String,
    pub network_magic: u32,
    pub epoch_length: u64,
    #[serde_as(as = "DecimalAs")]
    pub active_slots_coeff: BigDecimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ByronProtocolConsts {
    pub k: u64,
}

/// The subset of the Byron genesis file used here
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByronGenesis {
    pub protocol_consts: ByronProtocolConsts,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

impl ShelleyGenesis {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    pub fn network(&self) -> NetworkMagic {
        NetworkMagic::from_network_id(&self.network_id, self.network_magic)
    }
}

impl ByronGenesis {
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        read_json(path)
    }

    pub fn epoch_length(&self) -> u64 {
        BYRON_EPOCH_LENGTH_FACTOR * self.protocol_consts.k
    }
}

/// Chain timing values derived from both genesis files
#[derive(Debug, Clone, PartialEq)]
pub struct GenesisValues {
    pub network: NetworkMagic,
    pub byron_epoch_len: u64,
    pub shelley_epoch: u64,
    pub shelley_epoch_len: u64,
    pub active_slots_coeff: BigDecimal,
}

impl GenesisValues {
    /// Combine the genesis files. `transition_epoch` overrides the built-in
    /// table of first Shelley epochs.
    pub fn from_genesis(
        byron: &ByronGenesis,
        shelley: &ShelleyGenesis,
        transition_epoch: Option<u64>,
    ) -> Result<Self, ConfigError> {
        let network = shelley.network();
        let shelley_epoch = match transition_epoch {
            Some(epoch) => epoch,
            None => KNOWN_TRANSITION_EPOCHS
                .iter()
                .find(|(magic, _)| *magic == network.magic())
                .map(|(_, epoch)| *epoch)
                .ok_or(ConfigError::UnknownTransitionEpoch(network.magic()))?,
        };

        if shelley.epoch_length == 0 || byron.epoch_length() == 0 {
            return Err(ConfigError::Invalid("genesis epoch length is zero".to_string()));
        }

        Ok(Self {
            network,
            byron_epoch_len: byron.epoch_length(),
            shelley_epoch,
            shelley_epoch_len: shelley.epoch_length,
            active_slots_coeff: shelley.active_slots_coeff.clone(),
        })
    }

    pub fn shelley_start_slot(&self) -> u64 {
        self.shelley_epoch * self.byron_epoch_len
    }

    pub fn slot_to_epoch(&self, slot: u64) -> u64 {
        slot_to_epoch_with_shelley_params(
            slot,
            self.byron_epoch_len,
            self.shelley_epoch,
            self.shelley_epoch_len,
        )
    }

    pub fn epoch_to_first_slot(&self, epoch: u64) -> u64 {
        epoch_to_first_slot_with_shelley_params(
            epoch,
            self.byron_epoch_len,
            self.shelley_epoch,
            self.shelley_epoch_len,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const SHELLEY_MAINNET: &str = r#"{
        "activeSlotsCoeff": 0.05,
        "protocolParams": {"decentralisationParam": 1},
        "networkId": "Mainnet",
        "networkMagic": 764824073,
        "epochLength": 432000,
        "slotLength": 1,
        "securityParam": 2160
    }"#;

    const BYRON_MAINNET: &str = r#"{
        "protocolConsts": {"k": 2160, "protocolMagic": 764824073},
        "startTime": 1506203091
    }"#;

    fn mainnet() -> GenesisValues {
        let shelley: ShelleyGenesis = serde_json::from_str(SHELLEY_MAINNET).unwrap();
        let byron: ByronGenesis = serde_json::from_str(BYRON_MAINNET).unwrap();
        GenesisValues::from_genesis(&byron, &shelley, None).unwrap()
    }

    #[test]
    fn mainnet_values() {
        let genesis = mainnet();
        assert_eq!(genesis.network, NetworkMagic::Mainnet);
        assert_eq!(genesis.byron_epoch_len, 21_600);
        assert_eq!(genesis.shelley_epoch, 208);
        assert_eq!(genesis.shelley_start_slot(), 4_492_800);
        assert_eq!(genesis.active_slots_coeff, BigDecimal::from_str("0.05").unwrap());
    }

    #[test]
    fn mainnet_epochs() {
        let genesis = mainnet();
        assert_eq!(genesis.slot_to_epoch(98_272_003), 425);
        assert_eq!(genesis.epoch_to_first_slot(425), 98_236_800);
    }

    #[test]
    fn unknown_testnet_needs_override() {
        let text = SHELLEY_MAINNET
            .replace("\"Mainnet\"", "\"Testnet\"")
            .replace("764824073", "42");
        let shelley: ShelleyGenesis = serde_json::from_str(&text).unwrap();
        let byron: ByronGenesis = serde_json::from_str(BYRON_MAINNET).unwrap();

        assert!(matches!(
            GenesisValues::from_genesis(&byron, &shelley, None),
            Err(ConfigError::UnknownTransitionEpoch(42))
        ));

        let genesis = GenesisValues::from_genesis(&byron, &shelley, Some(3)).unwrap();
        assert_eq!(genesis.network, NetworkMagic::Testnet(42));
        assert_eq!(genesis.shelley_start_slot(), 64_800);
    }

    #[test]
    fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shelley-genesis.json");
        std::fs::write(&path, SHELLEY_MAINNET).unwrap();
        assert_eq!(ShelleyGenesis::read(&path).unwrap().epoch_length, 432_000);

        assert!(matches!(
            ByronGenesis::read(&dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
