//! Results of node queries

use crate::serialization::DecimalAs;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_with::serde_as;

/// Protocol parameters, as reported by the live query.
///
/// Only the decentralisation parameter is needed; it is absent from eras
/// after Alonzo.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProtocolParameters {
    #[serde_as(as = "Option<DecimalAs>")]
    #[serde(rename = "decentralisationParam", alias = "decentralization", default)]
    pub decentralisation_param: Option<BigDecimal>,
}

impl ProtocolParameters {
    /// Reported `d`, or zero when the node no longer reports it
    pub fn decentralisation(&self) -> BigDecimal {
        self.decentralisation_param.clone().unwrap_or_else(|| BigDecimal::from(0))
    }
}

/// Chain tip
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainTip {
    #[serde(alias = "slotNo")]
    pub slot: u64,
    #[serde(default)]
    pub epoch: Option<u64>,
    #[serde(alias = "blockNo", default)]
    pub block: Option<u64>,
    #[serde(alias = "headerHash", default)]
    pub hash: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn shelley_protocol_parameters() {
        let params: ProtocolParameters = serde_json::from_str(
            r#"{"decentralisationParam": 0.32, "eMax": 18, "minFeeA": 44}"#,
        )
        .unwrap();
        assert_eq!(params.decentralisation(), BigDecimal::from_str("0.32").unwrap());
    }

    #[test]
    fn newer_key_name() {
        let params: ProtocolParameters =
            serde_json::from_str(r#"{"decentralization": 0}"#).unwrap();
        assert_eq!(params.decentralisation(), BigDecimal::from(0));
    }

    #[test]
    fn absent_or_null_is_zero() {
        let params: ProtocolParameters =
            serde_json::from_str(r#"{"decentralization": null}"#).unwrap();
        assert!(params.decentralisation_param.is_none());
        assert_eq!(params.decentralisation(), BigDecimal::from(0));

        let params: ProtocolParameters = serde_json::from_str(r#"{"maxTxSize": 16384}"#).unwrap();
        assert_eq!(params.decentralisation(), BigDecimal::from(0));
    }

    #[test]
    fn legacy_tip() {
        let tip: ChainTip = serde_json::from_str(
            r#"{"blockNo": 4937331, "headerHash": "ab", "slotNo": 16826211}"#,
        )
        .unwrap();
        assert_eq!(tip.slot, 16_826_211);
        assert_eq!(tip.block, Some(4_937_331));
        assert_eq!(tip.epoch, None);
    }

    #[test]
    fn current_tip() {
        let tip: ChainTip = serde_json::from_str(
            r#"{"block": 9000000, "epoch": 425, "era": "Babbage", "hash": "cd", "slot": 98272003, "syncProgress": "100.00"}"#,
        )
        .unwrap();
        assert_eq!(tip.slot, 98_272_003);
        assert_eq!(tip.epoch, Some(425));
    }
}
