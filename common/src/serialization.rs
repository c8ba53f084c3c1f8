//! serde adapters for decimal values in node and genesis JSON

use bigdecimal::BigDecimal;
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_with::DeserializeAs;
use std::str::FromStr;

/// Reads a JSON number or a numeric string into a [`BigDecimal`] without going
/// through a lossy `f32`.
///
/// Use with `#[serde_as(as = "DecimalAs")]` or `#[serde_as(as = "Option<DecimalAs>")]`.
pub struct DecimalAs;

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(serde_json::Number),
    Text(String),
}

impl<'de> DeserializeAs<'de, BigDecimal> for DecimalAs {
    fn deserialize_as<D>(deserializer: D) -> Result<BigDecimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = match DecimalRepr::deserialize(deserializer)? {
            DecimalRepr::Number(n) => n.to_string(),
            DecimalRepr::Text(s) => s,
        };
        BigDecimal::from_str(text.trim())
            .map_err(|e| D::Error::custom(format!("invalid decimal '{text}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Deserialize)]
    struct Holder {
        #[serde_as(as = "DecimalAs")]
        value: BigDecimal,
        #[serde_as(as = "Option<DecimalAs>")]
        #[serde(default)]
        maybe: Option<BigDecimal>,
    }

    #[test]
    fn reads_json_number_exactly() {
        let h: Holder = serde_json::from_str(r#"{"value": 0.05}"#).unwrap();
        assert_eq!(h.value, BigDecimal::from_str("0.05").unwrap());
        assert_eq!(h.value.to_string(), "0.05");
        assert!(h.maybe.is_none());
    }

    #[test]
    fn reads_numeric_string() {
        let h: Holder = serde_json::from_str(r#"{"value": "0.32", "maybe": 1}"#).unwrap();
        assert_eq!(h.value, BigDecimal::from_str("0.32").unwrap());
        assert_eq!(h.maybe, Some(BigDecimal::from(1)));
    }

    #[test]
    fn null_is_none() {
        let h: Holder = serde_json::from_str(r#"{"value": 0, "maybe": null}"#).unwrap();
        assert!(h.maybe.is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Holder>(r#"{"value": "half"}"#).is_err());
    }
}
