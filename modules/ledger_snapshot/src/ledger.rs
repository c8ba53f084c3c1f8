// ================================================================================================
// Ledger state JSON model - stake snapshots only
// ================================================================================================

use serde::{
    de::{MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// Top level of a ledger state dump.
///
/// Node releases wrap the epoch state as `nesEs` or `stateBefore`; a bare
/// epoch state is accepted too.
#[derive(Debug, Deserialize)]
pub(crate) struct LedgerRoot {
    #[serde(rename = "nesEs", alias = "stateBefore", default)]
    pub epoch_state: Option<EpochState>,
    #[serde(rename = "esSnapshots", default)]
    pub es_snapshots: Option<EsSnapshots>,
}

impl LedgerRoot {
    pub fn into_snapshots(self) -> Option<EsSnapshots> {
        self.epoch_state.and_then(|es| es.es_snapshots).or(self.es_snapshots)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EpochState {
    #[serde(rename = "esSnapshots", default)]
    pub es_snapshots: Option<EsSnapshots>,
}

/// The rotating stake snapshots. Mark is not used for leader election
/// until two epochs later, so it is not read.
#[derive(Debug, Deserialize)]
pub(crate) struct EsSnapshots {
    #[serde(rename = "_pstakeSet", alias = "pstakeSet")]
    pub set: StakeSnapshot,
    #[serde(rename = "_pstakeGo", alias = "pstakeGo")]
    pub go: StakeSnapshot,
}

/// One stake distribution: credential -> lovelace, credential -> pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StakeSnapshot {
    #[serde(rename = "_stake", alias = "stake")]
    pub(crate) stake: CredentialMap<u64>,
    #[serde(rename = "_delegations", alias = "delegations")]
    pub(crate) delegations: CredentialMap<String>,
}

impl StakeSnapshot {
    pub fn new(stake: Vec<(String, u64)>, delegations: Vec<(String, String)>) -> Self {
        Self {
            stake: CredentialMap(stake.into_iter().collect()),
            delegations: CredentialMap(delegations.into_iter().collect()),
        }
    }

    pub fn credential_count(&self) -> usize {
        self.stake.0.len()
    }
}

/// Stake credential as written by the node
#[derive(Deserialize)]
#[serde(untagged)]
enum Credential {
    Text(String),
    KeyHash {
        #[serde(rename = "key hash")]
        key_hash: String,
    },
    ScriptHash {
        #[serde(rename = "script hash")]
        script_hash: String,
    },
}

impl Credential {
    /// Same spelling as the object keys of newer dumps
    fn into_key(self) -> String {
        match self {
            Credential::Text(text) => text,
            Credential::KeyHash { key_hash } => format!("keyHash-{key_hash}"),
            Credential::ScriptHash { script_hash } => format!("scriptHash-{script_hash}"),
        }
    }
}

/// Map keyed by stake credential, from either a JSON object or a list of
/// `[credential, value]` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CredentialMap<V>(pub HashMap<String, V>);

impl<V> Default for CredentialMap<V> {
    fn default() -> Self {
        Self(HashMap::new())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for CredentialMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CredentialMapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for CredentialMapVisitor<V> {
            type Value = CredentialMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a credential map or a list of [credential, value] pairs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.insert(key, value);
                }
                Ok(CredentialMap(map))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((credential, value)) = access.next_element::<(Credential, V)>()? {
                    map.insert(credential.into_key(), value);
                }
                Ok(CredentialMap(map))
            }
        }

        deserializer.deserialize_any(CredentialMapVisitor(PhantomData))
    }
}
