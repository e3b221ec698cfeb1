//! Store value representation
//!
//! A closed mirror of the store's tagged attribute values. Serializes to and
//! from DynamoDB JSON (`{"S": "abc"}`), which is also the wire format used
//! inside pagination cursors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single record or key as returned by the store
pub type Item = BTreeMap<String, AttrValue>;

/// Tagged attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrValue {
    #[serde(rename = "S")]
    S(String),
    /// Numbers stay in their decimal string form to avoid precision loss
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "B")]
    B(#[serde(with = "base64_bytes")] Vec<u8>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "M")]
    M(BTreeMap<String, AttrValue>),
    #[serde(rename = "L")]
    L(Vec<AttrValue>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
    #[serde(rename = "BS")]
    Bs(#[serde(with = "base64_byte_list")] Vec<Vec<u8>>),
    #[serde(rename = "NULL")]
    Null(bool),
    /// Anything the client library reports that is not one of the above
    #[serde(rename = "OTHER")]
    Other(String),
}

impl AttrValue {
    /// String literal
    pub fn string(value: impl Into<String>) -> Self {
        Self::S(value.into())
    }

    /// Short tag name, as used in DynamoDB JSON
    pub fn tag(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::B(_) => "B",
            Self::Bool(_) => "BOOL",
            Self::M(_) => "M",
            Self::L(_) => "L",
            Self::Ss(_) => "SS",
            Self::Ns(_) => "NS",
            Self::Bs(_) => "BS",
            Self::Null(_) => "NULL",
            Self::Other(_) => "OTHER",
        }
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

mod base64_byte_list {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(list: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(list.len()))?;
        for bytes in list {
            seq.serialize_element(&STANDARD.encode(bytes))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
