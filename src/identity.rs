//! Identities known to the trust graph.
//!
//! An [`Identity`] is an opaque byte string. On the wire (URL paths, JSON
//! bodies, bootstrap files) identities are base58-encoded; internally they are
//! raw bytes. Signers of actions must additionally decode to a 32-byte Ed25519
//! public key, but that constraint is enforced at signature-verification time:
//! graph nodes, role entries, and genesis users stay opaque so that a vouchee
//! that never signs anything needs no well-formed key.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// An opaque identity: raw bytes internally, base58 at the wire.
///
/// Ordered and hashable so stores can keep identities in deterministic
/// collections.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identity(Vec<u8>);

impl Identity {
    /// Wraps raw identity bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Encodes the identity as base58.
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl From<[u8; 32]> for Identity {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes.to_vec())
    }
}

/// Error parsing a base58 identity from its wire form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid base58 identity: {0}")]
pub struct IdentityParseError(bs58::decode::Error);

impl FromStr for Identity {
    type Err = IdentityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec().map_err(IdentityParseError)?;
        Ok(Self(bytes))
    }
}

impl Display for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Debug for Identity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Identity(")?;
        f.write_str(&self.to_base58())?;
        f.write_str(")")
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_roundtrip() {
        let identity = Identity::new(vec![1, 2, 3, 255]);
        let encoded = identity.to_base58();
        let decoded: Identity = encoded.parse().unwrap();
        assert_eq!(identity, decoded);
    }

    #[test]
    fn wire_form_is_a_json_string() {
        let identity = Identity::from([7u8; 32]);
        let json = serde_json::to_string(&identity).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(identity, back);
        assert!(json.starts_with('"'));
    }

    #[test]
    fn rejects_non_base58_input() {
        // '0' and 'l' are not in the base58 alphabet.
        assert!("0l".parse::<Identity>().is_err());
    }

    #[test]
    fn ordering_is_stable_on_bytes() {
        let a = Identity::new(vec![1]);
        let b = Identity::new(vec![2]);
        assert!(a < b);
    }
}
