//! Key material and signatures carried by voters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::RatingsError;

/// Ed25519 verifying key. A voter's address is derived from it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(pub [u8; 32]);

/// Ed25519 signing seed. Not `Debug`, `Clone` or `Serialize`; the bytes are
/// wiped on drop and only leave memory encrypted inside a keystore.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey(pub [u8; 32]);

/// An opaque signed-message artifact.
///
/// The length depends on the wallet that produced it; storage keeps the
/// bytes as-is and renders them as `0x`-prefixed hex.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature(pub Vec<u8>);

impl Signature {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Signature {
    type Err = RatingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix("0x").unwrap_or(s);
        hex::decode(body)
            .map(Signature)
            .map_err(|e| RatingsError::InvalidSignature(e.to_string()))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Built by the `ratings_crypto` key constructors.
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_hex_display() {
        let sig = Signature(vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(sig.to_string(), "0xdeadbeef");
    }

    #[test]
    fn signature_parses_with_or_without_prefix() {
        let a: Signature = "0xdeadbeef".parse().unwrap();
        let b: Signature = "deadbeef".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn signature_rejects_bad_hex() {
        assert!("0xnothex".parse::<Signature>().is_err());
    }

    #[test]
    fn signature_json_is_hex_string() {
        let sig = Signature(vec![1, 2, 3]);
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, "\"0x010203\"");
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
