//! Voter identity: a normalized `0x`-prefixed wallet address.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RatingsError;

/// A wallet address used as the uniqueness key for votes.
///
/// Always stored lower-cased, so the same wallet typed in different letter
/// case maps to the same voter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    /// The standard prefix for all wallet addresses.
    pub const PREFIX: &'static str = "0x";

    /// Number of hex digits after the prefix (20 bytes).
    pub const HEX_LEN: usize = 40;

    /// Parse and normalize a raw address string.
    pub fn parse(raw: &str) -> Result<Self, RatingsError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let Some(body) = normalized.strip_prefix(Self::PREFIX) else {
            return Err(RatingsError::InvalidAddress(raw.to_string()));
        };
        if body.len() != Self::HEX_LEN || !body.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(RatingsError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Build an address from its 20 raw bytes.
    pub fn from_bytes(bytes: &[u8; 20]) -> Self {
        Self(format!("{}{}", Self::PREFIX, hex::encode(bytes)))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WalletAddress {
    type Err = RatingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for WalletAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
