// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! `0x`-prefixed hex strings, as exchanged with wallets and the ticket service.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum HexStringError {
    #[error("Hex string is missing '0x' prefix")]
    MissingPrefix,
    #[error("Hex string is malformed: {0}")]
    Malformed(#[from] hex::FromHexError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexString(pub Vec<u8>);

impl HexString {
    /// Parse a `0x`-prefixed hex string. Both letter cases are accepted.
    pub fn parse(value: &str) -> Result<Self, HexStringError> {
        let digits = value
            .strip_prefix("0x")
            .or_else(|| value.strip_prefix("0X"))
            .ok_or(HexStringError::MissingPrefix)?;
        Ok(Self(hex::decode(digits)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HexString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<&[u8]> for HexString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl Serialize for HexString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HexString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: String = Deserialize::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::{HexString, HexStringError};

    #[test]
    fn parse_accepts_mixed_case() {
        let parsed = HexString::parse("0xDeadBEEF").unwrap();
        assert_eq!(parsed.0, vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(parsed.to_string(), "0xdeadbeef");
    }

    #[test]
    fn deserialize_rejects_missing_prefix() {
        let err = serde_json::from_str::<HexString>("\"deadbeef\"").unwrap_err();
        assert!(err.to_string().contains("missing '0x' prefix"));
        assert_eq!(
            HexString::parse("deadbeef"),
            Err(HexStringError::MissingPrefix)
        );
    }
}
