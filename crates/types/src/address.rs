// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use primitive_types::H160;

/// 20-byte EVM account address.
pub type Address = H160;

const ADDRESS_SIZE: usize = 20;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AddressError {
    #[error("Address is missing '0x' prefix")]
    MissingPrefix,
    #[error("Address is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Address must be {ADDRESS_SIZE} bytes long, got {0}")]
    InvalidLength(usize),
}

/// Parse a `0x`-prefixed address. Checksummed (mixed case) input is accepted
/// but the checksum is not enforced.
pub fn parse_address(value: &str) -> Result<Address, AddressError> {
    let digits = value
        .trim()
        .strip_prefix("0x")
        .or_else(|| value.trim().strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    let bytes = hex::decode(digits)?;
    if bytes.len() != ADDRESS_SIZE {
        return Err(AddressError::InvalidLength(bytes.len()));
    }
    Ok(Address::from_slice(&bytes))
}

/// Lowercase `0x`-prefixed rendering. `H160`'s `Display` elides the middle
/// of the address, which is not what we want in logs or on the wire.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format() {
        let raw = "0x331e14E9e312A28C816F630215688f7f5eA593Bb";
        let address = parse_address(raw).unwrap();
        assert_eq!(format_address(&address), raw.to_lowercase());
    }

    #[test]
    fn parse_rejects_malformed_input() {
        assert_eq!(
            parse_address("331e14e9e312a28c816f630215688f7f5ea593bb"),
            Err(AddressError::MissingPrefix)
        );
        assert_eq!(parse_address("0x1234"), Err(AddressError::InvalidLength(2)));
        assert!(matches!(
            parse_address("0xzz1e14e9e312a28c816f630215688f7f5ea593bb"),
            Err(AddressError::InvalidHex(_))
        ));
    }
}
