// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::fmt;

use libsecp256k1::{PublicKey, SecretKey};
use mint_types::address::{format_address, Address};
use mint_types::signature::{public_key_to_address, TicketSignature};
use mint_types::ticket::Ticket;
use tracing::warn;

use crate::error::{SignerConfigError, TicketError};

/// Process-wide ticket signing key. A signer without a key refuses to sign
/// rather than producing an unsigned ticket.
#[derive(Clone)]
pub struct TicketSigner {
    key: Option<(SecretKey, Address)>,
}

impl TicketSigner {
    pub fn new(key: SecretKey) -> Self {
        let address = public_key_to_address(&PublicKey::from_secret_key(&key));
        Self {
            key: Some((key, address)),
        }
    }

    pub fn unconfigured() -> Self {
        Self { key: None }
    }

    /// Parse a hex encoded key, with or without `0x` prefix.
    pub fn from_hex(value: &str) -> Result<Self, SignerConfigError> {
        let value = value.trim();
        let digits = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(digits)?;
        if bytes.len() != libsecp256k1::util::SECRET_KEY_SIZE {
            return Err(SignerConfigError::InvalidLength(bytes.len()));
        }
        let key = SecretKey::parse_slice(&bytes).map_err(SignerConfigError::InvalidKey)?;
        Ok(Self::new(key))
    }

    /// Read the key from environment variable `var`. An unset or empty
    /// variable yields an unconfigured signer; a malformed one is an error.
    pub fn from_env(var: &str) -> Result<Self, SignerConfigError> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Self::from_hex(&value),
            _ => {
                warn!("{var} is not set, tickets cannot be signed");
                Ok(Self::unconfigured())
            }
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.key.as_ref().map(|(_, address)| *address)
    }

    pub fn is_available(&self) -> bool {
        self.key.is_some()
    }

    pub fn sign(&self, ticket: &Ticket) -> Result<TicketSignature, TicketError> {
        let (key, _) = self.key.as_ref().ok_or(TicketError::SignerUnavailable)?;
        Ok(TicketSignature::create(&ticket.signable_digest(), key))
    }
}

impl fmt::Debug for TicketSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TicketSigner")
            .field("address", &self.address().map(|a| format_address(&a)))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use mint_types::address::parse_address;

    use super::*;

    const TEST_KEY: &str = "0x4646464646464646464646464646464646464646464646464646464646464646";

    #[test]
    fn test_from_hex_derives_address() {
        let signer = TicketSigner::from_hex(TEST_KEY).unwrap();
        assert_eq!(
            signer.address(),
            Some(parse_address("0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f").unwrap())
        );
        // Prefix is optional.
        let bare = TicketSigner::from_hex(&TEST_KEY[2..]).unwrap();
        assert_eq!(bare.address(), signer.address());
    }

    #[test]
    fn test_from_hex_rejects_bad_keys() {
        assert!(matches!(
            TicketSigner::from_hex("0x1234"),
            Err(SignerConfigError::InvalidLength(2))
        ));
        assert!(matches!(
            TicketSigner::from_hex("zz"),
            Err(SignerConfigError::InvalidHex(_))
        ));
        assert!(matches!(
            TicketSigner::from_hex(&"00".repeat(32)),
            Err(SignerConfigError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_unconfigured_signer_refuses() {
        let ticket = Ticket::new(Address::zero());
        assert!(matches!(
            TicketSigner::unconfigured().sign(&ticket),
            Err(TicketError::SignerUnavailable)
        ));
    }

    #[test]
    fn test_signature_is_deterministic_and_recoverable() {
        let signer = TicketSigner::from_hex(TEST_KEY).unwrap();
        let ticket = Ticket::new(parse_address("0x331e14e9e312a28c816f630215688f7f5ea593bb").unwrap());
        let first = signer.sign(&ticket).unwrap();
        assert_eq!(first, signer.sign(&ticket).unwrap());
        assert_eq!(Some(ticket.recover_signer(&first).unwrap()), signer.address());
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = TicketSigner::from_hex(TEST_KEY).unwrap();
        let rendered = format!("{signer:?}");
        assert!(!rendered.contains("4646464646"));
        assert!(rendered.contains("0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"));
    }
}
