// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! ECDSA signature wrapper for tickets.
//!
//! Signatures are produced over 32 byte digests and serialized the way
//! `eth_sign` / `personal_sign` do it, so the sale contract can `ecrecover`
//! them directly.

use libsecp256k1::{Message, RecoveryId};
use thiserror::Error;

use crate::address::Address;
use crate::ticket::{keccak_256, Bytes32};

/// Length of a signature in compact form plus one (recovery byte)
pub const SIGNATURE_SIZE: usize = libsecp256k1::util::SIGNATURE_SIZE + 1;

/// Offset Ethereum adds to the recovery id in the V byte.
const V_OFFSET: u8 = 27;

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("secp256k1 error: {0:?}")]
    Secp256k1(libsecp256k1::Error),
    #[error("signature must be {SIGNATURE_SIZE} bytes, got {0}")]
    InvalidLength(usize),
    #[error("signature S value is in the upper half of the curve order")]
    HighS,
}

impl From<libsecp256k1::Error> for SignatureError {
    fn from(value: libsecp256k1::Error) -> Self {
        Self::Secp256k1(value)
    }
}

/// Serialized signature in the compact form with a recovery byte: [ R | S | V ]
/// where V is 27 or 28.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSignature(pub [u8; SIGNATURE_SIZE]);

impl TicketSignature {
    /// Sign 32 byte digest with the provided key. RFC 6979 nonces make the
    /// output deterministic for a given key and digest.
    pub fn create(digest: &Bytes32, signing_key: &libsecp256k1::SecretKey) -> Self {
        let message = Message::parse(digest);
        let (rs, recovery_id) = libsecp256k1::sign(&message, signing_key);
        let mut signature = [0u8; SIGNATURE_SIZE];
        signature[..SIGNATURE_SIZE - 1].copy_from_slice(&rs.serialize());
        signature[SIGNATURE_SIZE - 1] = recovery_id.serialize() + V_OFFSET;
        Self(signature)
    }

    /// Verify signature and recover public key
    pub fn recover_pubkey(
        &self,
        digest: &Bytes32,
    ) -> Result<libsecp256k1::PublicKey, SignatureError> {
        let message = Message::parse(digest);
        let recovery_id = RecoveryId::parse_rpc(self.0[SIGNATURE_SIZE - 1])?;
        let signature =
            libsecp256k1::Signature::parse_standard_slice(&self.0[..SIGNATURE_SIZE - 1])?;
        if signature.s.is_high() {
            // See https://eips.ethereum.org/EIPS/eip-2
            return Err(SignatureError::HighS);
        }
        Ok(libsecp256k1::recover(&message, &signature, &recovery_id)?)
    }

    pub fn recover_address(&self, digest: &Bytes32) -> Result<Address, SignatureError> {
        self.recover_pubkey(digest)
            .map(|public_key| public_key_to_address(&public_key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for TicketSignature {
    type Error = SignatureError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; SIGNATURE_SIZE] = value
            .try_into()
            .map_err(|_| SignatureError::InvalidLength(value.len()))?;
        Ok(Self(bytes))
    }
}

/// Get EVM address from secp256k1 public key
///
/// EVM address is last 20 bytes of keccak(X || Y) where X,Y is the coordinates of the EC point
/// representing public key.
pub fn public_key_to_address(public_key: &libsecp256k1::PublicKey) -> Address {
    // libsecp256k1 adds extra tag so we need to strip it
    let pk_digest = keccak_256(&public_key.serialize()[1..]);
    Address::from_slice(&pk_digest[12..])
}
