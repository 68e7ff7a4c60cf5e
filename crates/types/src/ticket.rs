// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Whitelist tickets and the wire types of the ticket service.
//!
//! A ticket is not secret: it is the subject address plus a fixed label.
//! What authorises a mint is the signature over its digest, which the sale
//! contract checks by recovering the signer address.

use mint_core::hex_string::HexString;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::address::{format_address, Address};
use crate::round::Tier;
use crate::signature::{SignatureError, TicketSignature};

pub type Bytes32 = [u8; 32];

/// Label the sale contract expects to be hashed after the subject address.
pub const TICKET_LABEL: &str = "ticketMessage";

const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Calculate Keccak256 hash digest
pub fn keccak_256(data: &[u8]) -> Bytes32 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Calculate Keccak256 hash digest for multiple values
pub fn multi_keccak_256<I, T>(items: I) -> Bytes32
where
    I: Iterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Keccak256::new();
    for item in items {
        hasher.update(item.as_ref());
    }
    hasher.finalize().into()
}

/// Wrap a 32 byte digest the way `personal_sign` does before signing.
pub fn personal_message_digest(digest: &Bytes32) -> Bytes32 {
    multi_keccak_256([PERSONAL_MESSAGE_PREFIX, digest.as_slice()].into_iter())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub subject: Address,
    pub label: &'static str,
}

impl Ticket {
    pub fn new(subject: Address) -> Self {
        Self {
            subject,
            label: TICKET_LABEL,
        }
    }

    /// Packed encoding of `(address, label)`, as `abi.encodePacked` lays it out.
    pub fn digest(&self) -> Bytes32 {
        multi_keccak_256([self.subject.as_bytes(), self.label.as_bytes()].into_iter())
    }

    /// Digest that actually gets signed.
    pub fn signable_digest(&self) -> Bytes32 {
        personal_message_digest(&self.digest())
    }

    /// Mirrors the contract's acceptance check: the ticket is valid for
    /// `signer` iff this returns `Ok(signer)`.
    pub fn recover_signer(&self, signature: &TicketSignature) -> Result<Address, SignatureError> {
        signature.recover_address(&self.signable_digest())
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_address(&self.subject))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub address: String,
    pub claimed_tier: Tier,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketResponse {
    /// Echo of the submitted address.
    pub ticket: String,
    /// Absent when the address is not eligible for the claimed tier.
    pub signature: Option<HexString>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EligibilityQuery {
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResponse {
    pub is_whitelisted: bool,
    pub tier: Option<Tier>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::parse_address;
    use crate::signature::public_key_to_address;

    fn test_key() -> libsecp256k1::SecretKey {
        libsecp256k1::SecretKey::parse(&[0x46u8; 32]).unwrap()
    }

    #[test]
    fn test_keccak_empty_input() {
        assert_eq!(
            hex::encode(keccak_256(&[])),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_digest_is_packed_address_then_label() {
        let subject = parse_address("0x00000000000000000000000000000000000000aa").unwrap();
        let mut packed = subject.as_bytes().to_vec();
        packed.extend_from_slice(b"ticketMessage");
        assert_eq!(Ticket::new(subject).digest(), keccak_256(&packed));
    }

    #[test]
    fn test_signed_ticket_recovers_signer() {
        let key = test_key();
        let signer = public_key_to_address(&libsecp256k1::PublicKey::from_secret_key(&key));
        let ticket = Ticket::new(parse_address("0x00000000000000000000000000000000000000aa").unwrap());

        let signature = TicketSignature::create(&ticket.signable_digest(), &key);
        assert_eq!(ticket.recover_signer(&signature).unwrap(), signer);
    }

    #[test]
    fn test_signature_does_not_transfer_to_other_subject() {
        let key = test_key();
        let signer = public_key_to_address(&libsecp256k1::PublicKey::from_secret_key(&key));
        let ticket = Ticket::new(parse_address("0x00000000000000000000000000000000000000aa").unwrap());
        let other = Ticket::new(parse_address("0x00000000000000000000000000000000000000bb").unwrap());

        let signature = TicketSignature::create(&ticket.signable_digest(), &key);
        // Recovery either fails or yields an unrelated address.
        if let Ok(recovered) = other.recover_signer(&signature) {
            assert_ne!(recovered, signer);
        }
    }

    #[test]
    fn test_wire_field_names() {
        let request: TicketRequest =
            serde_json::from_str(r#"{"address":"0xaa","claimedTier":2}"#).unwrap();
        assert_eq!(request.claimed_tier, 2);

        let response = EligibilityResponse {
            is_whitelisted: true,
            tier: Some(1),
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"isWhitelisted":true,"tier":1}"#
        );

        let response = TicketResponse {
            ticket: "0xaa".to_string(),
            signature: None,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"ticket":"0xaa","signature":null}"#
        );
    }
}
