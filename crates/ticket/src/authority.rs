// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use mint_core::hex_string::HexString;
use mint_types::address::{format_address, parse_address, Address};
use mint_types::ticket::{
    EligibilityResponse, Ticket, TicketRequest, TicketResponse,
};
use tracing::{debug, info};

use crate::eligibility::EligibilityStore;
use crate::error::TicketError;
use crate::signer::TicketSigner;

/// Decides whether a requester gets a signed ticket.
///
/// An address is eligible for a claimed tier when the store holds a record
/// for it and the claimed tier is at least the recorded one. Ineligible
/// requests are answered normally with no signature; nothing is ever signed
/// for an address that failed the check. Issuance holds no state, so
/// repeated or concurrent requests for the same address are harmless.
#[derive(Debug)]
pub struct TicketAuthority<E> {
    signer: Arc<TicketSigner>,
    store: Arc<E>,
}

impl<E> Clone for TicketAuthority<E> {
    fn clone(&self) -> Self {
        Self {
            signer: self.signer.clone(),
            store: self.store.clone(),
        }
    }
}

impl<E: EligibilityStore> TicketAuthority<E> {
    pub fn new(signer: TicketSigner, store: E) -> Self {
        Self {
            signer: Arc::new(signer),
            store: Arc::new(store),
        }
    }

    pub fn signer_address(&self) -> Option<Address> {
        self.signer.address()
    }

    pub async fn issue_ticket(&self, request: TicketRequest) -> Result<TicketResponse, TicketError> {
        let subject = parse_address(&request.address)?;
        // A missing key must not hide behind an ineligible answer.
        if !self.signer.is_available() {
            return Err(TicketError::SignerUnavailable);
        }

        let tier = self.store.lookup_tier(&subject).await?;
        let signature = match tier {
            Some(tier) if request.claimed_tier >= tier => {
                let signature = self.signer.sign(&Ticket::new(subject))?;
                info!(
                    "Issued ticket for {} (tier {tier}, claimed {})",
                    format_address(&subject),
                    request.claimed_tier
                );
                Some(HexString::from(signature.as_bytes()))
            }
            _ => {
                debug!(
                    "{} is not eligible for tier {} (holds {:?})",
                    format_address(&subject),
                    request.claimed_tier,
                    tier
                );
                None
            }
        };

        Ok(TicketResponse {
            ticket: request.address,
            signature,
        })
    }

    pub async fn eligibility(&self, address: &str) -> Result<EligibilityResponse, TicketError> {
        let address = parse_address(address)?;
        let tier = self.store.lookup_tier(&address).await?;
        Ok(EligibilityResponse {
            is_whitelisted: tier.is_some(),
            tier,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mint_types::round::Tier;
    use mint_types::signature::TicketSignature;

    use super::*;
    use crate::eligibility::{EligibilityRecord, InMemoryEligibility};
    use crate::error::EligibilityError;

    const HOLDER: &str = "0x00000000000000000000000000000000000000aa";
    const STRANGER: &str = "0x00000000000000000000000000000000000000bb";

    struct Unreachable;

    #[async_trait]
    impl EligibilityStore for Unreachable {
        async fn lookup_tier(&self, _: &Address) -> Result<Option<Tier>, EligibilityError> {
            Err(EligibilityError::Backend("connection refused".to_string()))
        }
    }

    fn signer() -> TicketSigner {
        TicketSigner::new(libsecp256k1::SecretKey::parse(&[0x46u8; 32]).unwrap())
    }

    fn authority() -> TicketAuthority<InMemoryEligibility> {
        let store = InMemoryEligibility::from_records([EligibilityRecord {
            address: parse_address(HOLDER).unwrap(),
            tier: 2,
        }]);
        TicketAuthority::new(signer(), store)
    }

    fn request(address: &str, claimed_tier: Tier) -> TicketRequest {
        TicketRequest {
            address: address.to_string(),
            claimed_tier,
        }
    }

    #[tokio::test]
    async fn test_tier_gate() {
        let authority = authority();

        let below = authority.issue_ticket(request(HOLDER, 1)).await.unwrap();
        assert_eq!(below.ticket, HOLDER);
        assert_eq!(below.signature, None);

        let exact = authority.issue_ticket(request(HOLDER, 2)).await.unwrap();
        let signature = TicketSignature::try_from(exact.signature.unwrap().as_bytes()).unwrap();
        let ticket = Ticket::new(parse_address(HOLDER).unwrap());
        assert_eq!(
            Some(ticket.recover_signer(&signature).unwrap()),
            authority.signer_address()
        );

        let above = authority.issue_ticket(request(HOLDER, 3)).await.unwrap();
        assert!(above.signature.is_some());
    }

    #[tokio::test]
    async fn test_absent_record_is_ineligible() {
        let response = authority().issue_ticket(request(STRANGER, 5)).await.unwrap();
        assert_eq!(response.signature, None);
    }

    #[tokio::test]
    async fn test_repeated_issuance_is_identical() {
        let authority = authority();
        let (first, second) = tokio::join!(
            authority.issue_ticket(request(HOLDER, 2)),
            authority.issue_ticket(request(HOLDER, 2))
        );
        assert_eq!(first.unwrap(), second.unwrap());
    }

    #[tokio::test]
    async fn test_missing_key_wins_over_ineligibility() {
        let authority = TicketAuthority::new(TicketSigner::unconfigured(), InMemoryEligibility::default());
        assert!(matches!(
            authority.issue_ticket(request(STRANGER, 1)).await,
            Err(TicketError::SignerUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let authority = TicketAuthority::new(signer(), Unreachable);
        assert!(matches!(
            authority.issue_ticket(request(HOLDER, 2)).await,
            Err(TicketError::EligibilityStoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_address() {
        assert!(matches!(
            authority().issue_ticket(request("0xA", 2)).await,
            Err(TicketError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn test_eligibility_read() {
        let authority = authority();
        let holder = authority.eligibility(HOLDER).await.unwrap();
        assert!(holder.is_whitelisted);
        assert_eq!(holder.tier, Some(2));
        let stranger = authority.eligibility(STRANGER).await.unwrap();
        assert!(!stranger.is_whitelisted);
        assert_eq!(stranger.tier, None);
    }
}
