// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use mint_types::address::{format_address, parse_address, Address};
use mint_types::round::Tier;
use mint_types::signature::TicketSignature;
use mint_types::ticket::{Ticket, TicketRequest, TicketResponse};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::TicketClientError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTicket {
    pub ticket: Ticket,
    pub signature: TicketSignature,
}

/// Outcome of a ticket request. Ineligibility is an answer, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedTicket {
    Signed(SignedTicket),
    Ineligible,
}

#[async_trait]
pub trait TicketSource: Send + Sync + 'static {
    async fn request_ticket(
        &self,
        account: Address,
        claimed_tier: Tier,
    ) -> Result<IssuedTicket, TicketClientError>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the ticket service.
#[derive(Debug, Clone)]
pub struct TicketClient {
    http: reqwest::Client,
    endpoint: Url,
    expected_signer: Option<Address>,
}

impl TicketClient {
    pub fn new(endpoint: Url, expected_signer: Option<Address>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint,
            expected_signer,
        }
    }
}

#[async_trait]
impl TicketSource for TicketClient {
    async fn request_ticket(
        &self,
        account: Address,
        claimed_tier: Tier,
    ) -> Result<IssuedTicket, TicketClientError> {
        let request = TicketRequest {
            address: format_address(&account),
            claimed_tier,
        };
        debug!("Requesting ticket for {} (tier {claimed_tier})", request.address);
        let res = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let message = match res.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or_default().to_string(),
            };
            return Err(TicketClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let response: TicketResponse = res.json().await?;
        if parse_address(&response.ticket).ok() != Some(account) {
            return Err(TicketClientError::WrongSubject(response.ticket));
        }
        let Some(signature) = response.signature else {
            return Ok(IssuedTicket::Ineligible);
        };

        let signed = SignedTicket {
            ticket: Ticket::new(account),
            signature: TicketSignature::try_from(signature.as_bytes())?,
        };
        let recovered = signed.ticket.recover_signer(&signed.signature)?;
        if let Some(expected) = self.expected_signer {
            if recovered != expected {
                return Err(TicketClientError::WrongSigner {
                    expected: format_address(&expected),
                    recovered: format_address(&recovered),
                });
            }
        }
        Ok(IssuedTicket::Signed(signed))
    }
}

#[cfg(test)]
mod tests {
    use futures::FutureExt;
    use hyper::{Method, StatusCode};
    use libsecp256k1::SecretKey;
    use mint_rpc::{responses::json_response, router::Router, server::RpcServer};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::sync::broadcast;

    use super::*;

    /// Answers every `POST /ticket` with the same status and body.
    #[derive(Clone)]
    struct Canned {
        status: StatusCode,
        body: Value,
    }

    struct TicketStub {
        endpoint: Url,
        _tx_shutdown: broadcast::Sender<()>,
    }

    impl TicketStub {
        async fn start(status: StatusCode, body: Value) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let (tx_shutdown, rx_shutdown) = broadcast::channel(1);
            let router = Router::builder()
                .with_route("/ticket", Method::POST, |canned: Canned, _req| {
                    async move { json_response(canned.status, &canned.body) }.boxed()
                })
                .build();
            let mut server = RpcServer::new(addr, rx_shutdown, Canned { status, body });
            tokio::spawn(async move { server.serve_with_listener(listener, router).await });
            Self {
                endpoint: Url::parse(&format!("http://{addr}/ticket")).unwrap(),
                _tx_shutdown: tx_shutdown,
            }
        }

        fn client(&self, expected_signer: Option<Address>) -> TicketClient {
            TicketClient::new(self.endpoint.clone(), expected_signer)
        }
    }

    fn account() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn signature_for(subject: Address) -> TicketSignature {
        let key = SecretKey::parse(&[0x46u8; 32]).unwrap();
        TicketSignature::create(&Ticket::new(subject).signable_digest(), &key)
    }

    fn issued(subject: Address, signature: &TicketSignature) -> Value {
        json!({
            "ticket": format_address(&subject),
            "signature": format!("0x{}", hex::encode(signature.as_bytes())),
        })
    }

    #[tokio::test]
    async fn test_signed_ticket_checked_against_signer() {
        let signature = signature_for(account());
        let signer = Ticket::new(account()).recover_signer(&signature).unwrap();
        let stub = TicketStub::start(StatusCode::OK, issued(account(), &signature)).await;

        let ticket = stub.client(Some(signer)).request_ticket(account(), 1).await.unwrap();
        assert_eq!(
            ticket,
            IssuedTicket::Signed(SignedTicket {
                ticket: Ticket::new(account()),
                signature,
            })
        );

        let result = stub
            .client(Some(Address::repeat_byte(1)))
            .request_ticket(account(), 1)
            .await;
        assert!(matches!(result, Err(TicketClientError::WrongSigner { .. })));
    }

    #[tokio::test]
    async fn test_missing_signature_is_ineligible() {
        let body = json!({ "ticket": format_address(&account()), "signature": null });
        let stub = TicketStub::start(StatusCode::OK, body).await;
        assert_eq!(
            stub.client(None).request_ticket(account(), 0).await.unwrap(),
            IssuedTicket::Ineligible
        );
    }

    #[tokio::test]
    async fn test_ticket_for_another_account_is_refused() {
        let other = Address::repeat_byte(0xbb);
        let stub = TicketStub::start(StatusCode::OK, issued(other, &signature_for(other))).await;
        match stub.client(None).request_ticket(account(), 1).await {
            Err(TicketClientError::WrongSubject(subject)) => {
                assert_eq!(subject, format_address(&other))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_signature_is_malformed() {
        let body = json!({ "ticket": format_address(&account()), "signature": "0x1234" });
        let stub = TicketStub::start(StatusCode::OK, body).await;
        assert!(matches!(
            stub.client(None).request_ticket(account(), 1).await,
            Err(TicketClientError::InvalidSignature(_))
        ));
    }

    #[tokio::test]
    async fn test_error_status_carries_service_message() {
        let body = json!({ "error": "Eligibility store unavailable" });
        let stub = TicketStub::start(StatusCode::SERVICE_UNAVAILABLE, body).await;
        match stub.client(None).request_ticket(account(), 1).await {
            Err(TicketClientError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Eligibility store unavailable");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
