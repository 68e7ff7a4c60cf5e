// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::time::Duration;

use mint_types::signature::SignatureError;

use crate::mint::MintRejection;

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Http provider error: {0}")]
    Provider(String),
    #[error("Contract call {method} failed: {reason}")]
    Call { method: &'static str, reason: String },
    #[error("Contract call {method} returned an unexpected value: {reason}")]
    Decode { method: &'static str, reason: String },
    #[error("Mint transaction {0} reverted")]
    Reverted(String),
    #[error("Mint transaction was dropped from the mempool")]
    Dropped,
}

#[derive(Debug, thiserror::Error)]
pub enum TicketClientError {
    #[error("Ticket request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Ticket service answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Ticket signature is malformed: {0}")]
    InvalidSignature(#[from] SignatureError),
    #[error("Ticket service returned a ticket for {0} instead of the requested account")]
    WrongSubject(String),
    #[error("Ticket is signed by {recovered} but the sale expects {expected}")]
    WrongSigner { expected: String, recovered: String },
}

/// Failures of the services the storefront depends on. Always recoverable:
/// the next refresh tries again.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    TicketService(#[from] TicketClientError),
    #[error("{call} did not answer within {after:?}")]
    Timeout { call: &'static str, after: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum StorefrontError {
    #[error("Invalid storefront configuration: {0}")]
    Configuration(String),
    #[error("Change network to {name}.")]
    WrongNetwork { name: String, expected: u64, actual: u64 },
    #[error("Upstream unavailable: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("Sale state expired at {boundary} before it could be used (now {now})")]
    StaleRound { boundary: u64, now: u64 },
    #[error("The sale contract rejects the ticket issued for {0}")]
    TicketRejected(String),
    #[error("Mint refused: {0}")]
    MintRejected(#[from] MintRejection),
    #[error("Sale poller is not running")]
    PollerStopped,
}

impl StorefrontError {
    /// Whether retrying later can succeed without operator action.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StorefrontError::Upstream(_) | StorefrontError::StaleRound { .. }
        )
    }
}

impl From<ChainError> for StorefrontError {
    fn from(e: ChainError) -> Self {
        StorefrontError::Upstream(e.into())
    }
}

impl From<TicketClientError> for StorefrontError {
    fn from(e: TicketClientError) -> Self {
        StorefrontError::Upstream(e.into())
    }
}

/// Bound `fut` by `after`, folding both failure kinds into [UpstreamError].
pub(crate) async fn bounded<T, E, F>(
    call: &'static str,
    after: Duration,
    fut: F,
) -> Result<T, UpstreamError>
where
    E: Into<UpstreamError>,
    F: std::future::Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(UpstreamError::Timeout { call, after }),
    }
}
