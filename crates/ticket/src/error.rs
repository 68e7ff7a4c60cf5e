// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::time::Duration;

use hyper::StatusCode;
use mint_rpc::handlers::HttpError;
use mint_types::address::AddressError;

#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    #[error("Ticket signer is not configured")]
    SignerUnavailable,
    #[error("Eligibility store unavailable: {0}")]
    EligibilityStoreUnavailable(#[from] EligibilityError),
    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
}

impl HttpError for TicketError {
    fn status_code(&self) -> StatusCode {
        match self {
            TicketError::SignerUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
            TicketError::EligibilityStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            TicketError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EligibilityError {
    #[error("Cannot read eligibility records: {0}")]
    Io(#[from] std::io::Error),
    #[error("Eligibility records are not a JSON object of address to tier: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Eligibility record for {address} has an invalid address: {source}")]
    InvalidRecord {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("Eligibility lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("Eligibility backend error: {0}")]
    Backend(String),
}

/// Start-up errors for the signing key.
#[derive(Debug, thiserror::Error)]
pub enum SignerConfigError {
    #[error("Signer key is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Signer key must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Signer key is not a valid secp256k1 secret: {0:?}")]
    InvalidKey(libsecp256k1::Error),
}
