// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Static storefront configuration, loaded once at start-up.
//!
//! Keys follow the storefront's `config.json` convention (upper snake case).
//! Rounds can either be listed under `ROUNDS` or read from the contract,
//! in which case `ROUND_COUNT` says how many to read.

use std::time::Duration;

use mint_types::address::{parse_address, Address};
use mint_types::round::{u256_dec, RoundConfig, SaleSchedule};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StorefrontError;

/// Name of the section holding [StorefrontConfig] in the node configuration file.
pub const STOREFRONT_CONFIG_SECTION: &str = "storefront";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct NetworkConfig {
    pub name: String,
    pub symbol: String,
    pub id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct PollerConfig {
    /// Countdown tick.
    pub tick_ms: u64,
    /// Full refresh of supply and price.
    pub refresh_interval_ms: u64,
    /// Bound on every read from the chain or the ticket service.
    pub call_timeout_ms: u64,
    /// Bound on a mint, from submission to receipt.
    pub mint_timeout_ms: u64,
}

impl PollerConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn mint_timeout(&self) -> Duration {
        Duration::from_millis(self.mint_timeout_ms)
    }

    /// Every period and bound must be positive.
    pub fn validate(&self) -> Result<(), StorefrontError> {
        [
            ("POLLER.TICK_MS", self.tick_ms),
            ("POLLER.REFRESH_INTERVAL_MS", self.refresh_interval_ms),
            ("POLLER.CALL_TIMEOUT_MS", self.call_timeout_ms),
            ("POLLER.MINT_TIMEOUT_MS", self.mint_timeout_ms),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0)
        .map_or(Ok(()), |(key, _)| Err(invalid(key, "must be positive")))
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            refresh_interval_ms: 10_000,
            call_timeout_ms: 5_000,
            mint_timeout_ms: 120_000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct StorefrontConfig {
    pub contract_address: String,
    pub scan_link: String,
    pub network: NetworkConfig,
    pub nft_name: String,
    pub symbol: String,
    pub max_supply: u64,
    #[serde(with = "u256_dec")]
    pub wei_cost: U256,
    pub display_cost: f64,
    /// Gas limit for a single token; scaled by the mint amount.
    pub gas_limit: u64,
    pub marketplace: String,
    pub marketplace_link: String,
    pub rpc_url: String,
    /// Full URL of the ticket issuance endpoint.
    pub ticket_endpoint: String,
    /// Expected ticket signer. Issued tickets are checked against it when set.
    pub ticket_signer: Option<String>,
    pub rounds: Option<Vec<RoundConfig>>,
    pub round_count: Option<u32>,
    pub poller: PollerConfig,
}

fn invalid(key: &str, e: impl std::fmt::Display) -> StorefrontError {
    StorefrontError::Configuration(format!("{key}: {e}"))
}

impl StorefrontConfig {
    pub fn contract_address(&self) -> Result<Address, StorefrontError> {
        parse_address(&self.contract_address).map_err(|e| invalid("CONTRACT_ADDRESS", e))
    }

    pub fn rpc_url(&self) -> Result<Url, StorefrontError> {
        Url::parse(&self.rpc_url).map_err(|e| invalid("RPC_URL", e))
    }

    pub fn ticket_endpoint(&self) -> Result<Url, StorefrontError> {
        Url::parse(&self.ticket_endpoint).map_err(|e| invalid("TICKET_ENDPOINT", e))
    }

    pub fn ticket_signer(&self) -> Result<Option<Address>, StorefrontError> {
        self.ticket_signer
            .as_deref()
            .map(parse_address)
            .transpose()
            .map_err(|e| invalid("TICKET_SIGNER", e))
    }

    /// Schedule listed in the file, if any.
    pub fn schedule(&self) -> Result<Option<SaleSchedule>, StorefrontError> {
        self.rounds
            .clone()
            .map(SaleSchedule::new)
            .transpose()
            .map_err(|e| invalid("ROUNDS", e))
    }
}
