// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Everything a storefront needs once the wallet is connected.

use std::sync::Arc;
use std::time::Duration;

use mint_types::address::{format_address, Address};
use mint_types::round::{SaleSchedule, Tier};
use mint_types::sale::SaleState;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::chain::SaleContract;
use crate::clock::Clock;
use crate::config::StorefrontConfig;
use crate::error::{bounded, StorefrontError};
use crate::mint::{MintOrder, MintReceipt};
use crate::resolver::resolve;
use crate::ticket_client::{IssuedTicket, TicketSource};

/// Resolved sale state together with the live issuance counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSnapshot {
    pub state: SaleState,
    pub total_issued: u64,
    /// The contract's own view of the active round.
    pub chain_round: u32,
}

impl SaleSnapshot {
    /// Whether the contract runs the round resolved from the local clock.
    /// Only meaningful while a round is open.
    pub fn agrees_with_chain(&self) -> bool {
        self.state
            .active_round_index
            .map_or(true, |index| index == self.chain_round)
    }
}

/// Connected storefront: contract handle, ticket service, schedule and the
/// currently selected account. Passed around explicitly, never global.
pub struct Session {
    config: StorefrontConfig,
    contract: Arc<dyn SaleContract>,
    tickets: Arc<dyn TicketSource>,
    clock: Arc<dyn Clock>,
    schedule: SaleSchedule,
    tx_account: watch::Sender<Option<Address>>,
}

impl Session {
    /// Check the network and load the schedule, either from the
    /// configuration or from the contract.
    pub async fn connect(
        config: StorefrontConfig,
        contract: Arc<dyn SaleContract>,
        tickets: Arc<dyn TicketSource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StorefrontError> {
        config.poller.validate()?;
        let timeout = config.poller.call_timeout();
        let chain_id = bounded("chainId", timeout, contract.chain_id()).await?;
        if chain_id != config.network.id {
            warn!(
                "Connected to chain {chain_id}, the sale runs on {} ({})",
                config.network.id, config.network.name
            );
            return Err(StorefrontError::WrongNetwork {
                name: config.network.name.clone(),
                expected: config.network.id,
                actual: chain_id,
            });
        }

        let schedule = match config.schedule()? {
            Some(schedule) => schedule,
            None => load_schedule(&config, contract.as_ref(), timeout).await?,
        };
        info!(
            "Connected to {} on {}: {} rounds",
            config.nft_name,
            config.network.name,
            schedule.rounds().len()
        );

        let (tx_account, _) = watch::channel(None);
        Ok(Self {
            config,
            contract,
            tickets,
            clock,
            schedule,
            tx_account,
        })
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    pub fn schedule(&self) -> &SaleSchedule {
        &self.schedule
    }

    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Select the account used for tickets and mints. `None` disconnects.
    pub fn set_account(&self, account: Option<Address>) {
        if let Some(account) = &account {
            info!("Account changed to {}", format_address(account));
        }
        self.tx_account.send_replace(account);
    }

    pub fn subscribe_account(&self) -> watch::Receiver<Option<Address>> {
        self.tx_account.subscribe()
    }

    /// Resolve the sale at the current time and read the issuance counter.
    /// A result whose boundary passed while the reads were in flight is
    /// reported as [StorefrontError::StaleRound].
    pub async fn snapshot(&self) -> Result<SaleSnapshot, StorefrontError> {
        let timeout = self.config.poller.call_timeout();
        let state = bounded(
            "resolve",
            timeout,
            resolve(self.now(), &self.schedule, self.contract.as_ref()),
        )
        .await?;
        let chain_round = bounded("currentRound", timeout, self.contract.current_round()).await?;
        let total_issued = bounded("totalIssued", timeout, self.contract.total_issued()).await?;

        let now = self.now();
        if let Some(boundary) = state.boundary().filter(|_| state.is_stale(now)) {
            return Err(StorefrontError::StaleRound { boundary, now });
        }
        Ok(SaleSnapshot {
            state,
            total_issued,
            chain_round,
        })
    }

    pub async fn request_ticket(
        &self,
        account: Address,
        claimed_tier: Tier,
    ) -> Result<IssuedTicket, StorefrontError> {
        let timeout = self.config.poller.call_timeout();
        let issued = bounded(
            "ticket",
            timeout,
            self.tickets.request_ticket(account, claimed_tier),
        )
        .await?;
        if let IssuedTicket::Signed(signed) = &issued {
            let accepted = bounded(
                "verifyTicket",
                timeout,
                self.contract.verify_ticket(&signed.ticket, &signed.signature),
            )
            .await?;
            if !accepted {
                return Err(StorefrontError::TicketRejected(format_address(&account)));
            }
        }
        Ok(issued)
    }

    pub async fn mint(&self, order: &MintOrder) -> Result<MintReceipt, StorefrontError> {
        let timeout = self.config.poller.mint_timeout();
        Ok(bounded("mint", timeout, self.contract.mint(order)).await?)
    }
}

async fn load_schedule(
    config: &StorefrontConfig,
    contract: &dyn SaleContract,
    timeout: Duration,
) -> Result<SaleSchedule, StorefrontError> {
    let count = config.round_count.ok_or_else(|| {
        StorefrontError::Configuration("either ROUNDS or ROUND_COUNT must be set".to_string())
    })?;
    let mut rounds = Vec::with_capacity(count as usize);
    for index in 0..count {
        rounds.push(bounded("currentRoundConfig", timeout, contract.round_config(index)).await?);
    }
    SaleSchedule::new(rounds).map_err(|e| StorefrontError::Configuration(e.to_string()))
}
