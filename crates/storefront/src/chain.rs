// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

//! Access to the sale contract.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{parse_abi, Abi};
use ethers::contract::{Contract, ContractCall};
use ethers::prelude::Http;
use ethers::providers::{Middleware, Provider};
use ethers::types::{Bytes, TransactionReceipt};
use mint_types::address::Address;
use mint_types::round::{RoundConfig, StageKind};
use mint_types::signature::TicketSignature;
use mint_types::ticket::Ticket;
use primitive_types::{H256, U256};
use tracing::info;
use url::Url;

use crate::error::ChainError;
use crate::mint::{MintOrder, MintReceipt};
use crate::resolver::DecliningPrice;

const SALE_ABI: &[&str] = &[
    "function totalIssued() external view returns (uint256)",
    "function currentRound() external view returns (uint256)",
    "function currentRoundConfig(uint256 index) external view returns (uint64, uint64, uint8, uint32, uint256, uint32, uint64)",
    "function decliningPrice(uint256 atTime) external view returns (uint256)",
    "function verifyTicket(address ticket, bytes signature) external view returns (bool)",
    "function mint(uint256 amount) external payable",
    "function mintWithTicket(uint256 amount, address ticket, bytes signature) external payable",
];

/// Reads and writes the storefront needs from the sale contract.
#[async_trait]
pub trait SaleContract: DecliningPrice + 'static {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Live issuance counter.
    async fn total_issued(&self) -> Result<u64, ChainError>;

    /// Round the contract itself considers active.
    async fn current_round(&self) -> Result<u32, ChainError>;

    async fn round_config(&self, index: u32) -> Result<RoundConfig, ChainError>;

    /// The contract's own acceptance check for a ticket.
    async fn verify_ticket(
        &self,
        ticket: &Ticket,
        signature: &TicketSignature,
    ) -> Result<bool, ChainError>;

    /// Send the order and wait for it to be mined.
    async fn mint(&self, order: &MintOrder) -> Result<MintReceipt, ChainError>;
}

fn call_error<E: Display>(method: &'static str) -> impl FnOnce(E) -> ChainError {
    move |e| ChainError::Call {
        method,
        reason: e.to_string(),
    }
}

fn to_u64(method: &'static str, value: U256) -> Result<u64, ChainError> {
    if value > U256::from(u64::MAX) {
        return Err(ChainError::Decode {
            method,
            reason: format!("{value} does not fit in 64 bits"),
        });
    }
    Ok(value.low_u64())
}

fn sale_abi() -> Result<Abi, ChainError> {
    parse_abi(SALE_ABI).map_err(|e| ChainError::Decode {
        method: "abi",
        reason: e.to_string(),
    })
}

pub struct EthersSaleContract<M> {
    client: Arc<M>,
    contract: Contract<M>,
}

impl EthersSaleContract<Provider<Http>> {
    /// Read-only handle over a plain HTTP provider.
    pub fn connect_http(rpc_url: Url, address: Address) -> Result<Self, ChainError> {
        Self::new(Arc::new(Provider::new(Http::new(rpc_url))), address)
    }
}

impl<M: Middleware + 'static> EthersSaleContract<M> {
    pub fn new(client: Arc<M>, address: Address) -> Result<Self, ChainError> {
        let contract = Contract::new(address, sale_abi()?, client.clone());
        Ok(Self { client, contract })
    }

    async fn read_u256(&self, method: &'static str) -> Result<U256, ChainError> {
        self.contract
            .method::<_, U256>(method, ())
            .map_err(call_error(method))?
            .call()
            .await
            .map_err(call_error(method))
    }
}

#[async_trait]
impl<M: Middleware + 'static> DecliningPrice for EthersSaleContract<M> {
    async fn declining_price(&self, at_time: u64) -> Result<U256, ChainError> {
        const METHOD: &str = "decliningPrice";
        self.contract
            .method::<_, U256>(METHOD, U256::from(at_time))
            .map_err(call_error(METHOD))?
            .call()
            .await
            .map_err(call_error(METHOD))
    }
}

#[async_trait]
impl<M: Middleware + 'static> SaleContract for EthersSaleContract<M> {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let id = self
            .client
            .get_chainid()
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;
        to_u64("chainId", id)
    }

    async fn total_issued(&self) -> Result<u64, ChainError> {
        to_u64("totalIssued", self.read_u256("totalIssued").await?)
    }

    async fn current_round(&self) -> Result<u32, ChainError> {
        let index = to_u64("currentRound", self.read_u256("currentRound").await?)?;
        u32::try_from(index).map_err(call_error("currentRound"))
    }

    async fn round_config(&self, index: u32) -> Result<RoundConfig, ChainError> {
        const METHOD: &str = "currentRoundConfig";
        let (start_time, end_time, stage_code, tier_index, base_price, per_tx_cap, supply_cap) =
            self.contract
                .method::<_, (u64, u64, u8, u32, U256, u32, u64)>(METHOD, U256::from(index))
                .map_err(call_error(METHOD))?
                .call()
                .await
                .map_err(call_error(METHOD))?;
        let stage_kind = StageKind::from_code(stage_code).ok_or(ChainError::Decode {
            method: METHOD,
            reason: format!("unknown stage kind {stage_code}"),
        })?;
        let round = RoundConfig {
            index,
            start_time,
            end_time,
            stage_kind,
            tier_index,
            base_price,
            per_tx_cap,
            supply_cap,
        };
        round.validate().map_err(|e| ChainError::Decode {
            method: METHOD,
            reason: e.to_string(),
        })?;
        Ok(round)
    }

    async fn verify_ticket(
        &self,
        ticket: &Ticket,
        signature: &TicketSignature,
    ) -> Result<bool, ChainError> {
        const METHOD: &str = "verifyTicket";
        self.contract
            .method::<_, bool>(
                METHOD,
                (ticket.subject, Bytes::from(signature.as_bytes().to_vec())),
            )
            .map_err(call_error(METHOD))?
            .call()
            .await
            .map_err(call_error(METHOD))
    }

    async fn mint(&self, order: &MintOrder) -> Result<MintReceipt, ChainError> {
        let call = self.mint_call(order)?;
        let pending = call.send().await.map_err(call_error("mint"))?;
        let transaction_hash = pending.tx_hash();
        info!("Mint of {} submitted as {:?}", order.amount, transaction_hash);

        let receipt = pending
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;
        check_receipt(transaction_hash, receipt)
    }
}

impl<M: Middleware + 'static> EthersSaleContract<M> {
    /// `mint` outside restricted rounds, `mintWithTicket` with the held
    /// ticket otherwise, paying the order's value with its gas limit.
    fn mint_call(&self, order: &MintOrder) -> Result<ContractCall<M, ()>, ChainError> {
        let amount = U256::from(order.amount);
        let call = match &order.ticket {
            None => self.contract.method::<_, ()>("mint", amount),
            Some(signed) => self.contract.method::<_, ()>(
                "mintWithTicket",
                (
                    amount,
                    signed.ticket.subject,
                    Bytes::from(signed.signature.as_bytes().to_vec()),
                ),
            ),
        }
        .map_err(call_error("mint"))?;
        Ok(call.value(order.total_value()).gas(order.total_gas()))
    }
}

fn check_receipt(
    transaction_hash: H256,
    receipt: Option<TransactionReceipt>,
) -> Result<MintReceipt, ChainError> {
    let receipt = receipt.ok_or(ChainError::Dropped)?;
    if receipt.status != Some(1u64.into()) {
        return Err(ChainError::Reverted(format!("{transaction_hash:?}")));
    }
    Ok(MintReceipt { transaction_hash })
}
