// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use ethers::middleware::SignerMiddleware;
use ethers::prelude::Http;
use ethers::providers::Provider;
use ethers::signers::{LocalWallet, Signer};
use mint_storefront::{
    chain::EthersSaleContract,
    config::StorefrontConfig,
    poller::{PollerState, SalePoller, TicketStatus},
};
use mint_types::address::format_address;
use tracing::info;

use crate::storefront::connect;

/// Command line arguments for the `mint-node` when minting.
#[derive(Clone, Debug, clap::Args)]
pub struct Args {
    #[arg(short, long, default_value_t = 1)]
    /// Number of tokens, clamped to what the round allows
    pub amount: u32,
    #[arg(long, default_value = "STOREFRONT_WALLET_KEY")]
    /// Environment variable holding the wallet key
    pub wallet_key_env: String,
    #[arg(long, default_value_t = 30)]
    /// Seconds to wait for the sale state and the ticket
    pub ready_timeout: u64,
}

pub async fn run(
    Args {
        amount,
        wallet_key_env,
        ready_timeout,
    }: Args,
    config: StorefrontConfig,
) -> anyhow::Result<()> {
    let wallet = std::env::var(&wallet_key_env)
        .with_context(|| format!("{wallet_key_env} is not set"))?
        .trim()
        .parse::<LocalWallet>()
        .with_context(|| format!("{wallet_key_env} is not a valid key"))?
        .with_chain_id(config.network.id);
    let account = wallet.address();
    info!("Minting {amount} from {}", format_address(&account));

    let provider = Provider::new(Http::new(config.rpc_url()?));
    let client = Arc::new(SignerMiddleware::new(provider, wallet));
    let contract = EthersSaleContract::new(client, config.contract_address()?)?;
    let nft_name = config.nft_name.clone();
    let links = (config.scan_link.clone(), config.marketplace_link.clone());
    let session = connect(config, Arc::new(contract)).await?;
    session.set_account(Some(account));

    let handle = SalePoller::start(session);
    let mut rx_view = handle.subscribe();
    let ready = tokio::time::timeout(
        Duration::from_secs(ready_timeout),
        rx_view.wait_for(|view| view.state != PollerState::Idle && view.ticket != TicketStatus::Pending),
    )
    .await
    .map_err(|_| anyhow!("Sale state was not available within {ready_timeout}s"))?
    .map(|view| view.clone());
    let view = ready.context("Sale poller stopped")?;
    if let Some(error) = view.error {
        return Err(anyhow!(error));
    }

    let result = handle.mint(amount).await;
    let feedback = handle.view().feedback;
    handle.cancel().await;

    let receipt = result.with_context(|| format!("Could not mint {nft_name}"))?;
    info!(
        "{} ({:?})",
        feedback.unwrap_or_default(),
        receipt.transaction_hash
    );
    info!("Contract: {}, collection: {}", links.0, links.1);
    Ok(())
}
