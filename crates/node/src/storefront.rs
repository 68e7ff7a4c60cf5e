// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use mint_storefront::{
    chain::{EthersSaleContract, SaleContract},
    clock::SystemClock,
    config::StorefrontConfig,
    poller::{SalePoller, StorefrontView},
    session::Session,
    ticket_client::TicketClient,
};
use mint_types::address::parse_address;
use tracing::info;

use crate::shutdown::Shutdown;

/// Command line arguments for the `mint-node` when following the storefront.
#[derive(Clone, Debug, clap::Args)]
pub struct Args {
    #[arg(short, long)]
    /// Account whose ticket is tracked
    pub account: Option<String>,
}

/// Connect a session for `contract`, checking the network and loading the
/// schedule.
pub async fn connect(
    config: StorefrontConfig,
    contract: Arc<dyn SaleContract>,
) -> anyhow::Result<Arc<Session>> {
    let tickets = TicketClient::new(config.ticket_endpoint()?, config.ticket_signer()?);
    let session = Session::connect(config, contract, Arc::new(tickets), Arc::new(SystemClock)).await?;
    Ok(Arc::new(session))
}

fn log_view(config: &StorefrontConfig, view: &StorefrontView) {
    let sale = view.sale.as_ref();
    info!(
        state = ?view.state,
        round = ?sale.map(|sale| sale.round_index),
        price = %sale
            .map(|sale| sale.effective_price)
            .filter(|price| !price.is_zero())
            .unwrap_or(config.wei_cost),
        minted = %format!("{}/{}", view.total_issued.unwrap_or_default(), config.max_supply),
        supply = ?view.supply,
        ticket = ?view.ticket,
        mint_enabled = view.mint_enabled(),
        "Storefront updated"
    );
    if let Some(error) = &view.error {
        info!("{error}");
    }
}

pub async fn run(Args { account }: Args, config: StorefrontConfig) -> anyhow::Result<()> {
    info!("Starting mint node in storefront mode");

    info!(
        "{} ({}) costs {} {} per token, contract at {}",
        config.nft_name,
        config.symbol,
        config.display_cost,
        config.network.symbol,
        config.scan_link
    );
    let contract = EthersSaleContract::connect_http(config.rpc_url()?, config.contract_address()?)?;
    let session = connect(config, Arc::new(contract)).await?;
    if let Some(account) = account {
        session.set_account(Some(parse_address(&account)?));
    }

    let handle = SalePoller::start(session.clone());
    let mut rx_view = handle.subscribe();

    let shutdown = Shutdown::default();
    let mut rx_shutdown = shutdown.subscribe();
    let shutdown_handle = tokio::spawn(async move { shutdown.run().await });

    loop {
        tokio::select! {
            _ = rx_shutdown.recv() => break,
            changed = rx_view.changed() => {
                if changed.is_err() {
                    break;
                }
                log_view(session.config(), &rx_view.borrow_and_update());
            }
        }
    }

    handle.cancel().await;
    shutdown_handle.abort();
    Ok(())
}
