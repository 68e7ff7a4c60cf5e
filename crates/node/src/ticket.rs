// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::{net::SocketAddr, path::PathBuf};

use anyhow::Context;
use mint_ticket::{
    authority::TicketAuthority,
    config::TicketConfig,
    eligibility::{InMemoryEligibility, TimeoutStore},
    rpc::TicketRpc,
    signer::TicketSigner,
};
use mint_types::address::format_address;
use tracing::{info, warn};

use crate::shutdown::Shutdown;

const DEFAULT_RPC_ADDRESS: ([u8; 4], u16) = ([127, 0, 0, 1], 5303);

/// Command line arguments for the `mint-node` when running the ticket server.
#[derive(Clone, Debug, clap::Args)]
pub struct Args {
    #[arg(short, long, default_value_t=DEFAULT_RPC_ADDRESS.into())]
    /// RPC server exposed on this address
    pub rpc_address: SocketAddr,
    #[arg(short, long)]
    /// Eligibility records, overriding the configured file
    pub eligibility_file: Option<PathBuf>,
}

pub async fn run(
    Args {
        rpc_address,
        eligibility_file,
    }: Args,
    config: TicketConfig,
) -> anyhow::Result<()> {
    info!("Starting mint node in ticket server mode");

    let signer = TicketSigner::from_env(&config.signer_key_env)
        .with_context(|| format!("Invalid signing key in {}", config.signer_key_env))?;
    if let Some(address) = signer.address() {
        info!("Signing tickets as {}", format_address(&address));
    }

    let store = match eligibility_file.or(config.eligibility_file.clone()) {
        Some(path) => InMemoryEligibility::load_json(&path)
            .with_context(|| format!("Cannot load eligibility records from {}", path.display()))?,
        None => {
            warn!("No eligibility file configured, every address is ineligible");
            InMemoryEligibility::default()
        }
    };
    let authority = TicketAuthority::new(signer, TimeoutStore::new(store, config.lookup_timeout()));

    let shutdown = Shutdown::default();
    let mut rpc = TicketRpc::new(rpc_address, shutdown.subscribe(), authority);

    let rpc_handle = tokio::spawn(async move { rpc.run().await });
    let shutdown_handle = tokio::spawn(async move { shutdown.run().await });

    // The server returns on shutdown, or early when it cannot bind.
    let result = rpc_handle.await?;
    shutdown_handle.abort();
    result.context("Ticket server failed")
}
