// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

#![doc = include_str!("../README.md")]

mod mint;
mod shutdown;
mod storefront;
mod ticket;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{command, Parser, Subcommand};
use mint_core::config::{
    default::DefaultConfigProvider, file::JsonFileConfigProvider, ConfigProvider,
};
use serde::de::DeserializeOwned;
use tracing::{info, subscriber::set_global_default};
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Logging level (off, error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info")]
    log_level: String,
    /// JSON configuration file with one section per component
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    /// Serve whitelist tickets over HTTP
    TicketServer(ticket::Args),
    /// Follow the sale and log every change of the storefront view
    Storefront(storefront::Args),
    /// Mint tokens from a local wallet
    Mint(mint::Args),
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber_builder =
        tracing_subscriber::fmt::Subscriber::builder().with_env_filter(env_filter);

    let subscriber = subscriber_builder.with_writer(std::io::stderr).finish();
    set_global_default(subscriber).context("Failed to set subscriber")
}

/// Read section `name` from the configuration file, or its defaults when no
/// file was given.
fn config_section<T: DeserializeOwned + Default>(
    path: Option<&Path>,
    name: &'static str,
) -> anyhow::Result<T> {
    let section = match path {
        Some(path) => JsonFileConfigProvider::load(path)
            .with_context(|| format!("Cannot load {}", path.display()))?
            .get_config(name)?,
        None => DefaultConfigProvider {}.get_config(name)?,
    };
    Ok(section)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    info!("Mint node is launching...");

    let config = cli.config.as_deref();
    match cli.command {
        Commands::TicketServer(args) => {
            ticket::run(args, config_section(config, mint_ticket::config::TICKET_CONFIG_SECTION)?)
                .await
        }
        Commands::Storefront(args) => {
            storefront::run(
                args,
                config_section(config, mint_storefront::config::STOREFRONT_CONFIG_SECTION)?,
            )
            .await
        }
        Commands::Mint(args) => {
            mint::run(
                args,
                config_section(config, mint_storefront::config::STOREFRONT_CONFIG_SECTION)?,
            )
            .await
        }
    }
}
