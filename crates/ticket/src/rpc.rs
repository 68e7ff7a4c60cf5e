// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::net::SocketAddr;

use futures::FutureExt;
use hyper::{body::Incoming, Method, Request};
use mint_rpc::{
    errors::RpcError,
    handlers::{handle_get_request, handle_post_request, Resp},
    router::Router,
    server::RpcServer,
};
use mint_types::address::format_address;
use mint_types::ticket::{EligibilityQuery, TicketRequest};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::authority::TicketAuthority;
use crate::eligibility::EligibilityStore;
use crate::error::TicketError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Address tickets are signed with, `None` when no key is configured.
    pub signer: Option<String>,
}

pub struct TicketRpc<E>(RpcServer<TicketAuthority<E>>);

impl<E: EligibilityStore> TicketRpc<E> {
    pub fn new(
        listening_addr: SocketAddr,
        rx_shutdown: broadcast::Receiver<()>,
        authority: TicketAuthority<E>,
    ) -> Self {
        Self(RpcServer::new(listening_addr, rx_shutdown, authority))
    }

    pub async fn run(&mut self) -> Result<(), RpcError> {
        let result = self.0.serve(router()).await;
        log_termination(&result);
        result
    }

    pub async fn run_with_listener(&mut self, listener: TcpListener) -> Result<(), RpcError> {
        let result = self.0.serve_with_listener(listener, router()).await;
        log_termination(&result);
        result
    }
}

fn log_termination(result: &Result<(), RpcError>) {
    match result {
        Err(err) => error!("Ticket RPC server failed with {}", err),
        Ok(()) => info!("Ticket RPC server terminated"),
    }
}

fn router<E: EligibilityStore>() -> Router<TicketAuthority<E>> {
    let post_ticket = |authority: TicketAuthority<E>, req| {
        async move { post_ticket_handler(authority, req).await }.boxed()
    };
    let post_whitelisted = |authority: TicketAuthority<E>, req| {
        async move { post_whitelisted_handler(authority, req).await }.boxed()
    };
    let get_health = |authority: TicketAuthority<E>, _req| {
        async move { get_health_handler(authority).await }.boxed()
    };

    Router::builder()
        .with_route("/ticket", Method::POST, post_ticket)
        .with_route("/whitelisted", Method::POST, post_whitelisted)
        .with_route("/health", Method::GET, get_health)
        .build()
}

async fn post_ticket_handler<E: EligibilityStore>(
    authority: TicketAuthority<E>,
    req: Request<Incoming>,
) -> Result<Resp, RpcError> {
    let f = move |request: TicketRequest| {
        async move { authority.issue_ticket(request).await }.boxed()
    };
    handle_post_request(req, f).await
}

async fn post_whitelisted_handler<E: EligibilityStore>(
    authority: TicketAuthority<E>,
    req: Request<Incoming>,
) -> Result<Resp, RpcError> {
    let f = move |query: EligibilityQuery| {
        async move { authority.eligibility(&query.address).await }.boxed()
    };
    handle_post_request(req, f).await
}

async fn get_health_handler<E: EligibilityStore>(
    authority: TicketAuthority<E>,
) -> Result<Resp, RpcError> {
    let f = move || {
        async move {
            Ok::<_, TicketError>(HealthResponse {
                signer: authority.signer_address().map(|a| format_address(&a)),
            })
        }
        .boxed()
    };
    handle_get_request(f).await
}
