// SPDX-FileCopyrightText: 2024 Nomadic Labs <contact@nomadic-labs.com>
//
// SPDX-License-Identifier: MIT

use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::errors::RpcError;
use crate::router::Router;

/// HTTP/1 server dispatching every request through a [Router] with a copy
/// of the shared state. Runs until a shutdown signal is received.
pub struct RpcServer<S> {
    listening_addr: SocketAddr,
    rx_shutdown: broadcast::Receiver<()>,
    state: S,
}

impl<S: Clone + Send + Sync + 'static> RpcServer<S> {
    pub fn new(listening_addr: SocketAddr, rx_shutdown: broadcast::Receiver<()>, state: S) -> Self {
        Self {
            listening_addr,
            rx_shutdown,
            state,
        }
    }

    pub async fn serve(&mut self, router: Router<S>) -> Result<(), RpcError> {
        let listener = TcpListener::bind(self.listening_addr)
            .await
            .map_err(RpcError::TcpListenerError)?;
        self.serve_with_listener(listener, router).await
    }

    /// Serve on an already bound listener, e.g. one bound to port 0.
    pub async fn serve_with_listener(
        &mut self,
        listener: TcpListener,
        router: Router<S>,
    ) -> Result<(), RpcError> {
        let local_addr = listener
            .local_addr()
            .map_err(RpcError::TcpListenerError)?;
        info!("Listening on http://{}", local_addr);
        let router = Arc::new(router);
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (tcp, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(err) => {
                            warn!("Failed to accept connection: {:?}", err);
                            continue;
                        }
                    };
                    let io = TokioIo::new(tcp);
                    let router = router.clone();
                    let state = self.state.clone();
                    tokio::task::spawn(async move {
                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service_fn(|req| router.handle_request(&state, req)))
                            .await
                        {
                            warn!("Error serving connection from {}: {:?}", peer, err);
                        }
                    });
                },
                _ = self.rx_shutdown.recv() => {
                    info!("Shutting down server on {}", local_addr);
                    return Ok(())
                },
            }
        }
    }
}
