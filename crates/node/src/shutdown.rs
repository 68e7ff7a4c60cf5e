// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Stopping the node's long-running modes.
//!
//! The ticket server and the storefront watcher each hold a receiver and
//! return once anything is broadcast on it.

use tokio::{
    signal::unix::{signal, SignalKind},
    sync::broadcast,
};
use tracing::info;

pub struct Shutdown {
    tx_shutdown: broadcast::Sender<()>,
}

impl Default for Shutdown {
    fn default() -> Self {
        let (tx_shutdown, _) = broadcast::channel(1);
        Self { tx_shutdown }
    }
}

impl Shutdown {
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx_shutdown.subscribe()
    }

    /// Tell every mode still listening to stop. Returns how many were.
    pub fn trigger(&self, reason: &str) -> usize {
        info!("{reason}, stopping the node...");
        self.tx_shutdown.send(()).unwrap_or(0)
    }

    /// Wait for SIGTERM or SIGINT, then [Self::trigger].
    pub async fn run(&self) -> std::io::Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let reason = tokio::select! {
            _ = sigterm.recv() => "Received SIGTERM",
            _ = sigint.recv() => "Received SIGINT",
        };
        self.trigger(reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_every_mode() {
        let shutdown = Shutdown::default();
        assert_eq!(shutdown.trigger("Nobody listening"), 0);

        let mut rx_server = shutdown.subscribe();
        let mut rx_watcher = shutdown.subscribe();
        assert_eq!(shutdown.trigger("Test"), 2);
        assert!(rx_server.recv().await.is_ok());
        assert!(rx_watcher.recv().await.is_ok());
    }
}
