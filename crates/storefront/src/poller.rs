// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Client sale poller.
//!
//! One task owns the storefront view. A one second ticker updates the
//! countdown from the cached sale state and never waits on the network:
//! resolutions, ticket requests and mints are spawned and their results are
//! applied when they complete. The view is published through a watch
//! channel after every event.

use std::sync::Arc;

use mint_types::address::{format_address, Address};
use mint_types::sale::{SalePhase, SaleState, SupplyStatus};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::StorefrontError;
use crate::mint::{MintOrder, MintReceipt};
use crate::scheduler::ScheduledTask;
use crate::session::{SaleSnapshot, Session};
use crate::ticket_client::{IssuedTicket, SignedTicket};

const LOAD_FAILED: &str = "Could not load data from contract.";
const MINT_FAILED: &str = "Sorry, something went wrong please try again later.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollerState {
    /// Nothing resolved yet.
    #[default]
    Idle,
    Locked {
        countdown: u64,
    },
    Open {
        countdown: u64,
    },
    Closed,
}

impl PollerState {
    pub fn from_sale(sale: &SaleState, now: u64) -> Self {
        let countdown = sale.countdown_at(now).unwrap_or_default();
        match sale.phase {
            SalePhase::Locked { .. } => PollerState::Locked { countdown },
            SalePhase::Open { .. } => PollerState::Open { countdown },
            SalePhase::Closed => PollerState::Closed,
        }
    }
}

/// Advance one tick against the cached sale state. Returns the state to
/// show and whether a full resolution is due.
///
/// Crossing a boundary never guesses the next round: a locked sale that
/// reached its start, or an open round that reached its end, asks for a
/// resolution.
pub fn on_tick(cached: Option<&SaleState>, now: u64) -> (PollerState, bool) {
    let Some(sale) = cached else {
        return (PollerState::Idle, true);
    };
    match sale.phase {
        SalePhase::Locked { .. } if now >= sale.round_start => {
            (PollerState::Locked { countdown: 0 }, true)
        }
        SalePhase::Open { .. } if now >= sale.round_end => (PollerState::Closed, true),
        _ => (PollerState::from_sale(sale, now), false),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TicketStatus {
    #[default]
    NoAccount,
    /// The described round does not need a ticket.
    NotRequired,
    Pending,
    Held(SignedTicket),
    Ineligible,
    Failed(String),
}

/// Everything the storefront shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorefrontView {
    pub state: PollerState,
    pub sale: Option<SaleState>,
    pub total_issued: Option<u64>,
    pub supply: Option<SupplyStatus>,
    pub account: Option<Address>,
    pub ticket: TicketStatus,
    pub minting: bool,
    /// Last failure to load the sale state, cleared by the next success.
    pub error: Option<String>,
    /// Outcome of the last mint.
    pub feedback: Option<String>,
}

impl StorefrontView {
    pub fn mint_enabled(&self) -> bool {
        MintOrder::prepare(self, 1, 0).is_ok()
    }
}

enum PollerCommand {
    Mint {
        amount: u32,
        reply: oneshot::Sender<Result<MintReceipt, StorefrontError>>,
    },
    Refresh,
}

enum TaskOutcome {
    Resolved(Result<SaleSnapshot, StorefrontError>),
    Ticket {
        generation: u64,
        result: Result<IssuedTicket, StorefrontError>,
    },
    Minted {
        result: Result<MintReceipt, StorefrontError>,
        reply: oneshot::Sender<Result<MintReceipt, StorefrontError>>,
    },
}

/// Handle on a running [SalePoller].
pub struct PollerHandle {
    rx_view: watch::Receiver<StorefrontView>,
    tx_commands: mpsc::Sender<PollerCommand>,
    task: ScheduledTask,
}

impl PollerHandle {
    pub fn view(&self) -> StorefrontView {
        self.rx_view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<StorefrontView> {
        self.rx_view.clone()
    }

    /// Mint `amount` tokens, clamped to what the round allows.
    pub async fn mint(&self, amount: u32) -> Result<MintReceipt, StorefrontError> {
        let (reply, rx_reply) = oneshot::channel();
        self.tx_commands
            .send(PollerCommand::Mint { amount, reply })
            .await
            .map_err(|_| StorefrontError::PollerStopped)?;
        rx_reply.await.map_err(|_| StorefrontError::PollerStopped)?
    }

    pub async fn refresh(&self) -> Result<(), StorefrontError> {
        self.tx_commands
            .send(PollerCommand::Refresh)
            .await
            .map_err(|_| StorefrontError::PollerStopped)
    }

    /// Stop the poller. In-flight requests are abandoned and nothing runs
    /// once this returns.
    pub async fn cancel(self) {
        self.task.cancel().await
    }
}

pub struct SalePoller {
    session: Arc<Session>,
    tx_view: watch::Sender<StorefrontView>,
    view: StorefrontView,
    tasks: JoinSet<TaskOutcome>,
    resolving: bool,
    ticket_key: Option<(Address, u32)>,
    ticket_generation: u64,
}

impl SalePoller {
    pub fn start(session: Arc<Session>) -> PollerHandle {
        let (tx_view, rx_view) = watch::channel(StorefrontView::default());
        let (tx_commands, rx_commands) = mpsc::channel(8);
        let poller = Self {
            session,
            tx_view,
            view: StorefrontView::default(),
            tasks: JoinSet::new(),
            resolving: false,
            ticket_key: None,
            ticket_generation: 0,
        };
        let task = ScheduledTask::spawn(move |rx_cancel| poller.run(rx_commands, rx_cancel));
        PollerHandle {
            rx_view,
            tx_commands,
            task,
        }
    }

    async fn run(
        mut self,
        mut rx_commands: mpsc::Receiver<PollerCommand>,
        mut rx_cancel: oneshot::Receiver<()>,
    ) {
        let config = self.session.config().poller.clone();
        let mut ticker = interval(config.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut refresh = interval_at(
            Instant::now() + config.refresh_interval(),
            config.refresh_interval(),
        );
        let mut rx_account = self.session.subscribe_account();

        info!("Sale poller started");
        self.view.account = *rx_account.borrow_and_update();
        self.view.ticket = TicketStatus::Pending;
        self.start_resolution();

        loop {
            tokio::select! {
                biased;
                _ = &mut rx_cancel => break,
                Some(joined) = self.tasks.join_next() => match joined {
                    Ok(outcome) => self.on_outcome(outcome),
                    Err(e) => self.on_task_failure(e),
                },
                changed = rx_account.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let account = *rx_account.borrow_and_update();
                    self.on_account(account);
                },
                Some(command) = rx_commands.recv() => self.on_command(command),
                _ = ticker.tick() => self.on_tick(),
                _ = refresh.tick() => self.start_resolution(),
            }
            self.publish();
        }

        self.tasks.shutdown().await;
        info!("Sale poller stopped");
    }

    fn publish(&self) {
        self.tx_view.send_if_modified(|current| {
            if *current == self.view {
                return false;
            }
            *current = self.view.clone();
            true
        });
    }

    fn on_tick(&mut self) {
        let (state, resolve) = on_tick(self.view.sale.as_ref(), self.session.now());
        self.view.state = state;
        if resolve {
            self.start_resolution();
        }
    }

    fn start_resolution(&mut self) {
        if self.resolving {
            return;
        }
        self.resolving = true;
        let session = self.session.clone();
        self.tasks
            .spawn(async move { TaskOutcome::Resolved(session.snapshot().await) });
    }

    fn on_outcome(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Resolved(result) => self.on_resolved(result),
            TaskOutcome::Ticket { generation, result } => self.on_ticket(generation, result),
            TaskOutcome::Minted { result, reply } => self.on_minted(result, reply),
        }
    }

    fn on_resolved(&mut self, result: Result<SaleSnapshot, StorefrontError>) {
        self.resolving = false;
        match result {
            Ok(snapshot) => {
                if !snapshot.agrees_with_chain() {
                    warn!(
                        "Contract reports round {} while the clock says {:?}",
                        snapshot.chain_round, snapshot.state.active_round_index
                    );
                }
                let SaleSnapshot {
                    state,
                    total_issued,
                    ..
                } = snapshot;
                if self.view.sale.as_ref().map(|sale| sale.round_index) != Some(state.round_index) {
                    info!("Sale now describes round {}: {:?}", state.round_index, state.phase);
                }
                self.view.state = PollerState::from_sale(&state, self.session.now());
                self.view.supply = Some(state.supply_status(total_issued));
                self.view.total_issued = Some(total_issued);
                self.view.sale = Some(state);
                self.view.error = None;
                self.ensure_ticket();
            }
            Err(StorefrontError::StaleRound { boundary, now }) => {
                debug!("Resolution went stale at {boundary} (now {now}), resolving again");
                self.start_resolution();
            }
            Err(e) => {
                error!("Could not load sale state: {e}");
                self.view.error = Some(LOAD_FAILED.to_string());
            }
        }
    }

    /// Request a ticket when the described round needs one and none is held
    /// or pending for the current account and round.
    fn ensure_ticket(&mut self) {
        let Some(sale) = &self.view.sale else {
            return;
        };
        if !sale.requires_ticket || sale.phase == SalePhase::Closed {
            self.drop_ticket(TicketStatus::NotRequired);
            return;
        }
        let Some(account) = self.view.account else {
            self.drop_ticket(TicketStatus::NoAccount);
            return;
        };
        let key = (account, sale.round_index);
        if self.ticket_key == Some(key) && !matches!(self.view.ticket, TicketStatus::Failed(_)) {
            return;
        }

        self.ticket_key = Some(key);
        self.ticket_generation += 1;
        self.view.ticket = TicketStatus::Pending;
        let generation = self.ticket_generation;
        let claimed_tier = sale.tier_index;
        let session = self.session.clone();
        self.tasks.spawn(async move {
            let result = session.request_ticket(account, claimed_tier).await;
            TaskOutcome::Ticket { generation, result }
        });
    }

    /// Forget the held ticket and invalidate any request still in flight.
    fn drop_ticket(&mut self, status: TicketStatus) {
        self.ticket_key = None;
        self.ticket_generation += 1;
        self.view.ticket = status;
    }

    fn on_ticket(&mut self, generation: u64, result: Result<IssuedTicket, StorefrontError>) {
        if generation != self.ticket_generation {
            debug!("Discarding ticket requested for a previous account or round");
            return;
        }
        self.view.ticket = match result {
            Ok(IssuedTicket::Signed(ticket)) => {
                info!("Holding ticket for {}", ticket.ticket);
                TicketStatus::Held(ticket)
            }
            Ok(IssuedTicket::Ineligible) => {
                info!("Account is not eligible for this round");
                TicketStatus::Ineligible
            }
            Err(e) => {
                warn!("Ticket request failed: {e}");
                TicketStatus::Failed(e.to_string())
            }
        };
    }

    fn on_account(&mut self, account: Option<Address>) {
        match &account {
            Some(address) => debug!("Poller switching to {}", format_address(address)),
            None => debug!("Poller lost the account"),
        }
        self.view.account = account;
        self.ticket_key = None;
        // Invalidate any request still in flight for the previous account.
        self.ticket_generation += 1;
        self.view.ticket = match account {
            Some(_) => TicketStatus::Pending,
            None => TicketStatus::NoAccount,
        };
        self.ensure_ticket();
        self.start_resolution();
    }

    fn on_command(&mut self, command: PollerCommand) {
        match command {
            PollerCommand::Refresh => self.start_resolution(),
            PollerCommand::Mint { amount, reply } => {
                // A command can arrive after a boundary and before the next
                // tick noticed it.
                let now = self.session.now();
                if let Some(boundary) = self
                    .view
                    .sale
                    .as_ref()
                    .filter(|sale| sale.is_stale(now))
                    .and_then(SaleState::boundary)
                {
                    debug!("Mint refused: sale state expired at {boundary}");
                    let _ = reply.send(Err(StorefrontError::StaleRound { boundary, now }));
                    self.start_resolution();
                    return;
                }
                let config = self.session.config();
                let order = match MintOrder::prepare(&self.view, amount, config.gas_limit) {
                    Ok(order) => order.or_unit_price(config.wei_cost),
                    Err(rejection) => {
                        debug!("Mint refused: {rejection}");
                        let _ = reply.send(Err(rejection.into()));
                        return;
                    }
                };
                info!(
                    "Minting {} for {} wei",
                    order.amount,
                    order.total_value()
                );
                self.view.minting = true;
                self.view.feedback = Some(format!("Minting your {}...", config.nft_name));
                let session = self.session.clone();
                self.tasks.spawn(async move {
                    let result = session.mint(&order).await;
                    TaskOutcome::Minted { result, reply }
                });
            }
        }
    }

    fn on_minted(
        &mut self,
        result: Result<MintReceipt, StorefrontError>,
        reply: oneshot::Sender<Result<MintReceipt, StorefrontError>>,
    ) {
        self.view.minting = false;
        let config = self.session.config();
        self.view.feedback = Some(match &result {
            Ok(receipt) => {
                info!("Mint confirmed in {:?}", receipt.transaction_hash);
                format!(
                    "WOW, the {} is yours! go visit {} to view it.",
                    config.nft_name, config.marketplace
                )
            }
            Err(e) => {
                error!("Mint failed: {e}");
                MINT_FAILED.to_string()
            }
        });
        // The caller may have given up waiting.
        let _ = reply.send(result);

        // Supply changed and the ticket may have been consumed.
        self.ticket_key = None;
        self.start_resolution();
    }

    /// A spawned task panicked. Its outcome is lost, so clear every busy
    /// flag and let the next tick start over.
    fn on_task_failure(&mut self, e: tokio::task::JoinError) {
        error!("Poller task failed: {e}");
        self.resolving = false;
        if self.view.minting {
            self.view.minting = false;
            self.view.feedback = Some(MINT_FAILED.to_string());
        }
        if self.view.ticket == TicketStatus::Pending {
            self.view.ticket = TicketStatus::Failed(e.to_string());
        }
    }
}
