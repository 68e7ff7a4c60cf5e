// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Sale stage resolution.
//!
//! Given a time and the schedule, decide which round the sale is in and
//! what a mint costs. Locating the round is pure; pricing a declining-price
//! round needs one read of the contract's decay formula.

use async_trait::async_trait;
use mint_types::round::{RoundConfig, SaleSchedule, StageKind};
use mint_types::sale::{SalePhase, SaleState};
use primitive_types::U256;
use tracing::debug;

use crate::error::ChainError;

/// The contract's price decay formula, evaluated at an absolute time.
#[async_trait]
pub trait DecliningPrice: Send + Sync {
    async fn declining_price(&self, at_time: u64) -> Result<U256, ChainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundWindow<'a> {
    /// Before the first round.
    NotYetOpen { next: &'a RoundConfig },
    Active(&'a RoundConfig),
    /// Between two rounds.
    Gap { next: &'a RoundConfig },
    /// After the last round.
    Ended { last: &'a RoundConfig },
}

/// Find where `now` falls in the schedule. The first round in index order
/// whose window contains `now` is the active one.
pub fn locate(now: u64, schedule: &SaleSchedule) -> RoundWindow<'_> {
    let rounds = schedule.rounds();
    if let Some(active) = rounds.iter().find(|round| round.contains(now)) {
        return RoundWindow::Active(active);
    }
    let first = schedule.first();
    if now < first.start_time {
        return RoundWindow::NotYetOpen { next: first };
    }
    match rounds.iter().find(|round| round.start_time > now) {
        Some(next) => RoundWindow::Gap { next },
        None => RoundWindow::Ended {
            last: schedule.last(),
        },
    }
}

pub async fn resolve<P>(
    now: u64,
    schedule: &SaleSchedule,
    pricing: &P,
) -> Result<SaleState, ChainError>
where
    P: DecliningPrice + ?Sized,
{
    let (phase, round) = match locate(now, schedule) {
        RoundWindow::NotYetOpen { next } | RoundWindow::Gap { next } => (
            SalePhase::Locked {
                countdown: next.start_time - now,
            },
            next,
        ),
        RoundWindow::Active(round) => (
            SalePhase::Open {
                countdown: round.end_time - now,
            },
            round,
        ),
        RoundWindow::Ended { last } => (SalePhase::Closed, last),
    };

    let open = matches!(phase, SalePhase::Open { .. });
    let effective_price = if open && round.stage_kind == StageKind::DecliningPrice {
        pricing.declining_price(now).await?
    } else {
        round.base_price
    };
    debug!("Resolved sale at {now}: round {} {:?}", round.index, phase);

    Ok(SaleState {
        phase,
        active_round_index: open.then_some(round.index),
        round_index: round.index,
        stage_kind: round.stage_kind,
        tier_index: round.tier_index,
        effective_price,
        round_start: round.start_time,
        round_end: round.end_time,
        requires_ticket: round.stage_kind.requires_ticket(),
        per_tx_cap: round.per_tx_cap,
        supply_cap: round.supply_cap,
    })
}
