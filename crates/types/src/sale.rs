// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Derived sale state. Recomputed on every resolution, never persisted.

use primitive_types::U256;
use serde::Serialize;

use crate::round::{u256_dec, StageKind, Tier};

/// Where the sale stands relative to the round described by a [SaleState].
/// Countdowns are in seconds and are only exact at the instant the state
/// was resolved; use [SaleState::countdown_at] afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SalePhase {
    /// No round is active. Counts down to the start of the described round,
    /// either the first one or the one after a gap.
    Locked { countdown: u64 },
    /// The described round is active. Counts down to its end.
    Open { countdown: u64 },
    /// The last round has ended. The sale window is over, which is not the
    /// same thing as being sold out.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleState {
    pub phase: SalePhase,
    /// Set only while a round is open.
    pub active_round_index: Option<u32>,
    /// Round described by this state: upcoming while locked, active while
    /// open, last one once closed. Never decreases as time advances.
    pub round_index: u32,
    pub stage_kind: StageKind,
    pub tier_index: Tier,
    #[serde(with = "u256_dec")]
    pub effective_price: U256,
    pub round_start: u64,
    pub round_end: u64,
    pub requires_ticket: bool,
    pub per_tx_cap: u32,
    pub supply_cap: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "supply", rename_all = "snake_case")]
pub enum SupplyStatus {
    Available { remaining: u64 },
    SoldOut,
}

impl SaleState {
    pub fn is_open(&self) -> bool {
        matches!(self.phase, SalePhase::Open { .. })
    }

    /// Next instant at which this state stops describing the sale.
    pub fn boundary(&self) -> Option<u64> {
        match self.phase {
            SalePhase::Locked { .. } => Some(self.round_start),
            SalePhase::Open { .. } => Some(self.round_end),
            SalePhase::Closed => None,
        }
    }

    /// Seconds left until [Self::boundary] at time `now`.
    pub fn countdown_at(&self, now: u64) -> Option<u64> {
        self.boundary().map(|boundary| boundary.saturating_sub(now))
    }

    /// A state is stale once its boundary has passed: it must be resolved
    /// again rather than reused.
    pub fn is_stale(&self, now: u64) -> bool {
        self.boundary().is_some_and(|boundary| now >= boundary)
    }

    /// Compare the contract's live issuance counter against the round's cap.
    pub fn supply_status(&self, total_issued: u64) -> SupplyStatus {
        if total_issued >= self.supply_cap {
            SupplyStatus::SoldOut
        } else {
            SupplyStatus::Available {
                remaining: self.supply_cap - total_issued,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use primitive_types::U256;

    use super::*;

    fn open_state() -> SaleState {
        SaleState {
            phase: SalePhase::Open { countdown: 50 },
            active_round_index: Some(0),
            round_index: 0,
            stage_kind: StageKind::Restricted,
            tier_index: 1,
            effective_price: U256::from(10),
            round_start: 100,
            round_end: 200,
            requires_ticket: true,
            per_tx_cap: 1,
            supply_cap: 10,
        }
    }

    #[test]
    fn countdown_tracks_the_boundary() {
        let state = open_state();
        assert_eq!(state.countdown_at(150), Some(50));
        assert_eq!(state.countdown_at(199), Some(1));
        assert!(!state.is_stale(199));
        assert!(state.is_stale(200));
    }

    #[test]
    fn closed_state_never_goes_stale() {
        let state = SaleState {
            phase: SalePhase::Closed,
            active_round_index: None,
            ..open_state()
        };
        assert_eq!(state.boundary(), None);
        assert!(!state.is_stale(u64::MAX));
    }

    #[test]
    fn supply_status_uses_live_counter() {
        let state = open_state();
        assert_eq!(
            state.supply_status(4),
            SupplyStatus::Available { remaining: 6 }
        );
        assert_eq!(state.supply_status(10), SupplyStatus::SoldOut);
        assert_eq!(state.supply_status(11), SupplyStatus::SoldOut);
    }
}
