// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Sale round configuration.
//!
//! Rounds are fixed when the sale is deployed. Each round covers the
//! half-open window `[start_time, end_time)` in unix seconds.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Eligibility level. A restricted round only accepts tickets for
/// addresses whose tier is at most the round's `tier_index`.
pub type Tier = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Minting requires a signed ticket.
    Restricted,
    /// Price decays over the round following the contract's formula.
    DecliningPrice,
    /// Anyone can mint at the base price.
    Open,
}

impl StageKind {
    pub fn requires_ticket(self) -> bool {
        matches!(self, StageKind::Restricted)
    }

    /// Decode the stage kind as stored by the sale contract.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(StageKind::Restricted),
            1 => Some(StageKind::DecliningPrice),
            2 => Some(StageKind::Open),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoundConfigError {
    #[error("Round {index} starts at {start_time} but ends at {end_time}")]
    EmptyWindow {
        index: u32,
        start_time: u64,
        end_time: u64,
    },
    #[error("Round {0} has a zero per-transaction cap")]
    ZeroPerTxCap(u32),
    #[error("Round {0} has a zero supply cap")]
    ZeroSupplyCap(u32),
    #[error("Round index {0} is configured more than once")]
    DuplicateIndex(u32),
    #[error("A sale needs at least one round")]
    NoRounds,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundConfig {
    pub index: u32,
    pub start_time: u64,
    pub end_time: u64,
    pub stage_kind: StageKind,
    #[serde(default)]
    pub tier_index: Tier,
    #[serde(with = "u256_dec")]
    pub base_price: U256,
    pub per_tx_cap: u32,
    pub supply_cap: u64,
}

impl RoundConfig {
    pub fn validate(&self) -> Result<(), RoundConfigError> {
        if self.start_time >= self.end_time {
            return Err(RoundConfigError::EmptyWindow {
                index: self.index,
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        if self.per_tx_cap == 0 {
            return Err(RoundConfigError::ZeroPerTxCap(self.index));
        }
        if self.supply_cap == 0 {
            return Err(RoundConfigError::ZeroSupplyCap(self.index));
        }
        Ok(())
    }

    /// Whether `now` falls inside `[start_time, end_time)`.
    pub fn contains(&self, now: u64) -> bool {
        self.start_time <= now && now < self.end_time
    }
}

/// Validated, index-ordered list of rounds. Never empty.
///
/// Rounds may leave gaps between each other. Overlapping windows are not
/// rejected; the lowest index wins when resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleSchedule {
    rounds: Vec<RoundConfig>,
}

impl SaleSchedule {
    pub fn new(mut rounds: Vec<RoundConfig>) -> Result<Self, RoundConfigError> {
        if rounds.is_empty() {
            return Err(RoundConfigError::NoRounds);
        }
        for round in &rounds {
            round.validate()?;
        }
        rounds.sort_by_key(|round| round.index);
        if let Some(pair) = rounds.windows(2).find(|pair| pair[0].index == pair[1].index) {
            return Err(RoundConfigError::DuplicateIndex(pair[0].index));
        }
        Ok(Self { rounds })
    }

    pub fn rounds(&self) -> &[RoundConfig] {
        &self.rounds
    }

    pub fn first(&self) -> &RoundConfig {
        &self.rounds[0]
    }

    pub fn last(&self) -> &RoundConfig {
        &self.rounds[self.rounds.len() - 1]
    }
}

/// Serde helper for wei amounts: written as a decimal string, read from a
/// decimal string, a `0x` hex string or a plain JSON integer.
pub mod u256_dec {
    use primitive_types::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Int(u64),
        Str(String),
    }

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Int(value) => Ok(U256::from(value)),
            Repr::Str(value) => match value.strip_prefix("0x") {
                Some(digits) => U256::from_str_radix(digits, 16)
                    .map_err(|e| serde::de::Error::custom(format!("{e:?}"))),
                None => U256::from_dec_str(&value)
                    .map_err(|e| serde::de::Error::custom(format!("{e:?}"))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use primitive_types::U256;

    use super::*;

    fn round(index: u32, start_time: u64, end_time: u64) -> RoundConfig {
        RoundConfig {
            index,
            start_time,
            end_time,
            stage_kind: StageKind::Open,
            tier_index: 0,
            base_price: U256::from(10),
            per_tx_cap: 5,
            supply_cap: 100,
        }
    }

    #[test]
    fn window_is_half_open() {
        let r = round(0, 100, 200);
        assert!(!r.contains(99));
        assert!(r.contains(100));
        assert!(r.contains(199));
        assert!(!r.contains(200));
    }

    #[test]
    fn validate_rejects_degenerate_rounds() {
        assert_eq!(
            round(3, 200, 200).validate(),
            Err(RoundConfigError::EmptyWindow {
                index: 3,
                start_time: 200,
                end_time: 200
            })
        );
        let mut no_cap = round(1, 0, 10);
        no_cap.per_tx_cap = 0;
        assert_eq!(no_cap.validate(), Err(RoundConfigError::ZeroPerTxCap(1)));
        let mut no_supply = round(2, 0, 10);
        no_supply.supply_cap = 0;
        assert_eq!(no_supply.validate(), Err(RoundConfigError::ZeroSupplyCap(2)));
    }

    #[test]
    fn schedule_orders_by_index() {
        let schedule = SaleSchedule::new(vec![round(1, 200, 300), round(0, 100, 200)]).unwrap();
        assert_eq!(schedule.first().index, 0);
        assert_eq!(schedule.last().index, 1);
    }

    #[test]
    fn schedule_rejects_duplicates_and_empty_sets() {
        assert_eq!(
            SaleSchedule::new(vec![round(0, 100, 200), round(0, 300, 400)]),
            Err(RoundConfigError::DuplicateIndex(0))
        );
        assert_eq!(SaleSchedule::new(vec![]), Err(RoundConfigError::NoRounds));
    }

    #[test]
    fn deserialize_round_from_config() {
        let raw = r#"{
            "index": 0,
            "startTime": 100,
            "endTime": 200,
            "stageKind": "restricted",
            "tierIndex": 1,
            "basePrice": "20000000000000000",
            "perTxCap": 1,
            "supplyCap": 500
        }"#;
        let parsed: RoundConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.stage_kind, StageKind::Restricted);
        assert_eq!(parsed.base_price, U256::from(20_000_000_000_000_000u64));
        assert!(parsed.stage_kind.requires_ticket());
    }

    #[test]
    fn base_price_accepts_hex_and_integers() {
        #[derive(serde::Deserialize)]
        struct Price(#[serde(with = "u256_dec")] U256);

        let hex: Price = serde_json::from_str("\"0xff\"").unwrap();
        assert_eq!(hex.0, U256::from(255));
        let int: Price = serde_json::from_str("30").unwrap();
        assert_eq!(int.0, U256::from(30));
        assert!(serde_json::from_str::<Price>("\"thirty\"").is_err());
    }
}
