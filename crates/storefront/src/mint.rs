// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Mint transactions as the storefront builds them.

use mint_types::sale::SupplyStatus;
use primitive_types::{H256, U256};

use crate::poller::{PollerState, StorefrontView, TicketStatus};
use crate::ticket_client::SignedTicket;

/// Client side reasons for not sending a mint. The contract still has the
/// final say on anything that is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MintRejection {
    #[error("The sale is not open")]
    SaleNotOpen,
    #[error("The round is sold out")]
    SoldOut,
    #[error("No account is connected")]
    NoAccount,
    #[error("This round requires a whitelist ticket")]
    TicketRequired,
    #[error("A mint is already in progress")]
    Busy,
}

/// Keep an amount within `1..=per_tx_cap`.
pub fn clamp_amount(amount: u32, per_tx_cap: u32) -> u32 {
    amount.clamp(1, per_tx_cap.max(1))
}

pub fn increment(amount: u32, per_tx_cap: u32) -> u32 {
    clamp_amount(amount.saturating_add(1), per_tx_cap)
}

pub fn decrement(amount: u32, per_tx_cap: u32) -> u32 {
    clamp_amount(amount.saturating_sub(1), per_tx_cap)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOrder {
    pub amount: u32,
    pub unit_price: U256,
    pub gas_per_token: u64,
    /// Present exactly when the round requires a ticket.
    pub ticket: Option<SignedTicket>,
}

impl MintOrder {
    /// Build an order for `requested` tokens from the current view. The
    /// amount is clamped to the round's per-transaction cap and to what is
    /// left of its supply.
    pub fn prepare(
        view: &StorefrontView,
        requested: u32,
        gas_per_token: u64,
    ) -> Result<Self, MintRejection> {
        if view.minting {
            return Err(MintRejection::Busy);
        }
        let sale = match (&view.state, &view.sale) {
            (PollerState::Open { .. }, Some(sale)) if sale.is_open() => sale,
            _ => return Err(MintRejection::SaleNotOpen),
        };
        let remaining = match view.supply {
            Some(SupplyStatus::Available { remaining }) => remaining,
            Some(SupplyStatus::SoldOut) => return Err(MintRejection::SoldOut),
            None => return Err(MintRejection::SaleNotOpen),
        };
        if view.account.is_none() {
            return Err(MintRejection::NoAccount);
        }
        let ticket = match (&view.ticket, sale.requires_ticket) {
            (TicketStatus::Held(ticket), true) => Some(ticket.clone()),
            (_, true) => return Err(MintRejection::TicketRequired),
            (_, false) => None,
        };

        let amount = clamp_amount(requested, sale.per_tx_cap);
        let amount = u32::try_from(remaining).map_or(amount, |remaining| amount.min(remaining));
        Ok(Self {
            amount,
            unit_price: sale.effective_price,
            gas_per_token,
            ticket,
        })
    }

    /// Use `fallback` when the contract reported no price, as the storefront
    /// does with its configured `WEI_COST`.
    pub fn or_unit_price(mut self, fallback: U256) -> Self {
        if self.unit_price.is_zero() {
            self.unit_price = fallback;
        }
        self
    }

    pub fn total_value(&self) -> U256 {
        self.unit_price.saturating_mul(U256::from(self.amount))
    }

    pub fn total_gas(&self) -> U256 {
        U256::from(self.gas_per_token) * U256::from(self.amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintReceipt {
    pub transaction_hash: H256,
}

#[cfg(test)]
mod tests {
    use libsecp256k1::SecretKey;
    use mint_types::address::Address;
    use mint_types::round::StageKind;
    use mint_types::sale::{SalePhase, SaleState};
    use mint_types::signature::TicketSignature;
    use mint_types::ticket::Ticket;

    use super::*;

    fn sale(stage_kind: StageKind, per_tx_cap: u32) -> SaleState {
        SaleState {
            phase: SalePhase::Open { countdown: 10 },
            active_round_index: Some(0),
            round_index: 0,
            stage_kind,
            tier_index: 1,
            effective_price: U256::from(1_000),
            round_start: 100,
            round_end: 200,
            requires_ticket: stage_kind.requires_ticket(),
            per_tx_cap,
            supply_cap: 10,
        }
    }

    fn view(sale: SaleState, remaining: u64) -> StorefrontView {
        StorefrontView {
            state: PollerState::Open { countdown: 10 },
            sale: Some(sale),
            total_issued: Some(10 - remaining),
            supply: Some(if remaining == 0 {
                SupplyStatus::SoldOut
            } else {
                SupplyStatus::Available { remaining }
            }),
            account: Some(Address::repeat_byte(0xaa)),
            ..StorefrontView::default()
        }
    }

    fn signed_ticket() -> SignedTicket {
        let ticket = Ticket::new(Address::repeat_byte(0xaa));
        let key = SecretKey::parse(&[0x46u8; 32]).unwrap();
        SignedTicket {
            signature: TicketSignature::create(&ticket.signable_digest(), &key),
            ticket,
        }
    }

    #[test]
    fn test_amount_stays_within_cap() {
        assert_eq!(clamp_amount(0, 5), 1);
        assert_eq!(clamp_amount(9, 5), 5);
        assert_eq!(increment(5, 5), 5);
        assert_eq!(increment(2, 5), 3);
        assert_eq!(decrement(1, 5), 1);
        assert_eq!(decrement(4, 5), 3);
    }

    #[test]
    fn test_order_totals() {
        let order = MintOrder::prepare(&view(sale(StageKind::Open, 5), 10), 3, 285_000).unwrap();
        assert_eq!(order.amount, 3);
        assert_eq!(order.total_value(), U256::from(3_000));
        assert_eq!(order.total_gas(), U256::from(855_000));
        assert_eq!(order.ticket, None);
    }

    #[test]
    fn test_configured_cost_replaces_missing_price() {
        let mut free = sale(StageKind::Open, 5);
        free.effective_price = U256::zero();
        let order = MintOrder::prepare(&view(free, 10), 2, 1)
            .unwrap()
            .or_unit_price(U256::from(75));
        assert_eq!(order.total_value(), U256::from(150));

        let priced = MintOrder::prepare(&view(sale(StageKind::Open, 5), 10), 1, 1)
            .unwrap()
            .or_unit_price(U256::from(75));
        assert_eq!(priced.unit_price, U256::from(1_000));
    }

    #[test]
    fn test_order_clamped_to_cap_and_supply() {
        let capped = MintOrder::prepare(&view(sale(StageKind::Open, 5), 10), 8, 1).unwrap();
        assert_eq!(capped.amount, 5);
        let scarce = MintOrder::prepare(&view(sale(StageKind::Open, 5), 2), 4, 1).unwrap();
        assert_eq!(scarce.amount, 2);
    }

    #[test]
    fn test_restricted_round_needs_ticket() {
        let mut view = view(sale(StageKind::Restricted, 1), 10);
        view.ticket = TicketStatus::Ineligible;
        assert_eq!(
            MintOrder::prepare(&view, 1, 1),
            Err(MintRejection::TicketRequired)
        );

        view.ticket = TicketStatus::Held(signed_ticket());
        let order = MintOrder::prepare(&view, 1, 1).unwrap();
        assert_eq!(order.ticket, Some(signed_ticket()));
    }

    #[test]
    fn test_refusals() {
        let base = view(sale(StageKind::Open, 5), 10);

        let sold_out = view(sale(StageKind::Open, 5), 0);
        assert_eq!(MintOrder::prepare(&sold_out, 1, 1), Err(MintRejection::SoldOut));

        let mut locked = base.clone();
        locked.state = PollerState::Locked { countdown: 5 };
        assert_eq!(MintOrder::prepare(&locked, 1, 1), Err(MintRejection::SaleNotOpen));

        let mut anonymous = base.clone();
        anonymous.account = None;
        assert_eq!(MintOrder::prepare(&anonymous, 1, 1), Err(MintRejection::NoAccount));

        let mut busy = base;
        busy.minting = true;
        assert_eq!(MintOrder::prepare(&busy, 1, 1), Err(MintRejection::Busy));
    }
}
