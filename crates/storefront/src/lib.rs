// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Client side of the sale: resolves the current round, keeps a ticket for
//! the connected account and submits mint transactions.

pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod mint;
pub mod poller;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod ticket_client;
