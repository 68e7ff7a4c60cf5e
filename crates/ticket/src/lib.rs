// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Whitelist ticket service: signs tickets for eligible addresses and
//! exposes the authority over HTTP.

pub mod authority;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod rpc;
pub mod signer;
