// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Plumbing shared by the ticket service and the storefront client.

pub mod config;
pub mod hex_string;
