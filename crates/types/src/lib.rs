// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Domain types shared between the ticket service and the storefront.

pub mod address;
pub mod round;
pub mod sale;
pub mod signature;
pub mod ticket;
