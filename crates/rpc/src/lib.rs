// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

pub mod errors;
pub mod handlers;
pub mod responses;
pub mod router;
pub mod server;
