// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the section holding [TicketConfig] in the node configuration file.
pub const TICKET_CONFIG_SECTION: &str = "ticket";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TicketConfig {
    /// Environment variable holding the hex encoded signing key. The key
    /// itself never goes into the configuration file.
    pub signer_key_env: String,
    /// JSON object mapping addresses to tiers.
    pub eligibility_file: Option<PathBuf>,
    pub lookup_timeout_ms: u64,
}

impl TicketConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            signer_key_env: "TICKET_SIGNER_KEY".to_string(),
            eligibility_file: None,
            lookup_timeout_ms: 5_000,
        }
    }
}
