// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Component configuration interface.
//!
//! The ticket service and the storefront each read a typed configuration
//! section by component name. Sections are deserialized lazily, so one file
//! can carry the settings of every component while each crate only knows
//! about its own type.
//!
//! Configuration types must implement `Default` and `Deserialize`. Missing
//! fields fall back to defaults when the type says so through serde:
//!
//! ```ignore
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct TicketConfig {
//!     pub signer_key_env: String,
//!     pub eligibility_file: Option<PathBuf>,
//! }
//! ```
//!
//! Secrets (signing keys, wallet keys) are never part of a section; the
//! sections only name the environment variables that hold them.

pub mod default;
pub mod file;

use serde::de::DeserializeOwned;

#[derive(Debug, thiserror::Error)]
pub enum ConfigProviderError {
    #[error("Internal config provider error: {0}")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("Cannot read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration file is not a JSON object")]
    NotAnObject,
    #[error("Configuration section '{name}' is malformed: {source}")]
    MalformedSection {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl From<serde_json::Error> for ConfigProviderError {
    fn from(error: serde_json::Error) -> Self {
        Self::Internal(Box::new(error))
    }
}

pub trait ConfigProvider: Send + Sync + 'static {
    /// Get configuration for a particular component given its name.
    fn get_config<T: DeserializeOwned + Default>(
        &self,
        name: &'static str,
    ) -> Result<T, ConfigProviderError>;
}
