// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! JSON file configuration provider.
//!
//! The file is a single object whose top-level keys are component names:
//!
//! ```json
//! {
//!   "ticket": { "signerKeyEnv": "TICKET_SIGNER_KEY" },
//!   "storefront": { "CONTRACT_ADDRESS": "0x..." }
//! }
//! ```
//!
//! The file is read once when the provider is created.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use super::{ConfigProvider, ConfigProviderError};

#[derive(Debug, Clone, Default)]
pub struct JsonFileConfigProvider {
    sections: Map<String, Value>,
}

impl JsonFileConfigProvider {
    pub fn load(path: &Path) -> Result<Self, ConfigProviderError> {
        let raw = std::fs::read_to_string(path)?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigProviderError> {
        match serde_json::from_str::<Value>(raw)? {
            Value::Object(sections) => Ok(Self { sections }),
            _ => Err(ConfigProviderError::NotAnObject),
        }
    }
}

impl ConfigProvider for JsonFileConfigProvider {
    fn get_config<T: DeserializeOwned + Default>(
        &self,
        name: &'static str,
    ) -> Result<T, ConfigProviderError> {
        match self.sections.get(name) {
            Some(section) => serde_json::from_value(section.clone())
                .map_err(|source| ConfigProviderError::MalformedSection { name, source }),
            None => {
                debug!("No '{name}' section in configuration, using defaults");
                Ok(T::default())
            }
        }
    }
}
