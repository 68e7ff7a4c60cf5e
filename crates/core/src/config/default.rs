// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Returns `Default::default()` for every component. Used when no
//! configuration file is given on the command line, and in tests.

use super::ConfigProvider;

#[derive(Debug, Clone, Default)]
pub struct DefaultConfigProvider {}

impl ConfigProvider for DefaultConfigProvider {
    fn get_config<T: serde::de::DeserializeOwned + Default>(
        &self,
        _name: &'static str,
    ) -> Result<T, super::ConfigProviderError> {
        Ok(T::default())
    }
}
