// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Read-only access to the eligibility store.
//!
//! The store is owned elsewhere; the ticket service only ever asks which
//! tier an address holds.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mint_types::address::{parse_address, Address};
use mint_types::round::Tier;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::EligibilityError;

#[async_trait]
pub trait EligibilityStore: Send + Sync + 'static {
    /// Tier held by `address`, or `None` when it has no record.
    async fn lookup_tier(&self, address: &Address) -> Result<Option<Tier>, EligibilityError>;
}

#[async_trait]
impl<E: EligibilityStore + ?Sized> EligibilityStore for Arc<E> {
    async fn lookup_tier(&self, address: &Address) -> Result<Option<Tier>, EligibilityError> {
        (**self).lookup_tier(address).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityRecord {
    pub address: Address,
    pub tier: Tier,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEligibility {
    records: HashMap<Address, Tier>,
}

impl InMemoryEligibility {
    pub fn from_records(records: impl IntoIterator<Item = EligibilityRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.address, record.tier))
                .collect(),
        }
    }

    /// Parse `{"0x<address>": <tier>, ...}`.
    pub fn from_json(json: &str) -> Result<Self, EligibilityError> {
        let raw: HashMap<String, Tier> = serde_json::from_str(json)?;
        let records = raw
            .into_iter()
            .map(|(address, tier)| match parse_address(&address) {
                Ok(address) => Ok(EligibilityRecord { address, tier }),
                Err(source) => Err(EligibilityError::InvalidRecord { address, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_records(records))
    }

    pub fn load_json(path: &Path) -> Result<Self, EligibilityError> {
        let store = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(
            "Loaded {} eligibility records from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl EligibilityStore for InMemoryEligibility {
    async fn lookup_tier(&self, address: &Address) -> Result<Option<Tier>, EligibilityError> {
        Ok(self.records.get(address).copied())
    }
}

/// Bounds every lookup of the wrapped store by a timeout.
#[derive(Debug, Clone)]
pub struct TimeoutStore<E> {
    inner: E,
    timeout: Duration,
}

impl<E> TimeoutStore<E> {
    pub fn new(inner: E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<E: EligibilityStore> EligibilityStore for TimeoutStore<E> {
    async fn lookup_tier(&self, address: &Address) -> Result<Option<Tier>, EligibilityError> {
        tokio::time::timeout(self.timeout, self.inner.lookup_tier(address))
            .await
            .map_err(|_| EligibilityError::Timeout(self.timeout))?
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const ADDRESS: &str = "0x331e14e9e312a28c816f630215688f7f5ea593bb";

    struct Stalled;

    #[async_trait]
    impl EligibilityStore for Stalled {
        async fn lookup_tier(&self, _: &Address) -> Result<Option<Tier>, EligibilityError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_lookup_known_and_unknown() {
        let store = InMemoryEligibility::from_json(&format!(r#"{{"{ADDRESS}": 2}}"#)).unwrap();
        let known = parse_address(ADDRESS).unwrap();
        assert_eq!(store.lookup_tier(&known).await.unwrap(), Some(2));
        assert_eq!(store.lookup_tier(&Address::zero()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_checksummed_keys_are_normalised() {
        let store =
            InMemoryEligibility::from_json(r#"{"0x331e14E9e312A28C816F630215688f7f5eA593Bb": 1}"#)
                .unwrap();
        let address = parse_address(ADDRESS).unwrap();
        assert_eq!(store.lookup_tier(&address).await.unwrap(), Some(1));
    }

    #[test]
    fn test_invalid_record_is_rejected() {
        assert!(matches!(
            InMemoryEligibility::from_json(r#"{"0xA": 2}"#),
            Err(EligibilityError::InvalidRecord { .. })
        ));
        assert!(matches!(
            InMemoryEligibility::from_json("[]"),
            Err(EligibilityError::Malformed(_))
        ));
    }

    #[test]
    fn test_load_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"{ADDRESS}": 3}}"#).unwrap();
        let store = InMemoryEligibility::load_json(file.path()).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_store() {
        let store = TimeoutStore::new(Stalled, Duration::from_millis(50));
        assert!(matches!(
            store.lookup_tier(&Address::zero()).await,
            Err(EligibilityError::Timeout(_))
        ));
    }
}
