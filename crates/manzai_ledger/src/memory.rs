//! Process-local usage store.

use async_trait::async_trait;
use manzai_core::{UsageRecord, UserKey};
use manzai_error::LedgerResult;
use manzai_interface::UsageStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Usage records held in memory; lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryUsageStore {
    records: RwLock<HashMap<UserKey, UsageRecord>>,
}

impl InMemoryUsageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = (UserKey, UsageRecord)>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
        }
    }

    /// Number of users with a stored record.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when no user has a stored record.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn read(&self, key: &UserKey) -> LedgerResult<UsageRecord> {
        Ok(self
            .records
            .read()
            .await
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert(&self, key: &UserKey, record: &UsageRecord) -> LedgerResult<()> {
        self.records
            .write()
            .await
            .insert(key.clone(), record.clone());
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
