//! Usage stores that fail or keep count.

use async_trait::async_trait;
use manzai_core::{UsageRecord, UserKey};
use manzai_error::{LedgerError, LedgerErrorKind, LedgerResult};
use manzai_interface::UsageStore;
use manzai_ledger::InMemoryUsageStore;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store whose reads and/or writes always fail.
#[derive(Debug, Default)]
pub struct FailingUsageStore {
    inner: InMemoryUsageStore,
    reads_succeed: bool,
}

impl FailingUsageStore {
    /// Every operation fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads work against an empty store; writes fail.
    pub fn failing_writes() -> Self {
        Self {
            inner: InMemoryUsageStore::new(),
            reads_succeed: true,
        }
    }
}

#[async_trait]
impl UsageStore for FailingUsageStore {
    async fn read(&self, key: &UserKey) -> LedgerResult<UsageRecord> {
        if self.reads_succeed {
            return self.inner.read(key).await;
        }
        Err(LedgerError::new(LedgerErrorKind::Unavailable(
            "store offline".to_string(),
        )))
    }

    async fn upsert(&self, _key: &UserKey, _record: &UsageRecord) -> LedgerResult<()> {
        Err(LedgerError::new(LedgerErrorKind::Write(
            "disk full".to_string(),
        )))
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// In-memory store that counts every call.
#[derive(Debug, Default)]
pub struct CountingUsageStore {
    inner: InMemoryUsageStore,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl CountingUsageStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads performed.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Upserts performed.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageStore for CountingUsageStore {
    async fn read(&self, key: &UserKey) -> LedgerResult<UsageRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key).await
    }

    async fn upsert(&self, key: &UserKey, record: &UsageRecord) -> LedgerResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(key, record).await
    }

    fn backend_name(&self) -> &'static str {
        "counting"
    }
}
