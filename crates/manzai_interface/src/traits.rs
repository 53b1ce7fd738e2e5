//! Collaborator traits.

use async_trait::async_trait;
use manzai_core::{GenerateRequest, GenerateResponse, UsageRecord, UserKey};
use manzai_error::{GenerationResult, LedgerResult};
use std::sync::Arc;

/// Text-generation backend.
///
/// Implementations send one request and return raw text or a classified
/// failure. They must not retry on their own; the caller decides how many
/// attempts a stage gets.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for a request.
    async fn generate(&self, req: &GenerateRequest) -> GenerationResult<GenerateResponse>;

    /// Provider name (e.g., "openai").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gpt-4o-mini").
    fn model_name(&self) -> &str;
}

/// Key-value persistence for usage records.
///
/// Only single-key reads and upserts are required. Upsert is assumed atomic
/// per key; no isolation across calls is assumed.
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Read a user's record, or a zero-valued record when none exists.
    async fn read(&self, key: &UserKey) -> LedgerResult<UsageRecord>;

    /// Insert or replace a user's record.
    async fn upsert(&self, key: &UserKey, record: &UsageRecord) -> LedgerResult<()>;

    /// Backend name for logging (e.g., "memory", "filesystem").
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn generate(&self, req: &GenerateRequest) -> GenerationResult<GenerateResponse> {
        (**self).generate(req).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

#[async_trait]
impl<T: UsageStore + ?Sized> UsageStore for Arc<T> {
    async fn read(&self, key: &UserKey) -> LedgerResult<UsageRecord> {
        (**self).read(key).await
    }

    async fn upsert(&self, key: &UserKey, record: &UsageRecord) -> LedgerResult<()> {
        (**self).upsert(key, record).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
