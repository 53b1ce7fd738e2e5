//! The check-then-commit consumption protocol.

use crate::CreditDelta;
use chrono::Utc;
use manzai_core::{ConsumedFrom, LedgerState, MeteringPolicy, UsageRecord, UsageSnapshot, UserKey};
use manzai_error::LedgerResult;
use manzai_interface::UsageStore;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

/// Outcome of the read-only gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerCheck {
    /// Whether generation may proceed
    pub allowed: bool,
    /// Entitlement at check time
    pub state: LedgerState,
    /// Counters at check time; absent when unmetered
    pub snapshot: Option<UsageSnapshot>,
}

impl LedgerCheck {
    fn unmetered() -> Self {
        Self {
            allowed: true,
            state: LedgerState::Unmetered,
            snapshot: None,
        }
    }
}

/// Post-paid usage ledger over a [`UsageStore`].
///
/// Requests without a user key, and every request under
/// [`MeteringPolicy::Unmetered`], bypass the store entirely.
#[derive(Debug, Clone)]
pub struct UsageLedger<S> {
    store: S,
    policy: MeteringPolicy,
}

impl<S: UsageStore> UsageLedger<S> {
    /// Create a ledger.
    pub fn new(store: S, policy: MeteringPolicy) -> Self {
        Self { store, policy }
    }

    /// The metering policy in force.
    pub fn policy(&self) -> &MeteringPolicy {
        &self.policy
    }

    /// The backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn metered_key<'a>(&self, key: Option<&'a UserKey>) -> Option<&'a UserKey> {
        match self.policy {
            MeteringPolicy::Unmetered => None,
            MeteringPolicy::Metered { .. } => key,
        }
    }

    /// Decide whether a request may proceed. Never writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read; the caller must not
    /// proceed without knowing the entitlement.
    #[instrument(skip(self), fields(backend = self.store.backend_name()))]
    pub async fn check_only(&self, key: Option<&UserKey>) -> LedgerResult<LedgerCheck> {
        let Some(key) = self.metered_key(key) else {
            debug!("Unmetered request");
            return Ok(LedgerCheck::unmetered());
        };
        let record = self.store.read(key).await?;
        let snapshot = UsageSnapshot::of(&record, &self.policy);
        debug!(state = %snapshot.state, "Checked entitlement");
        Ok(LedgerCheck {
            allowed: snapshot.state.is_allowed(),
            state: snapshot.state,
            snapshot: Some(snapshot),
        })
    }

    /// Debit one generation after a successful request.
    ///
    /// Re-reads the record rather than trusting the earlier check, so a
    /// concurrent request may have exhausted the user in between; nothing is
    /// consumed in that case and [`ConsumedFrom::None`] is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    #[instrument(skip(self), fields(backend = self.store.backend_name()))]
    pub async fn commit_after_success(&self, key: Option<&UserKey>) -> LedgerResult<ConsumedFrom> {
        let Some(key) = self.metered_key(key) else {
            return Ok(ConsumedFrom::None);
        };
        let mut record = self.store.read(key).await?;
        let consumed = match LedgerState::classify(&record, &self.policy) {
            LedgerState::HasFreeQuota => {
                record.free_used_count = record.free_used_count.saturating_add(1);
                ConsumedFrom::Free
            }
            LedgerState::HasPaidCredit => {
                record.free_used_count = record.free_used_count.saturating_add(1);
                record.paid_credits -= 1;
                ConsumedFrom::Paid
            }
            LedgerState::Exhausted | LedgerState::Unmetered => {
                warn!("Nothing left to consume at commit time");
                return Ok(ConsumedFrom::None);
            }
        };
        record.updated_at = Some(Utc::now());
        self.store.upsert(key, &record).await?;
        info!(
            consumed_from = %consumed,
            free_used = record.free_used_count,
            paid_credits = record.paid_credits,
            "Committed usage"
        );
        Ok(consumed)
    }

    /// Current counters for a user. Never writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, key: &UserKey) -> LedgerResult<UsageSnapshot> {
        let record = self.store.read(key).await?;
        Ok(UsageSnapshot::of(&record, &self.policy))
    }

    /// Add purchased credits. The only path that increases `paid_credits`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    #[instrument(skip(self), fields(delta = delta.amount()))]
    pub async fn top_up(&self, key: &UserKey, delta: CreditDelta) -> LedgerResult<UsageRecord> {
        let mut record = self.store.read(key).await?;
        record.paid_credits = record.paid_credits.saturating_add(delta.amount());
        record.updated_at = Some(Utc::now());
        self.store.upsert(key, &record).await?;
        info!(paid_credits = record.paid_credits, "Added credits");
        Ok(record)
    }
}
