//! Usage ledger records and the states derived from them.

use crate::MeteringPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persistent per-user counters.
///
/// Both counters are non-negative by construction. `free_used_count` only
/// grows; `paid_credits` shrinks on consumption and grows only via top-up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    /// Metered generations performed so far
    #[serde(default)]
    pub free_used_count: u32,
    /// Purchased generations remaining
    #[serde(default)]
    pub paid_credits: u32,
    /// Last write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UsageRecord {
    /// A record with the given counters and no timestamp.
    pub fn new(free_used_count: u32, paid_credits: u32) -> Self {
        Self {
            free_used_count,
            paid_credits,
            updated_at: None,
        }
    }
}

/// Entitlement of one user at one instant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LedgerState {
    /// No user key or metering disabled; no bookkeeping
    Unmetered,
    /// Free generations remain
    HasFreeQuota,
    /// Free quota spent, paid credits remain
    HasPaidCredit,
    /// Nothing left
    Exhausted,
}

impl LedgerState {
    /// Classify a record under a metering policy.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_core::{LedgerState, MeteringPolicy, UsageRecord};
    ///
    /// let policy = MeteringPolicy::Metered { free_quota: 20 };
    /// assert_eq!(LedgerState::classify(&UsageRecord::new(5, 0), &policy), LedgerState::HasFreeQuota);
    /// assert_eq!(LedgerState::classify(&UsageRecord::new(20, 3), &policy), LedgerState::HasPaidCredit);
    /// assert_eq!(LedgerState::classify(&UsageRecord::new(20, 0), &policy), LedgerState::Exhausted);
    /// ```
    pub fn classify(record: &UsageRecord, policy: &MeteringPolicy) -> Self {
        match policy {
            MeteringPolicy::Unmetered => LedgerState::Unmetered,
            MeteringPolicy::Metered { free_quota } => {
                if record.free_used_count < *free_quota {
                    LedgerState::HasFreeQuota
                } else if record.paid_credits > 0 {
                    LedgerState::HasPaidCredit
                } else {
                    LedgerState::Exhausted
                }
            }
        }
    }

    /// Whether a generation may proceed in this state.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, LedgerState::Exhausted)
    }
}

/// Where a committed generation was charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConsumedFrom {
    /// Free quota
    Free,
    /// Paid credits
    Paid,
    /// Nothing; unmetered, or lost a race against another request
    None,
}

/// Read-only view of a user's ledger, returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Metered generations performed so far
    pub free_used_count: u32,
    /// Purchased generations remaining
    pub paid_credits: u32,
    /// Free generations per user
    pub free_quota: u32,
    /// Free generations still available
    pub free_remaining: u32,
    /// Derived entitlement
    pub state: LedgerState,
}

impl UsageSnapshot {
    /// Snapshot a record under a metering policy.
    pub fn of(record: &UsageRecord, policy: &MeteringPolicy) -> Self {
        let free_quota = match policy {
            MeteringPolicy::Metered { free_quota } => *free_quota,
            MeteringPolicy::Unmetered => 0,
        };
        Self {
            free_used_count: record.free_used_count,
            paid_credits: record.paid_credits,
            free_quota,
            free_remaining: free_quota.saturating_sub(record.free_used_count),
            state: LedgerState::classify(record, policy),
        }
    }
}
