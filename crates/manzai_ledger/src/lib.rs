//! Usage metering for the manzai script generator.
//!
//! The [`UsageLedger`] implements a post-paid protocol: a request is gated
//! with a read-only [`check_only`](UsageLedger::check_only), and a unit is
//! debited with [`commit_after_success`](UsageLedger::commit_after_success)
//! only once a non-empty script exists. Failed requests never touch the
//! store.
//!
//! Two [`UsageStore`](manzai_interface::UsageStore) backends are provided:
//! [`InMemoryUsageStore`] for tests and development, and
//! [`FileSystemUsageStore`] for a durable single-node deployment.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod delta;
mod filesystem;
mod ledger;
mod memory;

pub use delta::{CreditDelta, MAX_CREDIT_DELTA};
pub use filesystem::FileSystemUsageStore;
pub use ledger::{LedgerCheck, UsageLedger};
pub use memory::InMemoryUsageStore;
