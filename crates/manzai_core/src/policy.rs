//! Policies that parameterize the pipeline per deployment.

use serde::{Deserialize, Serialize};

/// Unit used when measuring script length.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::EnumString,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CountUnit {
    /// One per Unicode scalar value; astral characters count once.
    #[default]
    CodePoint,
    /// One per UTF-16 code unit; astral characters count twice.
    Utf16,
}

/// How characters are counted against the length contract.
///
/// # Examples
///
/// ```
/// use manzai_core::{CountUnit, CountingPolicy};
///
/// let policy = CountingPolicy::default();
/// assert_eq!(policy.unit, CountUnit::CodePoint);
/// assert!(policy.exclude_newlines);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CountingPolicy {
    /// Measurement unit
    #[serde(default)]
    pub unit: CountUnit,
    /// Whether line breaks (and carriage returns) are free
    #[serde(default = "default_true")]
    pub exclude_newlines: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CountingPolicy {
    fn default() -> Self {
        Self {
            unit: CountUnit::CodePoint,
            exclude_newlines: true,
        }
    }
}

/// How the requested length turns into an accepted interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum LengthPolicy {
    /// Accept `target ± percent%`, never above the ceiling.
    StrictBand {
        /// Half-width of the band as a percentage of the target
        percent: u32,
    },
    /// Treat the target as a ceiling only.
    Ceiling,
}

impl Default for LengthPolicy {
    fn default() -> Self {
        LengthPolicy::StrictBand { percent: 10 }
    }
}

impl LengthPolicy {
    /// Compute the accepted interval for a target.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_core::LengthPolicy;
    ///
    /// let band = LengthPolicy::StrictBand { percent: 10 }.bounds(500, 2000);
    /// assert_eq!((band.min, band.max), (450, 550));
    ///
    /// let capped = LengthPolicy::StrictBand { percent: 10 }.bounds(2000, 2000);
    /// assert_eq!(capped.max, 2000);
    ///
    /// let ceiling = LengthPolicy::Ceiling.bounds(500, 2000);
    /// assert_eq!((ceiling.min, ceiling.max), (1, 500));
    /// ```
    pub fn bounds(&self, target: u32, ceiling: u32) -> LengthBounds {
        let target = target.clamp(1, ceiling.max(1));
        match self {
            LengthPolicy::StrictBand { percent } => {
                let delta = target.saturating_mul(*percent) / 100;
                LengthBounds {
                    target,
                    min: target.saturating_sub(delta).max(1),
                    max: target.saturating_add(delta).min(ceiling.max(1)),
                }
            }
            LengthPolicy::Ceiling => LengthBounds {
                target,
                min: 1,
                max: target,
            },
        }
    }
}

/// Closed interval a finished script must land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LengthBounds {
    /// Requested length after clamping
    pub target: u32,
    /// Lower bound (inclusive)
    pub min: u32,
    /// Upper bound (inclusive)
    pub max: u32,
}

/// What to do with a requested length above the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Clamp into range; unusable values fall back to the default target.
    #[default]
    Clamp,
    /// Reject with a validation error.
    Reject,
}

/// Rules for turning the caller's `length` into a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LengthRules {
    /// Target used when the caller sends nothing usable
    pub default_target: u32,
    /// Hard ceiling on any script
    pub ceiling: u32,
    /// Handling of out-of-range values
    pub out_of_range: OutOfRange,
}

impl Default for LengthRules {
    fn default() -> Self {
        Self {
            default_target: 300,
            ceiling: 2000,
            out_of_range: OutOfRange::Clamp,
        }
    }
}

/// Whether requests are charged against the usage ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MeteringPolicy {
    /// Requests with a user key consume free quota, then paid credits.
    Metered {
        /// Free generations per user before credits are needed
        free_quota: u32,
    },
    /// No bookkeeping at all.
    Unmetered,
}

impl Default for MeteringPolicy {
    fn default() -> Self {
        MeteringPolicy::Metered { free_quota: 20 }
    }
}
