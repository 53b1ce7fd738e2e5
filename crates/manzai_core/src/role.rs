//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Chat roles understood by generation backends.
///
/// # Examples
///
/// ```
/// use manzai_core::Role;
///
/// assert_ne!(Role::System, Role::User);
/// assert_eq!(Role::Assistant.as_str(), "assistant");
/// assert_eq!(format!("{}", Role::System), "System");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Standing instructions for the model
    System,
    /// The request itself
    User,
    /// Earlier model output
    Assistant,
}

impl Role {
    /// Wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}
