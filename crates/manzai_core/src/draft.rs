//! Working script value threaded through the shaping pipeline.

use serde::{Deserialize, Serialize};

/// Title used when the generated text carries none.
pub const DEFAULT_TITLE: &str = "無題";

/// A script under construction.
///
/// Created from raw model output, then rewritten in place by each shaping
/// stage. Every stage is idempotent, so re-running the chain after a
/// continuation is safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScriptDraft {
    /// Title line; may be empty until the response is packaged
    pub title: String,
    /// Dialogue body
    pub body: String,
}

impl ScriptDraft {
    /// Create a draft from parts.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Title to show the caller, falling back to a placeholder.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_core::ScriptDraft;
    ///
    /// assert_eq!(ScriptDraft::new("", "A: hi").display_title(), "無題");
    /// assert_eq!(ScriptDraft::new("回転寿司", "A: hi").display_title(), "回転寿司");
    /// ```
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            DEFAULT_TITLE
        } else {
            &self.title
        }
    }

    /// True when the body has no visible content.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}
