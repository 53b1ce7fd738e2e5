//! Per-request prompt plan.

use crate::LengthBounds;
use serde::{Deserialize, Serialize};

/// Opaque instructions for the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstructionPayload {
    /// Standing system instructions
    pub system: String,
    /// The request itself
    pub user: String,
}

/// Everything downstream stages need to know about one request.
///
/// Built once by the prompt assembler and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PromptPlan {
    /// Instructions for the first generation call
    instruction: InstructionPayload,
    /// Accepted length interval and target
    bounds: LengthBounds,
    /// Speaker who delivers the mandatory closing line
    closing_speaker: String,
    /// Every speaker, in order
    speakers: Vec<String>,
    /// Boke and tsukkomi technique labels, for display
    technique_labels: Vec<String>,
    /// Structural labels, for display
    structure_labels: Vec<String>,
    /// Completion token budget hint
    max_tokens: u32,
}

impl PromptPlan {
    /// Assemble a plan from its parts.
    pub fn new(
        instruction: InstructionPayload,
        bounds: LengthBounds,
        speakers: Vec<String>,
        closing_speaker: impl Into<String>,
        technique_labels: Vec<String>,
        structure_labels: Vec<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            instruction,
            bounds,
            closing_speaker: closing_speaker.into(),
            speakers,
            technique_labels,
            structure_labels,
            max_tokens,
        }
    }

    /// Requested length.
    pub fn target_length(&self) -> u32 {
        self.bounds.target
    }

    /// Lower bound of the accepted interval.
    pub fn min_length(&self) -> u32 {
        self.bounds.min
    }

    /// Upper bound of the accepted interval.
    pub fn max_length(&self) -> u32 {
        self.bounds.max
    }
}
