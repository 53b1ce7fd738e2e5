//! The shaping stages in the order the request pipeline applies them.

use crate::{CharacterCounter, EnforcerConfig, LengthEnforcer, TextNormalizer};
use manzai_core::{CountingPolicy, PromptPlan, ScriptDraft};
use tracing::{debug, instrument, warn};

/// Shortfall below the target that justifies a continuation call.
pub const DEFAULT_DEFICIT_THRESHOLD: u32 = 30;

/// Counter, normalizer and enforcer sharing one counting policy.
#[derive(Debug, Clone)]
pub struct ScriptShaper {
    counter: CharacterCounter,
    normalizer: TextNormalizer,
    enforcer: LengthEnforcer,
    deficit_threshold: u32,
}

impl Default for ScriptShaper {
    fn default() -> Self {
        Self::new(
            CountingPolicy::default(),
            EnforcerConfig::default(),
            DEFAULT_DEFICIT_THRESHOLD,
        )
    }
}

impl ScriptShaper {
    /// Create a shaper.
    pub fn new(counting: CountingPolicy, enforcer: EnforcerConfig, deficit_threshold: u32) -> Self {
        let counter = CharacterCounter::new(counting);
        Self {
            counter,
            normalizer: TextNormalizer::new(),
            enforcer: LengthEnforcer::new(counter, enforcer),
            deficit_threshold,
        }
    }

    /// Length measurement.
    pub fn counter(&self) -> &CharacterCounter {
        &self.counter
    }

    /// Text passes.
    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Truncation.
    pub fn enforcer(&self) -> &LengthEnforcer {
        &self.enforcer
    }

    /// Shortfall that triggers a continuation.
    pub fn deficit_threshold(&self) -> u32 {
        self.deficit_threshold
    }

    /// Length of a draft body.
    pub fn length(&self, draft: &ScriptDraft) -> usize {
        self.counter.count(&draft.body)
    }

    /// Turn raw model output into a normalized draft.
    ///
    /// Markup is stripped and the ending tidied by the enforcer without
    /// truncating. The body is empty when the output had no dialogue besides
    /// a closing line; no closing line is added in that case.
    #[instrument(skip_all, fields(raw_len = raw.len()))]
    pub fn first_pass(&self, raw: &str, plan: &PromptPlan) -> ScriptDraft {
        let normalizer = self.normalizer.with_speakers(plan.speakers());
        let cleaned = self
            .enforcer
            .enforce(raw, plan.min_length(), plan.max_length(), true);
        let split = normalizer.split_title_and_body(&cleaned);
        if normalizer.strip_closing_line(&split.body).trim().is_empty() {
            debug!("No dialogue in generated text");
            return ScriptDraft::new(split.title, "");
        }
        let body = normalizer.normalize(&split.body, plan.closing_speaker());
        ScriptDraft::new(split.title, body)
    }

    /// True when the body holds dialogue beyond the closing line.
    pub fn has_dialogue(&self, draft: &ScriptDraft) -> bool {
        !self
            .normalizer
            .strip_closing_line(&draft.body)
            .trim()
            .is_empty()
    }

    /// Units still missing to reach the target; negative when over.
    pub fn deficit(&self, draft: &ScriptDraft, plan: &PromptPlan) -> i64 {
        i64::from(plan.target_length()) - self.length(draft) as i64
    }

    /// True when the draft is far enough below target to continue it.
    pub fn needs_continuation(&self, draft: &ScriptDraft, plan: &PromptPlan) -> bool {
        self.deficit(draft, plan) >= i64::from(self.deficit_threshold)
    }

    /// Append continuation text before the closing line and re-normalize.
    ///
    /// Empty continuations leave the draft unchanged.
    #[instrument(skip_all, fields(addition_len = continuation.len()))]
    pub fn splice(
        &self,
        draft: &ScriptDraft,
        continuation: &str,
        plan: &PromptPlan,
    ) -> ScriptDraft {
        let normalizer = self.normalizer.with_speakers(plan.speakers());
        let addition =
            self.enforcer
                .enforce(continuation, plan.min_length(), plan.max_length(), true);
        let addition = normalizer.strip_closing_line(&addition);
        if addition.trim().is_empty() {
            debug!("Continuation had no usable text");
            return draft.clone();
        }
        let head = normalizer.strip_closing_line(&draft.body);
        let joined = format!("{}\n{}", head, addition);
        ScriptDraft::new(
            draft.title.clone(),
            normalizer.normalize(&joined, plan.closing_speaker()),
        )
    }

    /// Bring the draft inside the plan's maximum while keeping the closing
    /// line intact.
    ///
    /// Budget for the closing line is reserved before truncating the rest.
    /// If the closing line alone does not fit, the ceiling wins and the
    /// whole text is truncated plainly.
    #[instrument(skip_all, fields(max = plan.max_length()))]
    pub fn finalize(&self, draft: &ScriptDraft, plan: &PromptPlan) -> ScriptDraft {
        if draft.is_empty() {
            return draft.clone();
        }
        let normalizer = self.normalizer.with_speakers(plan.speakers());
        let speaker = plan.closing_speaker();
        let min = plan.min_length();
        let max = plan.max_length();

        let labelled = normalizer.normalize_speaker_labels(&draft.body);
        let spaced = normalizer.ensure_blank_line_between_turns(&labelled);
        let core = normalizer.strip_closing_line(&spaced);

        let closing = normalizer.closing_line(speaker);
        let reserve = self.counter.count("\n\n") + self.counter.count(&closing);

        let body = if reserve >= max as usize {
            warn!(reserve, max, "Closing line does not fit, truncating plainly");
            let full = normalizer.ensure_closing_line(&core, speaker);
            self.enforcer.enforce(&full, min, max, false)
        } else {
            let budget = max - reserve as u32;
            let trimmed = self
                .enforcer
                .enforce(&core, min.saturating_sub(reserve as u32), budget, false);
            normalizer.ensure_closing_line(&trimmed, speaker)
        };

        debug!(length = self.counter.count(&body), "Finalized script");
        ScriptDraft::new(draft.title.clone(), body)
    }
}
