//! Best-effort lengthening of short drafts.

use crate::Generator;
use manzai_core::{PromptPlan, ScriptDraft};
use manzai_prompt::PromptAssembler;
use manzai_script::ScriptShaper;
use tracing::{debug, info, instrument, warn};

/// Asks the backend once for more dialogue when a draft falls well short of
/// its target.
///
/// Failures are logged and swallowed; the caller always gets a usable draft.
#[derive(Debug, Clone)]
pub struct ContinuationController {
    generator: Generator,
    assembler: PromptAssembler,
    shaper: ScriptShaper,
}

impl ContinuationController {
    /// Create a controller.
    pub fn new(generator: Generator, assembler: PromptAssembler, shaper: ScriptShaper) -> Self {
        Self {
            generator,
            assembler,
            shaper,
        }
    }

    /// Extend `draft` if its deficit reaches the shaper's threshold.
    ///
    /// At most one generation call is made. The original draft comes back
    /// unchanged when no continuation is needed, the call fails, or the
    /// continuation adds nothing.
    #[instrument(skip_all, fields(target = plan.target_length()))]
    pub async fn maybe_extend(&self, draft: ScriptDraft, plan: &PromptPlan) -> ScriptDraft {
        let deficit = self.shaper.deficit(&draft, plan);
        if !self.shaper.needs_continuation(&draft, plan) {
            debug!(
                deficit,
                threshold = self.shaper.deficit_threshold(),
                "Continuation skipped"
            );
            return draft;
        }

        let deficit = u32::try_from(deficit).unwrap_or(u32::MAX);
        let body = self.shaper.normalizer().strip_closing_line(&draft.body);
        let instruction = self.assembler.continuation(plan, &body, deficit);
        let max_tokens = self.assembler.settings().max_tokens_for(deficit);

        match self.generator.generate(&instruction, max_tokens).await {
            Ok(addition) => {
                let before = self.shaper.length(&draft);
                let extended = self.shaper.splice(&draft, &addition, plan);
                info!(
                    before,
                    after = self.shaper.length(&extended),
                    "Continued short draft"
                );
                extended
            }
            Err(e) => {
                warn!(error = %e.kind, deficit, "Continuation failed; keeping original draft");
                draft
            }
        }
    }
}
