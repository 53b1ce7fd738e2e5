//! The generation pipeline, from gate to response.

use crate::{ContinuationController, Generator, ManzaiConfig, PipelineError};
use manzai_core::{
    ConsumedFrom, GenerationRequestInput, LengthRules, MeteringPolicy, UsageRecord, UsageSnapshot,
    UserKey,
};
use manzai_interface::{GenerationClient, UsageStore};
use manzai_ledger::{CreditDelta, UsageLedger};
use manzai_prompt::{PromptAssembler, RandomSource, TechniqueCatalog};
use manzai_script::ScriptShaper;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// A finished script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedScript {
    /// Script title
    pub title: String,
    /// Dialogue, ending with the closing line
    pub text: String,
    /// How the script was produced
    pub meta: ScriptMeta,
}

/// Metadata returned alongside a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMeta {
    /// Structural requirements given to the backend
    pub structure_labels: Vec<String>,
    /// Boke and tsukkomi techniques given to the backend
    pub technique_labels: Vec<String>,
    /// Counters after the debit; null when unmetered or unreadable
    pub usage_snapshot: Option<UsageSnapshot>,
    /// What the request was paid with
    pub consumed_from: ConsumedFrom,
    /// Final length under the counting policy
    pub length: usize,
    /// Requested length
    pub target_length: u32,
    /// Accepted minimum
    pub min_length: u32,
    /// Accepted maximum
    pub max_length: u32,
}

/// Runs one request through gating, prompting, generation, shaping and
/// the post-paid debit.
///
/// Holds no per-request state; one instance serves every request.
pub struct RequestOrchestrator {
    rules: LengthRules,
    assembler: PromptAssembler,
    shaper: ScriptShaper,
    generator: Generator,
    continuation: ContinuationController,
    ledger: UsageLedger<Arc<dyn UsageStore>>,
}

impl std::fmt::Debug for RequestOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOrchestrator")
            .field("rules", &self.rules)
            .field("generator", &self.generator)
            .field("metering", self.ledger.policy())
            .field("store", &self.ledger.store().backend_name())
            .finish()
    }
}

impl RequestOrchestrator {
    /// Assemble the pipeline from explicit configuration and collaborators.
    pub fn new(
        config: &ManzaiConfig,
        client: Arc<dyn GenerationClient>,
        store: Arc<dyn UsageStore>,
        catalog: Arc<TechniqueCatalog>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        let assembler = PromptAssembler::new(catalog, random, config.prompt_settings());
        let shaper = config.shaper();
        let generator = Generator::new(
            client,
            config.model.temperature,
            Duration::from_secs(config.model.timeout_secs),
        );
        let continuation =
            ContinuationController::new(generator.clone(), assembler.clone(), shaper.clone());
        let ledger = UsageLedger::new(store, config.metering.metering_policy());

        Self {
            rules: config.length.rules(),
            assembler,
            shaper,
            generator,
            continuation,
            ledger,
        }
    }

    /// The usage ledger.
    pub fn ledger(&self) -> &UsageLedger<Arc<dyn UsageStore>> {
        &self.ledger
    }

    /// Produce a script for a request.
    ///
    /// The ledger is debited only after a non-empty script exists. Every
    /// error path leaves it untouched.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Validation`] for malformed input
    /// - [`PipelineError::Ledger`] if entitlement cannot be read
    /// - [`PipelineError::QuotaExhausted`] if the user has nothing left
    /// - [`PipelineError::Generation`] if the first generation call fails
    /// - [`PipelineError::EmptyScript`] if shaping leaves no dialogue
    #[instrument(skip_all, fields(user_key, target))]
    pub async fn generate(
        &self,
        input: GenerationRequestInput,
    ) -> Result<GeneratedScript, PipelineError> {
        let request = input.validate(&self.rules)?;
        let key = request.user_key().as_ref();
        let span = tracing::Span::current();
        span.record("target", request.target_length());
        if let Some(key) = key {
            span.record("user_key", key.as_str());
        }

        let check = self.ledger.check_only(key).await.inspect_err(|e| {
            error!(error = %e.kind, "Ledger gate unavailable");
        })?;
        if !check.allowed {
            info!(state = %check.state, "Request denied by ledger");
            return Err(PipelineError::QuotaExhausted {
                usage: check.snapshot,
            });
        }

        let plan = self.assembler.assemble(&request);
        debug!(
            min = plan.min_length(),
            max = plan.max_length(),
            max_tokens = plan.max_tokens(),
            "Prompt assembled"
        );

        let raw = self
            .generator
            .generate(plan.instruction(), *plan.max_tokens())
            .await
            .inspect_err(|e| error!(error = %e.kind, code = e.kind.code(), "Generation failed"))?;

        let draft = self.shaper.first_pass(&raw, &plan);
        if draft.is_empty() {
            error!("Generated text contained no dialogue");
            return Err(PipelineError::EmptyScript);
        }

        let draft = self.continuation.maybe_extend(draft, &plan).await;
        let script = self.shaper.finalize(&draft, &plan);
        if !self.shaper.has_dialogue(&script) {
            error!("Script empty after length enforcement");
            return Err(PipelineError::EmptyScript);
        }

        let consumed_from = match self.ledger.commit_after_success(key).await {
            Ok(consumed) => consumed,
            Err(e) => {
                warn!(error = %e.kind, "Usage commit failed after successful generation");
                ConsumedFrom::None
            }
        };
        let usage_snapshot = match self.metered_key(key) {
            Some(key) => match self.ledger.snapshot(key).await {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(error = %e.kind, "Usage refetch failed; omitting usage metadata");
                    None
                }
            },
            None => None,
        };

        let length = self.shaper.length(&script);
        info!(
            length,
            consumed_from = %consumed_from,
            "Script generated"
        );

        Ok(GeneratedScript {
            title: script.display_title().to_string(),
            text: script.body,
            meta: ScriptMeta {
                structure_labels: plan.structure_labels().clone(),
                technique_labels: plan.technique_labels().clone(),
                usage_snapshot,
                consumed_from,
                length,
                target_length: plan.target_length(),
                min_length: plan.min_length(),
                max_length: plan.max_length(),
            },
        })
    }

    /// Add purchased credits to a user.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Ledger`] if the store fails.
    #[instrument(skip(self), fields(user_key = key.as_str()))]
    pub async fn add_credits(
        &self,
        key: &UserKey,
        delta: CreditDelta,
    ) -> Result<UsageRecord, PipelineError> {
        Ok(self.ledger.top_up(key, delta).await?)
    }

    /// Current counters for a user.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Ledger`] if the store fails.
    #[instrument(skip(self), fields(user_key = key.as_str()))]
    pub async fn usage(&self, key: &UserKey) -> Result<UsageSnapshot, PipelineError> {
        Ok(self.ledger.snapshot(key).await?)
    }

    fn metered_key<'a>(&self, key: Option<&'a UserKey>) -> Option<&'a UserKey> {
        match self.ledger.policy() {
            MeteringPolicy::Metered { .. } => key,
            MeteringPolicy::Unmetered => None,
        }
    }
}
