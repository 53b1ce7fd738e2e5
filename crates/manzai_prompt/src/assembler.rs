//! Mapping validated requests onto prompt plans.

use crate::{Namespace, RandomSource, Technique, TechniqueCatalog};
use manzai_core::{
    GenerationRequest, InstructionPayload, LengthPolicy, PromptPlan, TechniqueSelections,
};
use manzai_script::CLOSING_PHRASE;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Standing instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = "あなたは日本語の漫才台本を専門とするプロの放送作家です。\
事実に反する断定や実在の人物・団体を貶める内容は避け、常識の範囲で現実に即した、\
人間が書いたような自然でテンポのよい掛け合いにしてください。";

/// How many techniques to pick per namespace when the caller picks none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackSizes {
    /// Boke techniques
    pub boke: usize,
    /// Tsukkomi techniques
    pub tsukkomi: usize,
    /// Structural techniques
    pub general: usize,
}

impl Default for FallbackSizes {
    fn default() -> Self {
        Self {
            boke: 1,
            tsukkomi: 1,
            general: 1,
        }
    }
}

/// Deployment knobs for prompt assembly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PromptSettings {
    /// Band or ceiling interpretation of the target
    pub length_policy: LengthPolicy,
    /// Hard ceiling on any script
    pub ceiling: u32,
    /// Completion tokens budgeted per character of the maximum
    pub max_tokens_per_char: f32,
    /// Fixed completion tokens added for title and formatting
    pub max_tokens_overhead: u32,
    /// Upper bound on the completion token budget
    pub max_tokens_cap: u32,
    /// Random fallback sizes
    pub fallback: FallbackSizes,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            length_policy: LengthPolicy::default(),
            ceiling: 2000,
            max_tokens_per_char: 2.0,
            max_tokens_overhead: 256,
            max_tokens_cap: 4096,
            fallback: FallbackSizes::default(),
        }
    }
}

impl PromptSettings {
    /// Completion token budget for `units` characters of output.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_prompt::PromptSettings;
    ///
    /// let settings = PromptSettings::default();
    /// assert_eq!(settings.max_tokens_for(100), 456);
    /// assert_eq!(settings.max_tokens_for(5000), 4096);
    /// ```
    pub fn max_tokens_for(&self, units: u32) -> u32 {
        let scaled = (units as f32 * self.max_tokens_per_char.max(0.0)).ceil() as u32;
        scaled
            .saturating_add(self.max_tokens_overhead)
            .min(self.max_tokens_cap)
    }
}

/// Builds prompt plans and continuation instructions.
#[derive(Clone)]
pub struct PromptAssembler {
    catalog: Arc<TechniqueCatalog>,
    random: Arc<dyn RandomSource>,
    settings: PromptSettings,
}

impl std::fmt::Debug for PromptAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptAssembler")
            .field("catalog", &self.catalog)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PromptAssembler {
    /// Create an assembler.
    pub fn new(
        catalog: Arc<TechniqueCatalog>,
        random: Arc<dyn RandomSource>,
        settings: PromptSettings,
    ) -> Self {
        Self {
            catalog,
            random,
            settings,
        }
    }

    /// The shared catalog.
    pub fn catalog(&self) -> &TechniqueCatalog {
        &self.catalog
    }

    /// Assembly settings.
    pub fn settings(&self) -> &PromptSettings {
        &self.settings
    }

    /// Build the plan for one request.
    ///
    /// Unknown technique identifiers are dropped. When the caller selected
    /// nothing in any namespace, a random sample is drawn per namespace.
    #[instrument(skip_all, fields(target = request.target_length()))]
    pub fn assemble(&self, request: &GenerationRequest) -> PromptPlan {
        let selections = self.selections(request.techniques());
        let boke = self.catalog.resolve(Namespace::Boke, &selections.boke);
        let tsukkomi = self.catalog.resolve(Namespace::Tsukkomi, &selections.tsukkomi);
        let general = self.catalog.resolve(Namespace::General, &selections.general);

        let technique_labels: Vec<String> = boke
            .iter()
            .chain(tsukkomi.iter())
            .map(|t| t.label().clone())
            .collect();
        let structure_labels: Vec<String> = self
            .catalog
            .mandatory_structure()
            .iter()
            .cloned()
            .chain(general.iter().map(|t| t.label().clone()))
            .collect();
        debug!(?technique_labels, ?structure_labels, "Selected techniques");

        let bounds = self
            .settings
            .length_policy
            .bounds(*request.target_length(), self.settings.ceiling);
        let characters = request.characters();
        let closing_speaker = characters.tsukkomi().to_string();

        let mut user = String::new();
        let _ = writeln!(user, "以下の条件で漫才の台本を書いてください。\n");
        let _ = writeln!(user, "【テーマ】{}", request.theme());
        let genre = if request.genre().is_empty() {
            "指定なし"
        } else {
            request.genre().as_str()
        };
        let _ = writeln!(user, "【ジャンル】{}", genre);
        let _ = write!(
            user,
            "【登場人物】{}（ボケ: {}、ツッコミ: {}",
            characters.names().join("、"),
            characters.boke(),
            characters.tsukkomi()
        );
        if !characters.supporting().is_empty() {
            let _ = write!(user, "、その他: {}", characters.supporting().join("、"));
        }
        let _ = writeln!(user, "）");
        let _ = writeln!(
            user,
            "【構成】{}を必ず入れてください。",
            structure_labels
                .iter()
                .map(|l| format!("「{}」", l))
                .collect::<String>()
        );
        push_guidelines(&mut user, "ボケの技法", &boke);
        push_guidelines(&mut user, "ツッコミの技法", &tsukkomi);
        push_guidelines(&mut user, "全体の技法", &general);
        if bounds.min <= 1 {
            let _ = writeln!(
                user,
                "【長さ】本文を{}文字以内にしてください。{}文字を絶対に超えないでください。",
                bounds.max, bounds.max
            );
        } else {
            let _ = writeln!(
                user,
                "【長さ】本文を{}文字以上{}文字以下にしてください（目標{}文字）。{}文字を絶対に超えないでください。",
                bounds.min, bounds.max, bounds.target, bounds.max
            );
        }
        let _ = writeln!(user, "【書式】");
        let _ = writeln!(
            user,
            "- 1行目にタイトルだけを書き、空行を1行あけてから本文を書いてください。"
        );
        let _ = writeln!(
            user,
            "- 本文は「名前: セリフ」の形式で、発言ごとに空行を1行入れてください。"
        );
        let _ = writeln!(
            user,
            "- 最後は「{}: {}」で締めてください。",
            closing_speaker, CLOSING_PHRASE
        );
        let _ = write!(
            user,
            "- 見出し、マークダウン、文字数の表記、構成の解説は書かないでください。"
        );

        PromptPlan::new(
            InstructionPayload {
                system: SYSTEM_PROMPT.to_string(),
                user,
            },
            bounds,
            characters.names().to_vec(),
            closing_speaker,
            technique_labels,
            structure_labels,
            self.settings.max_tokens_for(bounds.max),
        )
    }

    /// Instructions asking for more dialogue after `body`.
    ///
    /// `body` should already have its closing line removed.
    pub fn continuation(&self, plan: &PromptPlan, body: &str, deficit: u32) -> InstructionPayload {
        let mut user = String::new();
        let _ = writeln!(user, "次の漫才の台本の続きを書いてください。\n");
        let _ = writeln!(user, "【これまでの台本】\n{}\n", body.trim());
        let _ = writeln!(user, "【条件】");
        let _ = writeln!(
            user,
            "- これまでのセリフを繰り返さず、新しい展開だけを書いてください。"
        );
        let _ = writeln!(user, "- 続きは{}文字以上にしてください。", deficit);
        let _ = writeln!(
            user,
            "- 登場人物は{}だけです。",
            plan.speakers().join("、")
        );
        if !plan.structure_labels().is_empty() {
            let _ = writeln!(
                user,
                "- {}を意識して話をまとめてください。",
                plan.structure_labels().join("、")
            );
        }
        let _ = writeln!(
            user,
            "- 「名前: セリフ」の形式で、発言ごとに空行を1行入れてください。"
        );
        let _ = writeln!(
            user,
            "- 最後は「{}: {}」で締めてください。",
            plan.closing_speaker(),
            CLOSING_PHRASE
        );
        let _ = write!(user, "- タイトル、前置き、解説は書かないでください。");

        InstructionPayload {
            system: plan.instruction().system.clone(),
            user,
        }
    }

    fn selections(&self, requested: &TechniqueSelections) -> TechniqueSelections {
        if !requested.is_empty() {
            return requested.clone();
        }
        let fallback = self.settings.fallback;
        let selections = TechniqueSelections {
            boke: self.sample(Namespace::Boke, fallback.boke),
            tsukkomi: self.sample(Namespace::Tsukkomi, fallback.tsukkomi),
            general: self.sample(Namespace::General, fallback.general),
        };
        debug!(?selections, "No techniques requested, using random fallback");
        selections
    }

    fn sample(&self, namespace: Namespace, amount: usize) -> Vec<String> {
        let ids = self.catalog.ids(namespace);
        self.random
            .choose_indices(ids.len(), amount)
            .into_iter()
            .filter_map(|idx| ids.get(idx).map(|id| id.to_string()))
            .collect()
    }
}

fn push_guidelines(out: &mut String, heading: &str, techniques: &[&Technique]) {
    if techniques.is_empty() {
        return;
    }
    let _ = writeln!(out, "【{}】", heading);
    for technique in techniques {
        let _ = writeln!(out, "- {}：{}", technique.label(), technique.definition());
    }
}
