use manzai_core::{
    CountUnit, CountingPolicy, InstructionPayload, LengthPolicy, PromptPlan, ScriptDraft,
};
use manzai_script::{
    CLOSING_PHRASE, CharacterCounter, EnforcerConfig, LengthEnforcer, ScriptShaper, TextNormalizer,
    count,
};

fn plan(target: u32, policy: LengthPolicy) -> PromptPlan {
    cast_plan(target, policy, &["ボケ", "ツッコミ"])
}

fn cast_plan(target: u32, policy: LengthPolicy, cast: &[&str]) -> PromptPlan {
    PromptPlan::new(
        InstructionPayload {
            system: "system".to_string(),
            user: "user".to_string(),
        },
        policy.bounds(target, 2000),
        cast.iter().map(|name| name.to_string()).collect(),
        cast[1],
        vec![],
        vec![],
        1024,
    )
}

/// Names the generic label pattern cannot recognise on its own.
const SPACED_CAST: [&str; 2] = ["田中 一郎", "山田 太郎"];
/// Seventeen and twenty characters.
const LONG_CAST: [&str; 2] = [
    "寿限無寿限無五劫の擦り切れ海砂利水",
    "じゅげむじゅげむごこうのすりきれかいじゃ",
];

fn sample_scripts() -> Vec<String> {
    vec![
        "タイトル：回転寿司\n\nボケ：いらっしゃい\nツッコミ：店員か！\n\n\n\nボケ: 皿が回ってる".to_string(),
        "**ボケ**: はい\r\n**ツッコミ**: なんでやねん\r\nツッコミ：もうええわ。どうもありがとうございました".to_string(),
        "「満員電車」\n\n  ボケ ： 押さないで\n続きのセリフ\nツッコミ：押してへん".to_string(),
        String::new(),
        "もうええわ、どうもありがとうございました。".to_string(),
    ]
}

#[test]
fn normalizer_passes_are_idempotent() {
    let n = TextNormalizer::new();
    for text in sample_scripts() {
        let labels = n.normalize_speaker_labels(&text);
        assert_eq!(n.normalize_speaker_labels(&labels), labels);

        let spaced = n.ensure_blank_line_between_turns(&labels);
        assert_eq!(n.ensure_blank_line_between_turns(&spaced), spaced);

        let closed = n.ensure_closing_line(&spaced, "ツッコミ");
        assert_eq!(n.ensure_closing_line(&closed, "ツッコミ"), closed);
    }
}

#[test]
fn closing_line_appears_exactly_once_at_end() {
    let n = TextNormalizer::new();
    for text in sample_scripts() {
        let closed = n.ensure_closing_line(&text, "ツッコミ");
        let expected = format!("ツッコミ: {}", CLOSING_PHRASE);
        assert!(closed.ends_with(&expected), "{closed}");
        assert_eq!(closed.matches("ありがとうございました").count(), 1, "{closed}");
    }
}

#[test]
fn enforce_never_exceeds_max() {
    let enforcer = LengthEnforcer::new(CharacterCounter::default(), EnforcerConfig::default());
    let long = "ボケ: 今日はええ天気やなあ。\nツッコミ: そうやな！\n".repeat(40);
    for max in [1, 5, 17, 50, 99, 300, 1000] {
        let out = enforcer.enforce(&long, 1, max, false);
        assert!(
            enforcer.counter().count(&out) <= max as usize,
            "max {max} got {}",
            enforcer.counter().count(&out)
        );
    }
}

#[test]
fn astral_characters_count_per_policy() {
    let code_points = CountingPolicy {
        unit: CountUnit::CodePoint,
        exclude_newlines: true,
    };
    let utf16 = CountingPolicy {
        unit: CountUnit::Utf16,
        exclude_newlines: true,
    };
    assert_eq!(count("𩸽を食べる", &code_points), 5);
    assert_eq!(count("𩸽を食べる", &utf16), 6);
}

#[test]
fn first_pass_builds_titled_normalized_draft() {
    let shaper = ScriptShaper::default();
    let raw = "```\n【回転寿司】\n\nボケ：いらっしゃい\nツッコミ：店員か！\n（文字数：120文字）\n```";
    let draft = shaper.first_pass(raw, &plan(300, LengthPolicy::default()));
    assert_eq!(draft.title, "回転寿司");
    assert_eq!(
        draft.body,
        format!("ボケ: いらっしゃい\n\nツッコミ: 店員か！\n\nツッコミ: {CLOSING_PHRASE}")
    );
}

#[test]
fn first_pass_on_blank_output_is_empty() {
    let shaper = ScriptShaper::default();
    let draft = shaper.first_pass("```\n\n```", &plan(300, LengthPolicy::default()));
    assert!(draft.is_empty());
}

#[test]
fn finalize_fits_band_and_keeps_closing_line() {
    let shaper = ScriptShaper::default();
    let plan = plan(200, LengthPolicy::default());
    let body = "ボケ: 今日はええ天気やなあ。\n\nツッコミ: そうやな！\n\n".repeat(30);
    let draft = ScriptDraft::new("天気", body);

    let out = shaper.finalize(&draft, &plan);
    let length = shaper.length(&out);
    assert!(length <= plan.max_length() as usize, "{length}");
    assert!(out.body.ends_with(&format!("ツッコミ: {CLOSING_PHRASE}")));
    assert_eq!(out.body.matches(CLOSING_PHRASE).count(), 1);
    assert_eq!(out.title, "天気");
}

#[test]
fn finalize_with_tiny_ceiling_truncates_plainly() {
    let shaper = ScriptShaper::default();
    let plan = plan(10, LengthPolicy::Ceiling);
    let draft = ScriptDraft::new("", "ボケ: 今日はええ天気やなあ。ほんまに。");
    let out = shaper.finalize(&draft, &plan);
    assert!(shaper.length(&out) <= 10);
}

#[test]
fn continuation_threshold_is_inclusive() {
    let shaper = ScriptShaper::default();
    let plan = plan(100, LengthPolicy::default());

    let seventy = ScriptDraft::new("", "あ".repeat(70));
    let seventy_one = ScriptDraft::new("", "あ".repeat(71));
    assert_eq!(shaper.deficit(&seventy, &plan), 30);
    assert!(shaper.needs_continuation(&seventy, &plan));
    assert!(!shaper.needs_continuation(&seventy_one, &plan));
}

#[test]
fn splice_inserts_before_closing_line() {
    let shaper = ScriptShaper::default();
    let plan = plan(300, LengthPolicy::default());
    let draft = shaper.first_pass("ボケ: はい\nツッコミ: どうも", &plan);

    let spliced = shaper.splice(
        &draft,
        "ボケ：続きやで\nツッコミ：もうええわ、どうもありがとうございました。",
        &plan,
    );
    assert_eq!(
        spliced.body,
        format!("ボケ: はい\n\nツッコミ: どうも。\n\nボケ: 続きやで\n\nツッコミ: {CLOSING_PHRASE}")
    );
}

#[test]
fn splice_with_empty_continuation_keeps_draft() {
    let shaper = ScriptShaper::default();
    let plan = plan(300, LengthPolicy::default());
    let draft = shaper.first_pass("ボケ: はい", &plan);
    assert_eq!(shaper.splice(&draft, "  \n", &plan), draft);
}

#[test]
fn cast_names_keep_passes_idempotent() {
    for cast in [SPACED_CAST, LONG_CAST] {
        let n = TextNormalizer::new().with_speakers(&cast);
        let text = format!("{}：こんにちは\n{} ： なんでやねん", cast[0], cast[1]);

        let labels = n.normalize_speaker_labels(&text);
        assert_eq!(labels, format!("{}: こんにちは\n{}: なんでやねん", cast[0], cast[1]));
        assert_eq!(n.normalize_speaker_labels(&labels), labels);

        let spaced = n.ensure_blank_line_between_turns(&labels);
        assert_eq!(spaced, format!("{}: こんにちは\n\n{}: なんでやねん", cast[0], cast[1]));
        assert_eq!(n.ensure_blank_line_between_turns(&spaced), spaced);

        let closed = n.ensure_closing_line(&spaced, cast[1]);
        assert_eq!(n.ensure_closing_line(&closed, cast[1]), closed);
    }
}

#[test]
fn closing_line_for_cast_names_appears_once() {
    for cast in [SPACED_CAST, LONG_CAST] {
        // Without the cast, a repeated run must still drop the bare label.
        for n in [TextNormalizer::new(), TextNormalizer::new().with_speakers(&cast)] {
            let text = format!("{}: こんにちは", cast[0]);
            let once = n.ensure_closing_line(&text, cast[1]);
            let twice = n.ensure_closing_line(&once, cast[1]);

            assert_eq!(twice, once);
            assert_eq!(
                once,
                format!("{}: こんにちは\n\n{}: {CLOSING_PHRASE}", cast[0], cast[1])
            );
            assert_eq!(twice.matches(CLOSING_PHRASE).count(), 1);
        }
    }
}

#[test]
fn first_pass_and_finalize_respect_spaced_cast() {
    let shaper = ScriptShaper::default();
    let plan = cast_plan(300, LengthPolicy::default(), &SPACED_CAST);

    let draft = shaper.first_pass("田中 一郎: ボケるで\n山田 太郎: なんでやねん", &plan);
    let expected = format!(
        "田中 一郎: ボケるで\n\n山田 太郎: なんでやねん。\n\n山田 太郎: {CLOSING_PHRASE}"
    );
    assert_eq!(draft.body, expected);

    let out = shaper.finalize(&draft, &plan);
    assert_eq!(out.body, expected);
    assert!(out.body.lines().all(|line| !line.trim_end().ends_with(':')));
    assert!(!out.body.contains("山田 太郎:。"));
}

#[test]
fn first_pass_terminates_unfinished_output() {
    let shaper = ScriptShaper::default();
    let plan = plan(300, LengthPolicy::default());
    let draft = shaper.first_pass("ボケ: はい\nツッコミ: どうも", &plan);
    assert_eq!(
        draft.body,
        format!("ボケ: はい\n\nツッコミ: どうも。\n\nツッコミ: {CLOSING_PHRASE}")
    );
}

#[test]
fn closing_phrase_alone_is_not_dialogue() {
    let shaper = ScriptShaper::default();
    let plan = plan(300, LengthPolicy::default());

    for raw in [
        "もうええわ。どうもありがとうございました",
        "ツッコミ：もうええわ、どうもありがとうございました。",
        "```\n**ツッコミ**: もうええわ、どうも ありがとうございました！\n```",
    ] {
        let draft = shaper.first_pass(raw, &plan);
        assert!(draft.is_empty(), "{raw} gave {:?}", draft.body);
    }

    let closing_only = ScriptDraft::new("", format!("ツッコミ: {CLOSING_PHRASE}"));
    assert!(!shaper.has_dialogue(&closing_only));
    assert!(shaper.has_dialogue(&ScriptDraft::new("", "ボケ: はい")));
}
