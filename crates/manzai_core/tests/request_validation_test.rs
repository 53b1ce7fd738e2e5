use manzai_core::{GenerationRequestInput, LengthRules, LengthValue, OutOfRange};
use manzai_error::ValidationErrorKind;

fn input(theme: &str) -> GenerationRequestInput {
    GenerationRequestInput {
        theme: Some(theme.to_string()),
        genre: Some("しゃべくり".to_string()),
        characters: Some("太郎,花子".to_string()),
        length: Some(LengthValue::Number(400.0)),
        ..Default::default()
    }
}

#[test]
fn test_valid_request() {
    let req = input("回転寿司").validate(&LengthRules::default()).unwrap();
    assert_eq!(req.theme(), "回転寿司");
    assert_eq!(*req.target_length(), 400);
    assert_eq!(req.characters().tsukkomi(), "花子");
    assert!(req.user_key().is_none());
    assert!(req.techniques().is_empty());
}

#[test]
fn test_missing_theme_rejected() {
    let mut raw = input("x");
    raw.theme = None;
    let err = raw.validate(&LengthRules::default()).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::MissingField("theme".into()));
}

#[test]
fn test_blank_theme_rejected() {
    let err = input("   ").validate(&LengthRules::default()).unwrap_err();
    assert_eq!(err.kind, ValidationErrorKind::MissingField("theme".into()));
}

#[test]
fn test_missing_genre_rejected() {
    let mut raw = input("回転寿司");
    raw.genre = None;
    assert!(raw.validate(&LengthRules::default()).is_err());
}

#[test]
fn test_missing_characters_use_default_pair() {
    let mut raw = input("回転寿司");
    raw.characters = None;
    let req = raw.validate(&LengthRules::default()).unwrap();
    assert_eq!(req.characters().boke(), "ボケ");
    assert_eq!(req.characters().tsukkomi(), "ツッコミ");
}

#[test]
fn test_length_clamped_and_defaulted() {
    let rules = LengthRules::default();
    assert_eq!(rules.resolve(Some(&LengthValue::Number(2001.0))).unwrap(), 2000);
    assert_eq!(rules.resolve(Some(&LengthValue::Number(0.0))).unwrap(), 300);
    assert_eq!(rules.resolve(Some(&LengthValue::Number(-5.0))).unwrap(), 300);
    assert_eq!(rules.resolve(Some(&LengthValue::Text(" 750 ".into()))).unwrap(), 750);
    assert_eq!(rules.resolve(Some(&LengthValue::Number(1.0))).unwrap(), 1);
}

#[test]
fn test_length_rejected_under_reject_policy() {
    let rules = LengthRules {
        out_of_range: OutOfRange::Reject,
        ..Default::default()
    };
    assert!(rules.resolve(Some(&LengthValue::Number(2001.0))).is_err());
    assert!(rules.resolve(Some(&LengthValue::Number(0.0))).is_err());
    assert!(rules.resolve(Some(&LengthValue::Text("many".into()))).is_err());
    assert_eq!(rules.resolve(Some(&LengthValue::Number(2000.0))).unwrap(), 2000);
}

#[test]
fn test_deserialize_client_body() {
    let body = r#"{
        "theme": "コンビニ",
        "genre": "コント",
        "characters": "A、B",
        "length": "600",
        "boke": ["NORIBOKE"],
        "user_id": "u-1"
    }"#;
    let raw: GenerationRequestInput = serde_json::from_str(body).unwrap();
    let req = raw.validate(&LengthRules::default()).unwrap();
    assert_eq!(*req.target_length(), 600);
    assert_eq!(req.techniques().boke, vec!["NORIBOKE".to_string()]);
    assert_eq!(req.user_key().as_ref().map(|k| k.as_str()), Some("u-1"));
}
