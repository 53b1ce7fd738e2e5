//! Configuration loading and conversion.

use manzai_core::{CountUnit, LengthPolicy, MeteringPolicy, OutOfRange};
use manzai_server::{LengthPolicyKind, ManzaiConfig, StoreKind};
use std::io::Write;
use tempfile::NamedTempFile;

fn toml_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Create temp file");
    file.write_all(contents.as_bytes()).expect("Write config");
    file
}

#[test]
fn bundled_defaults_match_default_impl() {
    let file = toml_file("");

    let config = ManzaiConfig::from_file(file.path()).expect("Bundled defaults load");

    assert_eq!(config, ManzaiConfig::default());
}

#[test]
fn file_overrides_only_what_it_names() {
    let file = toml_file(
        r#"
[server]
production = true

[length]
policy = "ceiling"
hard_ceiling = 1000
default_target = 200
out_of_range = "reject"

[length.counting]
unit = "utf16"

[metering]
policy = "unmetered"
store = "memory"
"#,
    );

    let config = ManzaiConfig::from_file(file.path()).expect("Override loads");

    assert!(config.server.production);
    assert_eq!(config.server.bind, "127.0.0.1:3000");
    assert_eq!(config.model.model, "gpt-4o-mini");
    assert_eq!(config.length.policy, LengthPolicyKind::Ceiling);
    assert_eq!(config.length.length_policy(), LengthPolicy::Ceiling);
    assert_eq!(config.length.counting.unit, CountUnit::Utf16);
    assert!(config.length.counting.exclude_newlines);
    assert_eq!(config.metering.store, StoreKind::Memory);
    assert_eq!(config.metering.metering_policy(), MeteringPolicy::Unmetered);

    let rules = config.length.rules();
    assert_eq!(rules.ceiling, 1000);
    assert_eq!(rules.default_target, 200);
    assert_eq!(rules.out_of_range, OutOfRange::Reject);
}

#[test]
fn derived_settings_follow_config() {
    let config = ManzaiConfig::default();

    let settings = config.prompt_settings();
    assert_eq!(settings.ceiling, 2000);
    assert_eq!(settings.length_policy, LengthPolicy::StrictBand { percent: 10 });
    assert_eq!(settings.max_tokens_cap, 4096);

    let shaper = config.shaper();
    assert_eq!(shaper.deficit_threshold(), 30);
    assert_eq!(
        config.metering.metering_policy(),
        MeteringPolicy::Metered { free_quota: 20 }
    );
    assert_eq!(config.model.client_config().temperature, 0.8);
}

#[test]
fn default_target_above_ceiling_is_rejected() {
    let file = toml_file("[length]\nhard_ceiling = 100\ndefault_target = 300\n");

    let err = ManzaiConfig::from_file(file.path()).unwrap_err();

    assert!(err.to_string().contains("default_target"));
}

#[test]
fn invalid_bind_address_is_rejected() {
    let file = toml_file("[server]\nbind = \"not-an-address\"\n");

    assert!(ManzaiConfig::from_file(file.path()).is_err());
}

#[test]
fn zero_timeout_is_rejected() {
    let mut config = ManzaiConfig::default();
    config.model.timeout_secs = 0;

    assert!(config.validate().is_err());
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();

    let result = ManzaiConfig::from_file(dir.path().join("absent.toml"));

    assert!(result.is_err());
}

#[test]
fn unknown_policy_name_fails_to_parse() {
    let file = toml_file("[length]\npolicy = \"loose\"\n");

    assert!(ManzaiConfig::from_file(file.path()).is_err());
}

#[test]
fn api_key_is_never_serialized() {
    let mut config = ManzaiConfig::default();
    config.model.api_key = Some("sk-secret".to_string());

    let rendered = serde_json::to_string(&config).unwrap();

    assert!(!rendered.contains("sk-secret"));
}

#[test]
fn custom_catalog_path_is_loaded() {
    let catalog = toml_file(
        r#"
mandatory_structure = ["伏線回収"]

[boke.SOLO]
label = "ひとりボケ"
definition = "自分でボケて自分で拾う"
"#,
    );
    let mut config = ManzaiConfig::default();
    config.techniques.catalog_path = Some(catalog.path().to_path_buf());

    let loaded = config.techniques.catalog().expect("Custom catalog loads");

    assert_eq!(loaded.mandatory_structure(), ["伏線回収".to_string()]);
}
