//! Config Validation Tests
//!
//! Typo detection for unknown keys and range validation of `AppConfig`,
//! exercised independently from the server.

use ragdesk::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use ragdesk::config::{AppConfig, ConfigError};
use ragdesk::llm::Provider;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_knowledge_section_warns_with_suggestion() {
    let toml_str = r#"
[knowledge]
default_top = 5
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("default_top"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("knowledge.default_top_k"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn typo_in_provider_section_warns() {
    let toml_str = r#"
[llm.yandex]
modle = "yandexgpt-lite/latest"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("llm.yandex.model"));
    assert!(warnings[0].to_string().contains("did you mean 'llm.yandex.model'"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let text = include_str!("../ragdesk.example.toml");
    let warnings = validate_unknown_keys(text);
    assert!(warnings.is_empty(), "Unexpected warnings: {warnings:?}");
}

#[test]
fn serialized_defaults_only_use_known_keys() {
    let text = AppConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&text).is_empty());
}

#[test]
fn unrelated_section_has_no_suggestion() {
    let warnings = validate_unknown_keys("[telemetry]\nendpoint = \"x\"\n");
    assert!(!warnings.is_empty());
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn every_known_key_suggests_itself() {
    let known = known_config_keys();
    for key in &known {
        assert_eq!(suggest_correction(key, &known).as_deref(), Some(*key));
    }
}

// ============================================================================
// Loading and Range Validation
// ============================================================================

#[test]
fn example_config_loads_and_validates() {
    let config = AppConfig::load_from_file(std::path::Path::new("ragdesk.example.toml")).unwrap();
    assert_eq!(config.server.addr, "0.0.0.0:8000");
    assert_eq!(config.knowledge.default_top_k, 3);
    assert_eq!(config.llm.default_provider, Provider::YandexGpt);
    assert!(config.llm.gigachat.accept_invalid_certs);
}

#[test]
fn unknown_keys_do_not_block_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragdesk.toml");
    std::fs::write(&path, "[server]\nadress = \"x\"\naddr = \"127.0.0.1:1\"\n").unwrap();

    let config = AppConfig::load_from_file(&path).unwrap();
    assert_eq!(config.server.addr, "127.0.0.1:1");
}

#[test]
fn unknown_provider_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragdesk.toml");
    std::fs::write(&path, "[llm]\ndefault_provider = \"openai\"\n").unwrap();

    assert!(matches!(
        AppConfig::load_from_file(&path),
        Err(ConfigError::Parse(..))
    ));
}

#[test]
fn out_of_range_values_are_all_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragdesk.toml");
    std::fs::write(
        &path,
        r#"
[server]
max_upload_bytes = 0

[llm.yandex]
max_tokens = 0

[llm.gigachat]
api_url = "gigachat.local"
"#,
    )
    .unwrap();

    match AppConfig::load_from_file(&path) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 3, "errors: {errors:?}");
            assert!(errors.iter().any(|e| e.contains("max_upload_bytes")));
            assert!(errors.iter().any(|e| e.contains("llm.gigachat.api_url")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        AppConfig::load_from_file(&dir.path().join("absent.toml")),
        Err(ConfigError::Io(..))
    ));
}
