// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Yeap configuration system.

use std::io::Write;

use serial_test::serial;
use yeap_config::diagnostic::ConfigError;
use yeap_config::model::YeapConfig;
use yeap_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[dashboard]
log_level = "debug"
operator_name = "ana"

[store]
id = "S1"
name = "Pizzaria Central"

[server]
socket_url = "wss://rt.example.com/socket"
api_base_url = "https://api.example.com"
api_token = "secret"
join_timeout_secs = 5
request_timeout_secs = 15

[orders]
countdown_secs = 45
tick_millis = 500
fade_delay_millis = 250
snapshot_page_size = 50
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.dashboard.log_level, "debug");
    assert_eq!(config.dashboard.operator_name.as_deref(), Some("ana"));
    assert_eq!(config.store.id.as_deref(), Some("S1"));
    assert_eq!(config.store.name, "Pizzaria Central");
    assert_eq!(config.server.socket_url, "wss://rt.example.com/socket");
    assert_eq!(config.server.api_token.as_deref(), Some("secret"));
    assert_eq!(config.server.join_timeout().as_secs(), 5);
    assert_eq!(config.orders.countdown_secs, 45);
    assert_eq!(config.orders.tick().as_millis(), 500);
    assert_eq!(config.orders.fade_delay().as_millis(), 250);
    assert_eq!(config.orders.snapshot_page_size, 50);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty config is valid");
    let defaults = YeapConfig::default();
    assert_eq!(config.orders.countdown_secs, 30);
    assert_eq!(config.orders.fade_delay_millis, 500);
    assert_eq!(config.orders.snapshot_page_size, 100);
    assert_eq!(config.server.socket_url, defaults.server.socket_url);
    assert!(config.store.id.is_none());
}

#[test]
fn unknown_key_gets_a_suggestion() {
    let toml = r#"
[orders]
countdown_sec = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key must be rejected");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("an UnknownKey diagnostic");
    assert_eq!(unknown.0, "countdown_sec");
    assert_eq!(unknown.1.as_deref(), Some("countdown_secs"));
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[orders]
countdown_secs = "thirty"
"#;

    let errors = load_and_validate_str(toml).expect_err("wrong type must be rejected");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))),
        "got: {errors:?}"
    );
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[server]
socket_url = "localhost:3333"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad scheme must be rejected");
    assert!(errors.iter().any(
        |e| matches!(e, ConfigError::Validation { message } if message.contains("socket_url"))
    ));
}

#[test]
fn api_token_is_redacted_in_debug() {
    let config = load_config_from_str("[server]\napi_token = \"hunter2\"\n").unwrap();
    let debug = format!("{:?}", config.server);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("[redacted]"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let mut file = tempfile_in_target("env_override.toml");
    writeln!(file.1, "[server]\napi_base_url = \"http://from-file:1\"").unwrap();

    // SAFETY: serialised with other env-mutating tests via #[serial].
    unsafe {
        std::env::set_var("YEAP_SERVER_API_BASE_URL", "http://from-env:2");
        std::env::set_var("YEAP_ORDERS_COUNTDOWN_SECS", "12");
    }
    let result = load_and_validate_path(&file.0);
    unsafe {
        std::env::remove_var("YEAP_SERVER_API_BASE_URL");
        std::env::remove_var("YEAP_ORDERS_COUNTDOWN_SECS");
    }
    let _ = std::fs::remove_file(&file.0);

    let config = result.expect("config should load");
    assert_eq!(config.server.api_base_url, "http://from-env:2");
    assert_eq!(config.orders.countdown_secs, 12);
}

#[test]
#[serial]
fn unknown_key_in_file_carries_source_span() {
    let mut file = tempfile_in_target("span.toml");
    write!(file.1, "[store]\nid = \"S1\"\nnmae = \"x\"\n").unwrap();

    let errors = load_and_validate_path(&file.0).expect_err("unknown key");
    let _ = std::fs::remove_file(&file.0);

    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownKey { key, span: Some(_), suggestion: Some(s), .. }
            if key == "nmae" && s == "name"
    )));
}

fn tempfile_in_target(name: &str) -> (std::path::PathBuf, std::fs::File) {
    let dir = std::env::temp_dir().join(format!("yeap-config-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    (path, file)
}

#[test]
fn opening_hours_load_into_store_section() {
    use chrono::{TimeZone, Utc};

    let toml = r#"
[store]
id = "S1"

[store.opening_hours.saturday]
open_hour = "18:00"
close_hour = "02:00"
"#;
    let config = load_and_validate_str(toml).expect("opening hours should validate");
    let hours = config.store.opening_hours.expect("hours are set");
    assert!(hours.monday.is_none());

    // Saturday 2026-03-07 23:30 and the spill-over into Sunday 01:00.
    let late = Utc.with_ymd_and_hms(2026, 3, 7, 23, 30, 0).unwrap();
    let after_midnight = Utc.with_ymd_and_hms(2026, 3, 8, 1, 0, 0).unwrap();
    let afternoon = Utc.with_ymd_and_hms(2026, 3, 7, 15, 0, 0).unwrap();
    assert!(hours.is_open_at(&late));
    assert!(hours.is_open_at(&after_midnight));
    assert!(!hours.is_open_at(&afternoon));
}

#[test]
fn malformed_opening_hours_are_reported() {
    let toml = r#"
[store.opening_hours.monday]
open_hour = "noon"
close_hour = "23:00"
"#;
    let errors = load_and_validate_str(toml).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("monday")))
    );
}
