// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use chrono::Weekday;

use crate::diagnostic::ConfigError;
use crate::model::YeapConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest first page the pending-orders listing accepts.
pub const MAX_SNAPSHOT_PAGE_SIZE: u32 = 100;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &YeapConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.dashboard.log_level.as_str()) {
        fail(format!(
            "dashboard.log_level `{}` must be one of {}",
            config.dashboard.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config
        .store
        .id
        .as_deref()
        .is_some_and(|id| id.trim().is_empty())
    {
        fail("store.id must not be empty when set".to_string());
    }

    for (weekday, hours) in config
        .store
        .opening_hours
        .iter()
        .flat_map(|hours| hours.days())
        .filter(|(_, hours)| !hours.is_valid())
    {
        fail(format!(
            "store.opening_hours.{} `{}`-`{}` must use HH:MM times",
            weekday_key(weekday),
            hours.open_hour,
            hours.close_hour
        ));
    }

    if !has_scheme(&config.server.socket_url, &["ws://", "wss://"]) {
        fail(format!(
            "server.socket_url `{}` must start with ws:// or wss://",
            config.server.socket_url
        ));
    }

    if !has_scheme(&config.server.api_base_url, &["http://", "https://"]) {
        fail(format!(
            "server.api_base_url `{}` must start with http:// or https://",
            config.server.api_base_url
        ));
    }

    if config.server.join_timeout_secs == 0 {
        fail("server.join_timeout_secs must be at least 1".to_string());
    }

    if config.server.request_timeout_secs == 0 {
        fail("server.request_timeout_secs must be at least 1".to_string());
    }

    if config.orders.countdown_secs == 0 {
        fail("orders.countdown_secs must be at least 1".to_string());
    }

    if config.orders.tick_millis == 0 {
        fail("orders.tick_millis must be at least 1".to_string());
    }

    if !(1..=MAX_SNAPSHOT_PAGE_SIZE).contains(&config.orders.snapshot_page_size) {
        fail(format!(
            "orders.snapshot_page_size must be between 1 and {MAX_SNAPSHOT_PAGE_SIZE}, got {}",
            config.orders.snapshot_page_size
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Sun => "sunday",
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.strip_prefix(scheme).is_some_and(|rest| !rest.is_empty()))
}
