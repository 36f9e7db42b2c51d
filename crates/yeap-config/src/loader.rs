// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./yeap.toml` > `~/.config/yeap/yeap.toml` > `/etc/yeap/yeap.toml`,
//! with environment variable overrides via the `YEAP_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::YeapConfig;

const SYSTEM_CONFIG: &str = "/etc/yeap/yeap.toml";
const LOCAL_CONFIG: &str = "yeap.toml";

/// Path of the per-user config file, if a config dir exists on this platform.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("yeap").join("yeap.toml"))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/yeap/yeap.toml`
/// 3. `~/.config/yeap/yeap.toml`
/// 4. `./yeap.toml`
/// 5. `YEAP_*` environment variables
pub fn load_config() -> Result<YeapConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<YeapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YeapConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<YeapConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(YeapConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(YeapConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Environment provider mapping `YEAP_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `YEAP_SERVER_API_BASE_URL`
/// must become `server.api_base_url`, not `server.api.base.url`.
fn env_provider() -> Env {
    Env::prefixed("YEAP_").map(|key| {
        let mapped = key
            .as_str()
            .replacen("dashboard_", "dashboard.", 1)
            .replacen("store_", "store.", 1)
            .replacen("server_", "server.", 1)
            .replacen("orders_", "orders.", 1);
        mapped.into()
    })
}

/// Candidate config files, in the order their contents are used for diagnostics.
pub(crate) fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(user) = user_config_path() {
        paths.push(user);
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG));
    paths
}
