// SPDX-FileCopyrightText: 2026 Yeap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Yeap dashboard.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently falling back to a default.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use yeap_core::OpeningHours;

/// Top-level Yeap configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YeapConfig {
    /// Dashboard process settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// The store this dashboard operates.
    #[serde(default)]
    pub store: StoreConfig,

    /// Realtime socket and REST endpoints.
    #[serde(default)]
    pub server: ServerConfig,

    /// Order intake and countdown timing.
    #[serde(default)]
    pub orders: OrdersConfig,
}

/// Dashboard process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Name of the logged-in operator, used in log context only.
    #[serde(default)]
    pub operator_name: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            operator_name: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Store selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store identifier. Required by `yeap watch` unless passed on the command line.
    #[serde(default)]
    pub id: Option<String>,

    /// Display name of the store.
    #[serde(default)]
    pub name: String,

    /// Weekly opening hours, e.g. `[store.opening_hours.monday]` with
    /// `open_hour = "11:00"` and `close_hour = "23:00"`. Unset means always open.
    #[serde(default)]
    pub opening_hours: Option<OpeningHours>,
}

/// Server endpoint configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// WebSocket URL of the realtime server.
    #[serde(default = "default_socket_url")]
    pub socket_url: String,

    /// Base URL of the REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token sent with REST requests and the socket handshake.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Seconds to wait for the `joinStore` acknowledgement.
    #[serde(default = "default_join_timeout_secs")]
    pub join_timeout_secs: u64,

    /// Seconds before a REST request is abandoned.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("socket_url", &self.socket_url)
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("join_timeout_secs", &self.join_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_url: default_socket_url(),
            api_base_url: default_api_base_url(),
            api_token: None,
            join_timeout_secs: default_join_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_secs(self.join_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_socket_url() -> String {
    "ws://localhost:3333/socket".to_string()
}

fn default_api_base_url() -> String {
    "http://localhost:3333".to_string()
}

fn default_join_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Order intake and countdown timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrdersConfig {
    /// Seconds an order just moved to DELIVERING stays "new" before auto-confirmation.
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,

    /// Countdown tick period in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Delay between the fade-out of a card and its status change, in milliseconds.
    #[serde(default = "default_fade_delay_millis")]
    pub fade_delay_millis: u64,

    /// Page size for the pending-orders snapshot taken at session start.
    #[serde(default = "default_snapshot_page_size")]
    pub snapshot_page_size: u32,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            tick_millis: default_tick_millis(),
            fade_delay_millis: default_fade_delay_millis(),
            snapshot_page_size: default_snapshot_page_size(),
        }
    }
}

impl OrdersConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }

    pub fn fade_delay(&self) -> Duration {
        Duration::from_millis(self.fade_delay_millis)
    }
}

fn default_countdown_secs() -> u32 {
    30
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_fade_delay_millis() -> u64 {
    500
}

fn default_snapshot_page_size() -> u32 {
    100
}
