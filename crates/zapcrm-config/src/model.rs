// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the ZapCRM WhatsApp core.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level ZapCRM configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ZapcrmConfig {
    /// Application-wide settings.
    #[serde(default)]
    pub app: AppConfig,

    /// WhatsApp session service settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
}

/// Application-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// WhatsApp session service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Base URL of the external session service.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Seconds between session status polls.
    #[serde(default = "default_status_poll_secs")]
    pub status_poll_secs: u64,

    /// Seconds between message refreshes while authenticated.
    #[serde(default = "default_message_poll_secs")]
    pub message_poll_secs: u64,

    /// Delay before the re-poll that follows a connect/disconnect command.
    /// The transport is polling-only, so commands are fire-and-poll.
    #[serde(default = "default_command_poll_delay_secs")]
    pub command_poll_delay_secs: u64,

    /// Display window for the "new inbound message" signal.
    #[serde(default = "default_new_message_banner_secs")]
    pub new_message_banner_secs: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Permit the dev-only mock-authenticate shortcut that bypasses the
    /// real QR handshake. Must stay off in production deployments.
    #[serde(default)]
    pub allow_mock_auth: bool,

    /// Country code used for display formatting only, never for matching.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            status_poll_secs: default_status_poll_secs(),
            message_poll_secs: default_message_poll_secs(),
            command_poll_delay_secs: default_command_poll_delay_secs(),
            new_message_banner_secs: default_new_message_banner_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            allow_mock_auth: false,
            country_code: default_country_code(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://localhost:9029/api/whatsapp".to_string()
}

fn default_status_poll_secs() -> u64 {
    10
}

fn default_message_poll_secs() -> u64 {
    5
}

fn default_command_poll_delay_secs() -> u64 {
    1
}

fn default_new_message_banner_secs() -> u64 {
    3
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_country_code() -> String {
    "55".to_string()
}
