// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment-based layered configuration loading.
//!
//! Later layers override earlier ones: compiled defaults, then
//! `/etc/zapcrm/zapcrm.toml`, the user's XDG config, a local
//! `./zapcrm.toml`, and finally `ZAPCRM_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ZapcrmConfig;

/// Load configuration from the file hierarchy with env var overrides.
///
/// System-wide TOML first, then the user's XDG config, then a
/// `zapcrm.toml` in the working directory, with `ZAPCRM_*` environment
/// variables winning over everything.
pub fn load_config() -> Result<ZapcrmConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapcrmConfig::default()))
        .merge(Toml::file("/etc/zapcrm/zapcrm.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("zapcrm/zapcrm.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("zapcrm.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Useful for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<ZapcrmConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapcrmConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ZapcrmConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapcrmConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Environment variable provider for `ZAPCRM_*` overrides.
///
/// Only the section prefix becomes a dot; the rest of the key keeps its
/// underscores. A blanket `Env::split("_")` would shred multi-word field
/// names: `ZAPCRM_WHATSAPP_API_BASE_URL` has to land on
/// `whatsapp.api_base_url`.
fn env_provider() -> Env {
    Env::prefixed("ZAPCRM_").map(|key| {
        // Figment hands us the var name lowercased with the prefix
        // already stripped, e.g. "whatsapp_status_poll_secs".
        key.as_str()
            .replacen("app_", "app.", 1)
            .replacen("whatsapp_", "whatsapp.", 1)
            .into()
    })
}
