// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the ZapCRM WhatsApp core.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use zapcrm_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("Session service: {}", config.whatsapp.api_base_url);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ZapcrmConfig;

use zapcrm_core::ZapcrmError;

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to a configuration error
pub fn load_and_validate() -> Result<ZapcrmConfig, Vec<ZapcrmError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ZapcrmError::Config(err.to_string())]),
    }
}

/// Render a list of configuration errors to stderr.
pub fn render_errors(errors: &[ZapcrmError]) {
    for error in errors {
        eprintln!("zapcrm: configuration error: {error}");
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<ZapcrmConfig, Vec<ZapcrmError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ZapcrmError::Config(err.to_string())]),
    }
}
