// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-zero poll intervals and a usable base URL.

use zapcrm_core::ZapcrmError;

use crate::model::ZapcrmConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ZapcrmError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ZapcrmConfig) -> Result<(), Vec<ZapcrmError>> {
    let mut errors = Vec::new();

    let url = config.whatsapp.api_base_url.trim();
    if url.is_empty() {
        errors.push(ZapcrmError::Config(
            "whatsapp.api_base_url must not be empty".to_string(),
        ));
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ZapcrmError::Config(format!(
            "whatsapp.api_base_url `{url}` must start with http:// or https://"
        )));
    }

    if config.whatsapp.status_poll_secs == 0 {
        errors.push(ZapcrmError::Config(
            "whatsapp.status_poll_secs must be at least 1".to_string(),
        ));
    }

    if config.whatsapp.message_poll_secs == 0 {
        errors.push(ZapcrmError::Config(
            "whatsapp.message_poll_secs must be at least 1".to_string(),
        ));
    }

    if config.whatsapp.request_timeout_secs == 0 {
        errors.push(ZapcrmError::Config(
            "whatsapp.request_timeout_secs must be at least 1".to_string(),
        ));
    }

    if !config.whatsapp.country_code.chars().all(|c| c.is_ascii_digit())
        || config.whatsapp.country_code.is_empty()
    {
        errors.push(ZapcrmError::Config(format!(
            "whatsapp.country_code `{}` must be numeric",
            config.whatsapp.country_code
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ZapcrmConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn zero_status_interval_fails_validation() {
        let mut config = ZapcrmConfig::default();
        config.whatsapp.status_poll_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("status_poll_secs")));
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let mut config = ZapcrmConfig::default();
        config.whatsapp.api_base_url = "ftp://example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("api_base_url")));
    }

    #[test]
    fn alphabetic_country_code_fails_validation() {
        let mut config = ZapcrmConfig::default();
        config.whatsapp.country_code = "BR".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("country_code")));
    }

    #[test]
    fn valid_custom_config_passes() {
        let mut config = ZapcrmConfig::default();
        config.whatsapp.api_base_url = "https://wa.internal:9029/api/whatsapp".to_string();
        config.whatsapp.status_poll_secs = 30;
        config.whatsapp.allow_mock_auth = true;
        assert!(validate_config(&config).is_ok());
    }
}
