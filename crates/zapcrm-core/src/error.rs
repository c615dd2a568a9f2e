// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the ZapCRM WhatsApp core.

use thiserror::Error;

/// The primary error type used across all ZapCRM crates.
#[derive(Debug, Error)]
pub enum ZapcrmError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport errors against the WhatsApp session service
    /// (network failure, non-2xx response).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The session service returned a payload in none of the known shapes.
    #[error("unexpected payload shape: {0}")]
    Payload(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ZapcrmError {
    /// Builds a transport error with a captured source.
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ZapcrmError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
