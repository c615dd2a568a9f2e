// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the ZapCRM WhatsApp integration.
//!
//! Provides the shared error type and the domain types exchanged between
//! the HTTP client, the reconciliation engine, and the session poller.

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ZapcrmError;
pub use types::{Lead, SessionState, SessionStatus, WaMessage};
