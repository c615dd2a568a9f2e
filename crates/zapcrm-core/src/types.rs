// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the ZapCRM WhatsApp core.
//!
//! Leads are owned by the CRM persistence layer and messages by the
//! external session service; both appear here as read-only projections
//! carrying only the fields this core consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A CRM sales-prospect record, projected to the fields the
/// reconciliation core reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    /// Raw CRM-format phone string. `None` means "telephone not
    /// registered" and disables all message reconciliation for this lead.
    #[serde(default)]
    pub phone: Option<String>,
}

/// A single WhatsApp message as delivered by the session service.
///
/// `from`/`to` carry platform-native identifiers; exactly one of them
/// usually bears the `@c.us` style suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(rename = "fromMe", default)]
    pub from_me: bool,
    #[serde(default)]
    pub timestamp: String,
}

impl WaMessage {
    /// Parses the message timestamp as RFC 3339.
    ///
    /// Malformed timestamps resolve to the Unix epoch rather than
    /// erroring, so bad entries sort last instead of failing the whole
    /// reconciliation pass.
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// Client-side view of the externally-owned WhatsApp session state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize, Default,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Disconnected,
    /// Awaiting QR scan / platform-side handshake.
    Connecting,
    Connected,
}

impl SessionState {
    /// Folds the session service's richer status vocabulary into the
    /// three-state model.
    ///
    /// The original service reports `initializing` and `qr_received`
    /// during the handshake and `authenticated`/`connected` once bound;
    /// anything unrecognized (including `error`) reads as disconnected.
    pub fn from_platform(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "connected" | "authenticated" => SessionState::Connected,
            "connecting" | "initializing" | "qr_received" => SessionState::Connecting,
            _ => SessionState::Disconnected,
        }
    }
}

/// A polled status snapshot of the external session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub authenticated: bool,
    /// The platform's bound number, canonical-ish; present once
    /// authenticated.
    pub phone_number: Option<String>,
    /// When this status was read.
    pub timestamp: DateTime<Utc>,
}

impl SessionStatus {
    /// A disconnected status stamped with the current time.
    pub fn disconnected() -> Self {
        Self {
            state: SessionState::Disconnected,
            authenticated: false,
            phone_number: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_states_fold_to_three() {
        assert_eq!(
            SessionState::from_platform("connected"),
            SessionState::Connected
        );
        assert_eq!(
            SessionState::from_platform("authenticated"),
            SessionState::Connected
        );
        assert_eq!(
            SessionState::from_platform("initializing"),
            SessionState::Connecting
        );
        assert_eq!(
            SessionState::from_platform("qr_received"),
            SessionState::Connecting
        );
        assert_eq!(
            SessionState::from_platform("error"),
            SessionState::Disconnected
        );
        assert_eq!(SessionState::from_platform(""), SessionState::Disconnected);
        assert_eq!(
            SessionState::from_platform("  Connected "),
            SessionState::Connected
        );
    }

    #[test]
    fn session_state_serde_is_lowercase() {
        let json = serde_json::to_string(&SessionState::Connecting).unwrap();
        assert_eq!(json, "\"connecting\"");
        let back: SessionState = serde_json::from_str("\"disconnected\"").unwrap();
        assert_eq!(back, SessionState::Disconnected);
    }

    #[test]
    fn message_timestamp_parses_rfc3339() {
        let msg = WaMessage {
            id: "m1".into(),
            body: "oi".into(),
            from: "5521987868395@c.us".into(),
            to: "me@c.us".into(),
            from_me: false,
            timestamp: "2024-01-01T10:00:00Z".into(),
        };
        assert_eq!(msg.timestamp_utc().to_rfc3339(), "2024-01-01T10:00:00+00:00");
    }

    #[test]
    fn malformed_timestamp_falls_back_to_epoch() {
        let msg = WaMessage {
            id: "m2".into(),
            body: String::new(),
            from: String::new(),
            to: String::new(),
            from_me: false,
            timestamp: "not-a-date".into(),
        };
        assert_eq!(msg.timestamp_utc(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn message_deserializes_camel_case_from_me() {
        let msg: WaMessage = serde_json::from_str(
            r#"{"id":"m1","body":"hi","from":"a","to":"b","fromMe":true,"timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(msg.from_me);
    }
}
