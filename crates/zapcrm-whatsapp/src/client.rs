// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the external WhatsApp session service.
//!
//! Provides [`WhatsAppClient`] wrapping the service's REST contract:
//! status, QR code, connect/disconnect, send, and message queries. The
//! session protocol itself (QR generation, transport, encryption) is owned
//! by the service; this client only speaks its HTTP surface.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use zapcrm_config::model::WhatsAppConfig;
use zapcrm_core::{SessionState, SessionStatus, ZapcrmError};

use crate::payload::{parse_messages_payload, MessagesPayload};

/// HTTP client for the WhatsApp session service.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
/// Multiple views sharing one instance can issue overlapping polls, which
/// the service tolerates by design.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    base_url: String,
    allow_mock_auth: bool,
}

/// Raw status payload as the service reports it.
///
/// The service's vocabulary is richer than the three-state model and the
/// bound number may arrive either top-level or nested under `info`.
#[derive(Debug, Deserialize)]
struct StatusWire {
    #[serde(default)]
    status: String,
    #[serde(default)]
    authenticated: Option<bool>,
    #[serde(rename = "phoneNumber", default)]
    phone_number: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    info: Option<StatusInfoWire>,
}

#[derive(Debug, Deserialize)]
struct StatusInfoWire {
    #[serde(default)]
    number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QrWire {
    #[serde(default)]
    qrcode: Option<String>,
    #[serde(default)]
    data: Option<QrDataWire>,
}

#[derive(Debug, Deserialize)]
struct QrDataWire {
    #[serde(default)]
    qrcode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AckWire {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct SendWire<'a> {
    number: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lead_id: Option<&'a str>,
}

/// Acknowledgement returned by the send endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SendReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
}

impl WhatsAppClient {
    /// Creates a client from the WhatsApp section of the configuration.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, ZapcrmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ZapcrmError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            allow_mock_auth: config.allow_mock_auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Fetches the current session status.
    pub async fn status(&self) -> Result<SessionStatus, ZapcrmError> {
        let wire: StatusWire = self.get_json("status").await?;

        let state = SessionState::from_platform(&wire.status);
        // The original frontend derives `authenticated` from the status
        // string when the service omits the flag.
        let authenticated = wire
            .authenticated
            .unwrap_or(state == SessionState::Connected);
        let phone_number = wire
            .phone_number
            .or(wire.info.and_then(|i| i.number))
            .filter(|n| !n.is_empty());
        let timestamp = wire
            .timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Ok(SessionStatus {
            state,
            authenticated,
            phone_number,
            timestamp,
        })
    }

    /// Fetches the current QR code payload.
    ///
    /// The service 404s until the handshake emits a QR; that reads as
    /// `Ok(None)`, not an error.
    pub async fn qr_code(&self) -> Result<Option<String>, ZapcrmError> {
        let response = self
            .client
            .get(self.url("qrcode"))
            .send()
            .await
            .map_err(|e| ZapcrmError::transport("qrcode request failed", e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let wire: QrWire = Self::read_json(response, "qrcode").await?;
        Ok(wire.qrcode.or(wire.data.and_then(|d| d.qrcode)))
    }

    /// Requests a connection attempt; returns the service's ack status.
    pub async fn connect(&self) -> Result<String, ZapcrmError> {
        let wire: AckWire = self.post_json("connect", &serde_json::json!({})).await?;
        Ok(wire.status)
    }

    /// Requests a session teardown; returns the service's ack status.
    pub async fn disconnect(&self) -> Result<String, ZapcrmError> {
        let wire: AckWire = self.post_json("disconnect", &serde_json::json!({})).await?;
        Ok(wire.status)
    }

    /// Sends a message to a canonical number, optionally tagged with the
    /// originating CRM lead id.
    pub async fn send(
        &self,
        number: &str,
        message: &str,
        lead_id: Option<&str>,
    ) -> Result<SendReceipt, ZapcrmError> {
        let body = SendWire {
            number,
            message,
            lead_id,
        };
        self.post_json("send", &body).await
    }

    /// Fetches all stored messages across contacts.
    pub async fn messages(&self) -> Result<MessagesPayload, ZapcrmError> {
        let value: serde_json::Value = self.get_json("messages").await?;
        parse_messages_payload(value)
    }

    /// Fetches messages for one contact by canonical number.
    pub async fn contact_messages(&self, number: &str) -> Result<MessagesPayload, ZapcrmError> {
        let value: serde_json::Value = self.get_json(&format!("messages/{number}")).await?;
        parse_messages_payload(value)
    }

    /// Clears the service's message history.
    pub async fn clear_messages(&self) -> Result<(), ZapcrmError> {
        let response = self
            .client
            .delete(self.url("messages"))
            .send()
            .await
            .map_err(|e| ZapcrmError::transport("clear messages request failed", e))?;
        Self::check_status(response, "messages").await?;
        Ok(())
    }

    /// Forces the session into an authenticated state without a QR
    /// handshake. Dev/test shortcut.
    ///
    /// Refused locally unless `whatsapp.allow_mock_auth` is enabled; no
    /// request is issued when the gate is closed.
    pub async fn mock_authenticate(&self) -> Result<(), ZapcrmError> {
        if !self.allow_mock_auth {
            return Err(ZapcrmError::Config(
                "mock authentication is disabled; set whatsapp.allow_mock_auth = true".into(),
            ));
        }
        let _: serde_json::Value = self
            .post_json("mock/authenticate", &serde_json::json!({}))
            .await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, ZapcrmError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| ZapcrmError::transport(format!("GET {path} failed"), e))?;
        Self::read_json(response, path).await
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, ZapcrmError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ZapcrmError::transport(format!("POST {path} failed"), e))?;
        Self::read_json(response, path).await
    }

    async fn check_status(
        response: reqwest::Response,
        path: &str,
    ) -> Result<reqwest::Response, ZapcrmError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        debug!(path, status = %status, body = %body, "session service returned error status");
        Err(ZapcrmError::Transport {
            message: format!("{path} returned {status}: {body}"),
            source: None,
        })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        path: &str,
    ) -> Result<T, ZapcrmError> {
        let response = Self::check_status(response, path).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ZapcrmError::transport(format!("failed to read {path} body"), e))?;
        serde_json::from_str(&body).map_err(|e| {
            ZapcrmError::Payload(format!("failed to parse {path} response: {e}"))
        })
    }
}
