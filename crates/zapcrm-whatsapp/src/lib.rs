// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp integration for ZapCRM: session client, phone reconciliation,
//! and background polling.
//!
//! The external session service owns the messaging protocol; this crate
//! speaks its HTTP surface and layers CRM semantics on top: matching
//! platform messages to leads, ordering history, and surfacing session
//! state changes through watch channels.

pub mod client;
pub mod payload;
pub mod phone;
pub mod poller;
pub mod reconcile;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use zapcrm_config::model::WhatsAppConfig;
use zapcrm_core::{Lead, SessionStatus, WaMessage, ZapcrmError};

pub use client::{SendReceipt, WhatsAppClient};
pub use payload::MessagesPayload;
pub use poller::{LeadMessages, PollerSettings, SessionPoller, SessionSnapshot};

/// High-level session facade combining the HTTP client with lead
/// reconciliation.
///
/// Cheap to clone; all clones share one HTTP client.
#[derive(Debug, Clone)]
pub struct WhatsAppSession {
    client: Arc<WhatsAppClient>,
    command_poll_delay: Duration,
}

impl WhatsAppSession {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, ZapcrmError> {
        Ok(Self {
            client: Arc::new(WhatsAppClient::new(config)?),
            command_poll_delay: Duration::from_secs(config.command_poll_delay_secs),
        })
    }

    pub fn client(&self) -> Arc<WhatsAppClient> {
        Arc::clone(&self.client)
    }

    /// Current session status as reported by the service.
    pub async fn status(&self) -> Result<SessionStatus, ZapcrmError> {
        self.client.status().await
    }

    /// Current QR code, if the handshake has produced one.
    pub async fn qr_code(&self) -> Result<Option<String>, ZapcrmError> {
        self.client.qr_code().await
    }

    /// Requests a connection, then re-polls status after a short delay.
    ///
    /// The transport is polling-only: commands are acknowledged
    /// immediately and take effect asynchronously, so the returned status
    /// reflects the first observation after the command, not a guarantee.
    pub async fn connect(&self) -> Result<SessionStatus, ZapcrmError> {
        let ack = self.client.connect().await?;
        debug!(ack = %ack, "connect command acknowledged");
        tokio::time::sleep(self.command_poll_delay).await;
        self.client.status().await
    }

    /// Requests a teardown, then re-polls status after a short delay.
    pub async fn disconnect(&self) -> Result<SessionStatus, ZapcrmError> {
        let ack = self.client.disconnect().await?;
        debug!(ack = %ack, "disconnect command acknowledged");
        tokio::time::sleep(self.command_poll_delay).await;
        self.client.status().await
    }

    /// Sends `body` to a phone number, canonicalized first. `lead_id`
    /// tags the outbound message for CRM correlation.
    pub async fn send_message(
        &self,
        number: &str,
        body: &str,
        lead_id: Option<&str>,
    ) -> Result<SendReceipt, ZapcrmError> {
        let number = phone::canonicalize(number);
        if number.is_empty() {
            return Err(ZapcrmError::Internal(
                "recipient has no usable phone number".into(),
            ));
        }
        self.client.send(&number, body, lead_id).await
    }

    /// Sends `body` to the lead's phone, tagged with the lead id.
    pub async fn send_to_lead(&self, lead: &Lead, body: &str) -> Result<SendReceipt, ZapcrmError> {
        let raw = lead.phone.as_deref().unwrap_or_default();
        self.send_message(raw, body, Some(&lead.id)).await
    }

    /// Fetches the lead's message history, newest first.
    ///
    /// A lead without a usable phone yields an empty history without any
    /// network traffic. Otherwise the contact-specific endpoint is tried
    /// first; the full message scan runs when the targeted query fails or
    /// yields nothing for this lead. The contact route may key contacts
    /// differently than the CRM formats the phone, so its failures
    /// (including 404) are logged and absorbed, never propagated. A
    /// payload in an unknown shape is likewise logged and treated as
    /// empty rather than failing the refresh.
    pub async fn messages_for_lead(&self, lead: &Lead) -> Result<Vec<WaMessage>, ZapcrmError> {
        let raw = lead.phone.as_deref().unwrap_or_default();
        let number = phone::canonicalize(raw);
        if number.is_empty() {
            return Ok(Vec::new());
        }

        match self.client.contact_messages(&number).await {
            Ok(payload) => {
                let matched = reconcile::extract_messages_for_lead(&payload, lead);
                if !matched.is_empty() {
                    return Ok(matched);
                }
            }
            Err(e) => {
                warn!(
                    lead_id = %lead.id,
                    error = %e,
                    "contact endpoint failed, falling back to full scan"
                );
            }
        }

        match self.client.messages().await {
            Ok(payload) => Ok(reconcile::extract_messages_for_lead(&payload, lead)),
            Err(ZapcrmError::Payload(msg)) => {
                warn!(lead_id = %lead.id, error = %msg, "full scan payload unusable");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Refreshes the lead's history and reports whether it contains new
    /// inbound traffic relative to `last_seen`.
    pub async fn has_new_inbound_since(
        &self,
        lead: &Lead,
        last_seen: &[WaMessage],
    ) -> Result<bool, ZapcrmError> {
        let current = self.messages_for_lead(lead).await?;
        Ok(reconcile::detect_new_inbound(last_seen, &current))
    }

    /// Clears the service's message history.
    pub async fn clear_messages(&self) -> Result<(), ZapcrmError> {
        self.client.clear_messages().await
    }

    /// Dev/test shortcut; refused unless enabled in configuration.
    pub async fn mock_authenticate(&self) -> Result<(), ZapcrmError> {
        self.client.mock_authenticate().await
    }
}
