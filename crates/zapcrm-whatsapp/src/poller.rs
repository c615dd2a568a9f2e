// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background polling of session status and per-lead messages.
//!
//! The transport is polling-only: there is no push channel from the
//! session service. [`SessionPoller`] runs a status loop for the whole
//! session and at most one message loop for the currently active lead,
//! publishing observations through `tokio::sync::watch` so any number of
//! views can follow along without coordinating with the loops.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use zapcrm_config::model::WhatsAppConfig;
use zapcrm_core::{Lead, SessionState, SessionStatus, WaMessage};

use crate::reconcile::detect_new_inbound;
use crate::WhatsAppSession;

/// Polling cadence and display windows, decoupled from the config structs
/// so tests can run with millisecond intervals.
#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    pub status_interval: Duration,
    pub message_interval: Duration,
    pub banner_window: Duration,
}

impl PollerSettings {
    pub fn from_config(config: &WhatsAppConfig) -> Self {
        Self {
            status_interval: Duration::from_secs(config.status_poll_secs),
            message_interval: Duration::from_secs(config.message_poll_secs),
            banner_window: Duration::from_secs(config.new_message_banner_secs),
        }
    }
}

/// Last observed session state, published by the status loop.
///
/// A failed poll preserves the previous status and records the error, so
/// views keep rendering the last known state instead of flickering to
/// disconnected on every transient fault.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub qr_code: Option<String>,
    pub last_updated: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            status: SessionStatus::disconnected(),
            qr_code: None,
            last_updated: Utc::now(),
            last_error: None,
        }
    }
}

/// Last observed message history for the active lead.
#[derive(Debug, Clone)]
pub struct LeadMessages {
    pub lead_id: String,
    /// Newest first.
    pub messages: Vec<WaMessage>,
    /// Set when the latest refresh detected new inbound traffic; views
    /// show a banner until [`PollerSettings::banner_window`] elapses.
    pub new_inbound_at: Option<DateTime<Utc>>,
}

struct ActiveLead {
    lead_id: String,
    token: CancellationToken,
}

/// Owns the polling tasks for one session.
///
/// Dropping the poller does not stop the tasks; call [`shutdown`] for a
/// deterministic teardown.
///
/// [`shutdown`]: SessionPoller::shutdown
pub struct SessionPoller {
    session: WhatsAppSession,
    settings: PollerSettings,
    root: CancellationToken,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
    messages_tx: watch::Sender<Option<LeadMessages>>,
    messages_rx: watch::Receiver<Option<LeadMessages>>,
    active: Arc<Mutex<Option<ActiveLead>>>,
}

impl SessionPoller {
    /// Starts the status loop and returns the poller handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(session: WhatsAppSession, settings: PollerSettings) -> Self {
        let root = CancellationToken::new();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::initial());
        let (messages_tx, messages_rx) = watch::channel(None);

        tokio::spawn(status_loop(
            session.clone(),
            settings,
            root.child_token(),
            snapshot_tx,
        ));

        Self {
            session,
            settings,
            root,
            snapshot_rx,
            messages_tx,
            messages_rx,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Receiver for session snapshots; views call `borrow` or `changed`.
    pub fn snapshots(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Receiver for the active lead's message history.
    pub fn lead_messages(&self) -> watch::Receiver<Option<LeadMessages>> {
        self.messages_rx.clone()
    }

    /// Switches message polling to `lead`, stopping the previous lead's
    /// loop. Last call wins; a stopped loop never publishes again even if
    /// a request was already in flight.
    pub fn set_active_lead(&self, lead: Lead) {
        let token = self.root.child_token();
        {
            let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(previous) = active.take() {
                debug!(lead_id = %previous.lead_id, "stopping message loop");
                previous.token.cancel();
            }
            *active = Some(ActiveLead {
                lead_id: lead.id.clone(),
                token: token.clone(),
            });
        }

        tokio::spawn(message_loop(
            self.session.clone(),
            self.settings,
            token,
            lead,
            self.snapshot_rx.clone(),
            self.messages_tx.clone(),
            Arc::clone(&self.active),
        ));
    }

    /// Stops message polling without starting a new loop.
    pub fn clear_active_lead(&self) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = active.take() {
            debug!(lead_id = %previous.lead_id, "stopping message loop");
            previous.token.cancel();
        }
    }

    /// True while the most recent refresh for `lead_id` detected new
    /// inbound traffic and the banner window has not yet elapsed.
    pub fn has_new_inbound(&self, lead_id: &str) -> bool {
        let guard = self.messages_rx.borrow();
        let Some(current) = guard.as_ref() else {
            return false;
        };
        if current.lead_id != lead_id {
            return false;
        }
        match current.new_inbound_at {
            Some(at) => {
                let elapsed = Utc::now().signed_duration_since(at);
                elapsed.to_std().is_ok_and(|e| e < self.settings.banner_window)
            }
            None => false,
        }
    }

    /// Cancels every polling task. Idempotent.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}

async fn status_loop(
    session: WhatsAppSession,
    settings: PollerSettings,
    token: CancellationToken,
    tx: watch::Sender<SessionSnapshot>,
) {
    let mut ticker = tokio::time::interval(settings.status_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("status loop stopped");
                break;
            }
            _ = ticker.tick() => {
                poll_status_once(&session, &tx).await;
            }
        }
    }
}

async fn poll_status_once(session: &WhatsAppSession, tx: &watch::Sender<SessionSnapshot>) {
    match session.status().await {
        Ok(status) => {
            // The QR is only meaningful mid-handshake; skip the extra
            // request otherwise.
            let qr_code = if status.state == SessionState::Connecting && !status.authenticated {
                match session.qr_code().await {
                    Ok(qr) => qr,
                    Err(e) => {
                        warn!(error = %e, "QR fetch failed");
                        None
                    }
                }
            } else {
                None
            };
            tx.send_replace(SessionSnapshot {
                status,
                qr_code,
                last_updated: Utc::now(),
                last_error: None,
            });
        }
        Err(e) => {
            warn!(error = %e, "status poll failed");
            tx.send_modify(|snapshot| {
                snapshot.last_error = Some(e.to_string());
                snapshot.last_updated = Utc::now();
            });
        }
    }
}

async fn message_loop(
    session: WhatsAppSession,
    settings: PollerSettings,
    token: CancellationToken,
    lead: Lead,
    snapshots: watch::Receiver<SessionSnapshot>,
    tx: watch::Sender<Option<LeadMessages>>,
    active: Arc<Mutex<Option<ActiveLead>>>,
) {
    let mut ticker = tokio::time::interval(settings.message_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut previous: Option<Vec<WaMessage>> = None;

    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!(lead_id = %lead.id, "message loop stopped");
                break;
            }
            _ = ticker.tick() => {
                // Messages only flow while the session is authenticated;
                // an unauthenticated tick stays off the wire.
                if !snapshots.borrow().status.authenticated {
                    continue;
                }

                let current = match session.messages_for_lead(&lead).await {
                    Ok(messages) => messages,
                    Err(e) => {
                        warn!(lead_id = %lead.id, error = %e, "message refresh failed");
                        continue;
                    }
                };

                // The very first snapshot is history, never a banner.
                let new_inbound_at = match &previous {
                    Some(prev) if detect_new_inbound(prev, &current) => Some(Utc::now()),
                    _ => None,
                };

                // The active lead may have changed while the request was
                // in flight; a superseded loop must not publish.
                let still_active = {
                    let guard = active.lock().unwrap_or_else(|e| e.into_inner());
                    guard.as_ref().is_some_and(|a| a.lead_id == lead.id)
                };
                if !still_active || token.is_cancelled() {
                    break;
                }

                previous = Some(current.clone());
                tx.send_replace(Some(LeadMessages {
                    lead_id: lead.id.clone(),
                    messages: current,
                    new_inbound_at,
                }));
            }
        }
    }
}
