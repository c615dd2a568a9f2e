// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapcrm console` command implementation.
//!
//! Runs a session poller and prints status transitions and QR
//! availability as they are observed, until Ctrl-C.

use colored::Colorize;
use zapcrm_config::model::WhatsAppConfig;
use zapcrm_core::{SessionState, ZapcrmError};
use zapcrm_whatsapp::{PollerSettings, SessionPoller, WhatsAppSession};

/// Runs the live session console until Ctrl-C.
pub async fn run_console(
    session: &WhatsAppSession,
    config: &WhatsAppConfig,
) -> Result<(), ZapcrmError> {
    let poller = SessionPoller::spawn(session.clone(), PollerSettings::from_config(config));
    let mut snapshots = poller.snapshots();

    println!("watching session at {} (Ctrl-C to stop)", config.api_base_url);

    let mut last_state: Option<SessionState> = None;
    let mut qr_shown = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();

                if let Some(error) = &snapshot.last_error {
                    eprintln!("{} {error}", "poll error:".red());
                    continue;
                }

                let state = snapshot.status.state;
                if last_state != Some(state) {
                    let label = match state {
                        SessionState::Connected => state.to_string().green(),
                        SessionState::Connecting => state.to_string().yellow(),
                        SessionState::Disconnected => state.to_string().red(),
                    };
                    match &snapshot.status.phone_number {
                        Some(number) => println!("session {label} as {number}"),
                        None => println!("session {label}"),
                    }
                    last_state = Some(state);
                    qr_shown = false;
                }

                if snapshot.qr_code.is_some() && !qr_shown {
                    println!("QR code available, run `zapcrm qr` to print it");
                    qr_shown = true;
                }
            }
        }
    }

    poller.shutdown();
    println!("{}", "console stopped".dimmed());
    Ok(())
}
