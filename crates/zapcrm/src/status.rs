// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapcrm status` command implementation.
//!
//! Queries the session service once and prints the session state, bound
//! number, and QR availability. Falls back gracefully when the service is
//! unreachable.

use std::io::IsTerminal;

use serde::Serialize;
use zapcrm_core::{SessionState, ZapcrmError};
use zapcrm_whatsapp::WhatsAppSession;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub reachable: bool,
    pub state: String,
    pub authenticated: bool,
    pub phone_number: Option<String>,
    pub qr_available: bool,
}

/// Run the `zapcrm status` command.
///
/// If `--json` is passed, outputs structured JSON for scripting.
pub async fn run_status(session: &WhatsAppSession, json: bool) -> Result<(), ZapcrmError> {
    let response = match session.status().await {
        Ok(status) => {
            let qr_available = if status.state == SessionState::Connecting {
                session.qr_code().await.unwrap_or(None).is_some()
            } else {
                false
            };
            StatusResponse {
                reachable: true,
                state: status.state.to_string(),
                authenticated: status.authenticated,
                phone_number: status.phone_number,
                qr_available,
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, "status query failed");
            StatusResponse {
                reachable: false,
                state: "unreachable".to_string(),
                authenticated: false,
                phone_number: None,
                qr_available: false,
            }
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = std::io::stdout().is_terminal();
        print_status(&response, use_color);
    }

    Ok(())
}

/// Print human-readable status with optional colors.
fn print_status(response: &StatusResponse, use_color: bool) {
    println!();
    println!("  zapcrm session");
    println!("  {}", "-".repeat(35));

    if use_color {
        use colored::Colorize;
        let state = match (response.reachable, response.authenticated) {
            (false, _) => format!("{} {}", "✗".red(), response.state.red()),
            (true, true) => format!("{} {}", "✓".green(), response.state.green()),
            (true, false) => format!("{} {}", "•".yellow(), response.state.yellow()),
        };
        println!("    State:    {state}");
    } else {
        let marker = match (response.reachable, response.authenticated) {
            (false, _) => "[FAIL]",
            (true, true) => "[OK]",
            (true, false) => "[..]",
        };
        println!("    State:    {marker} {}", response.state);
    }

    if let Some(number) = &response.phone_number {
        println!("    Number:   {number}");
    }
    if response.qr_available {
        println!("    QR code:  available (run `zapcrm qr` to print it)");
    }
    if !response.reachable {
        println!();
        println!("  Is the session service running?");
    }
    println!();
}
