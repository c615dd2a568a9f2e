// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapcrm chat` command implementation.
//!
//! Interactive chat with one CRM lead: a message poller keeps the history
//! fresh in the background while a readline loop sends typed lines as
//! outbound messages. History renders oldest-first, like a messaging app;
//! a banner announces new inbound traffic observed since the last render.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use zapcrm_config::model::WhatsAppConfig;
use zapcrm_core::{Lead, WaMessage, ZapcrmError};
use zapcrm_whatsapp::{phone, PollerSettings, SessionPoller, WhatsAppSession};

/// Runs the per-lead chat view until Ctrl-C, Ctrl-D, or `/quit`.
pub async fn run_chat(
    session: &WhatsAppSession,
    config: &WhatsAppConfig,
    lead: Lead,
) -> Result<(), ZapcrmError> {
    let poller = SessionPoller::spawn(session.clone(), PollerSettings::from_config(config));
    poller.set_active_lead(lead.clone());
    let messages_rx = poller.lead_messages();

    let display_number = phone::format_display(
        lead.phone.as_deref().unwrap_or_default(),
        &config.country_code,
    );
    println!(
        "chat with {} ({display_number}), /quit to leave",
        lead.name.bold()
    );

    let mut rl = DefaultEditor::new()
        .map_err(|e| ZapcrmError::Internal(format!("failed to initialize readline: {e}")))?;
    let mut rendered_ids: Vec<String> = Vec::new();

    loop {
        // Render anything the poller picked up since the last prompt.
        {
            let guard = messages_rx.borrow();
            if let Some(lead_messages) = guard.as_ref() {
                render_new_messages(&lead_messages.messages, &mut rendered_ids);
            }
        }
        if poller.has_new_inbound(&lead.id) {
            println!("{}", format!("new message from {}", lead.name).yellow());
        }

        let prompt = format!("{} > ", lead.name);
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    // Empty line just refreshes the view.
                    continue;
                }
                if trimmed == "/quit" {
                    break;
                }
                let _ = rl.add_history_entry(&line);

                match session.send_to_lead(&lead, trimmed).await {
                    Ok(receipt) if receipt.success => {}
                    Ok(receipt) => {
                        eprintln!("{}: service answered {}", "not sent".red(), receipt.status);
                    }
                    Err(e) => {
                        eprintln!("{}: {e}", "error".red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C
                break;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    poller.shutdown();
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Prints messages not yet rendered, oldest first.
///
/// The poller publishes newest-first; the chat view reverses for reading
/// order. Rendered message ids are remembered so a refresh only appends.
fn render_new_messages(newest_first: &[WaMessage], rendered_ids: &mut Vec<String>) {
    for message in newest_first.iter().rev() {
        if rendered_ids.iter().any(|id| *id == message.id) {
            continue;
        }
        let when = message
            .timestamp_utc()
            .format("%Y-%m-%d %H:%M")
            .to_string();
        if message.from_me {
            println!("  {} {}", format!("[{when}] me:").dimmed(), message.body);
        } else {
            println!("  {} {}", format!("[{when}] them:").green(), message.body);
        }
        rendered_ids.push(message.id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: &str, body: &str, from_me: bool, timestamp: &str) -> WaMessage {
        WaMessage {
            id: id.into(),
            body: body.into(),
            from: "a".into(),
            to: "b".into(),
            from_me,
            timestamp: timestamp.into(),
        }
    }

    #[test]
    fn render_tracks_already_seen_messages() {
        let mut rendered = Vec::new();
        let first = vec![msg("m1", "oi", false, "2024-01-01T10:00:00Z")];
        render_new_messages(&first, &mut rendered);
        assert_eq!(rendered, vec!["m1"]);

        let second = vec![
            msg("m2", "tudo bem?", false, "2024-01-01T11:00:00Z"),
            msg("m1", "oi", false, "2024-01-01T10:00:00Z"),
        ];
        render_new_messages(&second, &mut rendered);
        assert_eq!(rendered, vec!["m1", "m2"]);
    }
}
