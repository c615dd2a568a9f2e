// SPDX-FileCopyrightText: 2026 ZapCRM Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! ZapCRM - WhatsApp messaging console for CRM leads.
//!
//! This is the binary entry point for the ZapCRM WhatsApp integration.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod chat;
mod console;
mod status;

use clap::{Parser, Subcommand};
use zapcrm_core::{Lead, ZapcrmError};
use zapcrm_whatsapp::WhatsAppSession;

/// ZapCRM - WhatsApp messaging console for CRM leads.
#[derive(Parser, Debug)]
#[command(name = "zapcrm", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the current WhatsApp session status.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
    },
    /// Request a session connection and report the resulting status.
    Connect,
    /// Request a session teardown and report the resulting status.
    Disconnect,
    /// Send a message to a phone number.
    Send {
        /// Recipient phone number, any common formatting.
        #[arg(long)]
        number: String,
        /// Message body.
        #[arg(long)]
        message: String,
        /// CRM lead id to tag the outbound message with.
        #[arg(long)]
        lead_id: Option<String>,
    },
    /// Print the current QR code payload, if the handshake produced one.
    Qr,
    /// Live session console: status transitions and QR availability.
    Console,
    /// Interactive chat with one CRM lead.
    Chat {
        /// CRM lead id.
        #[arg(long)]
        lead_id: String,
        /// Lead phone number, any common formatting.
        #[arg(long)]
        phone: String,
        /// Lead display name.
        #[arg(long, default_value = "lead")]
        name: String,
    },
    /// Clear the session service's message history.
    ClearMessages,
    /// Force the session into an authenticated state (dev only, gated by
    /// whatsapp.allow_mock_auth).
    MockAuth,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match zapcrm_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            zapcrm_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.app.log_level);

    if let Err(e) = run(cli, &config).await {
        eprintln!("zapcrm: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &zapcrm_config::model::ZapcrmConfig) -> Result<(), ZapcrmError> {
    let session = WhatsAppSession::new(&config.whatsapp)?;

    match cli.command {
        Some(Commands::Status { json }) => status::run_status(&session, json).await,
        Some(Commands::Connect) => {
            let status = session.connect().await?;
            println!("session: {} (authenticated: {})", status.state, status.authenticated);
            Ok(())
        }
        Some(Commands::Disconnect) => {
            let status = session.disconnect().await?;
            println!("session: {}", status.state);
            Ok(())
        }
        Some(Commands::Send {
            number,
            message,
            lead_id,
        }) => {
            let receipt = session
                .send_message(&number, &message, lead_id.as_deref())
                .await?;
            match receipt.message_id {
                Some(id) => println!("sent to {} ({}, id {id})", receipt.to, receipt.status),
                None => println!("sent to {} ({})", receipt.to, receipt.status),
            }
            Ok(())
        }
        Some(Commands::Qr) => {
            match session.qr_code().await? {
                Some(qr) => println!("{qr}"),
                None => println!("no QR code available; session may already be connected"),
            }
            Ok(())
        }
        Some(Commands::Console) => console::run_console(&session, &config.whatsapp).await,
        Some(Commands::Chat {
            lead_id,
            phone,
            name,
        }) => {
            let lead = Lead {
                id: lead_id,
                name,
                phone: Some(phone),
            };
            chat::run_chat(&session, &config.whatsapp, lead).await
        }
        Some(Commands::ClearMessages) => {
            session.clear_messages().await?;
            println!("message history cleared");
            Ok(())
        }
        Some(Commands::MockAuth) => {
            session.mock_authenticate().await?;
            println!("mock authentication accepted");
            Ok(())
        }
        None => {
            println!("zapcrm: use --help for available commands");
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zapcrm={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config =
            zapcrm_config::load_and_validate_str("").expect("default config should be valid");
        assert_eq!(config.whatsapp.status_poll_secs, 10);
    }
}
