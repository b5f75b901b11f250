//! Voice Pay - hands-free mobile money instructions.
//!
//! Listens for a spoken payment instruction ("send 500 to 0712345678"), parses
//! it into a typed intent, resolves saved contact names, reads the intent back
//! and only hands it off after an explicit yes or a manual confirm.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::LocalTime;

use voice_pay::config::{AppConfig, Command, ContactsCommand};
use voice_pay::contacts::{ContactDirectory, JsonFileStore, VoiceContact};
use voice_pay::intent::{self, Intent, ParsedIntent};
use voice_pay::session::{ConfirmationOutcome, IntentSink, VoiceCommandSession};
use voice_pay::speech::{CommandSynthesizer, ConsoleCapture, MuteSynthesizer, SpeechSynthesizer};

/// Prints confirmed intents as JSON lines for the delivery transport to pick up.
struct StdoutSink;

impl IntentSink for StdoutSink {
    fn submit(&self, intent: &Intent) {
        match serde_json::to_string(intent) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("❌ Failed to encode intent: {}", e),
        }
    }

    fn dismissed(&self) {
        debug!("Session dismissed without sending");
    }
}

/// Run voice sessions back to back until input closes or Ctrl+C.
async fn run_listen(config: &AppConfig, directory: Arc<ContactDirectory>) -> Result<()> {
    let synthesizer: Arc<dyn SpeechSynthesizer> = if config.mute {
        Arc::new(MuteSynthesizer)
    } else {
        Arc::new(CommandSynthesizer::new(&config.tts_command).context("Failed to set up speech output")?)
    };

    let mut session =
        VoiceCommandSession::new(Arc::new(ConsoleCapture::new()), synthesizer, directory, Arc::new(StdoutSink), config.locale.clone());

    info!("Type what you would say, e.g. \"send 500 to 0712345678\". Ctrl+C to quit.");

    loop {
        let result = tokio::select! {
            result = session.run_once(config.max_confirmation_attempts) => Some(result),
            _ = wait_for_shutdown() => None,
        };

        let Some(result) = result else {
            session.cancel();
            break;
        };

        match result {
            Ok(ConfirmationOutcome::Executed(intent)) => info!("📤 Submitted {} for {}", intent.kind(), intent.amount()),
            Ok(ConfirmationOutcome::Cancelled) => info!("Nothing was sent"),
            Ok(ConfirmationOutcome::Retry(e)) if e.is_input_closed() => break,
            Ok(ConfirmationOutcome::Retry(_)) => warn!("No answer heard, nothing was sent"),
            Err(e) if e.is_input_closed() => break,
            Err(_) => debug!(
                "Session ended in {} state after \"{}\": {}",
                session.state(),
                session.last_transcript().unwrap_or_default(),
                session.last_error().unwrap_or_default()
            ),
        }
    }

    info!("✅ Voice Pay stopped");
    Ok(())
}

/// Parse a transcript offline and print what would be confirmed.
fn run_parse(transcript: &str) -> Result<()> {
    match intent::parse(transcript) {
        Some(ParsedIntent::Payment(payment)) => {
            println!("{}", intent::describe(&payment));
            println!("{}", serde_json::to_string_pretty(&payment)?);
        }
        Some(named @ ParsedIntent::NamedPayment { .. }) => {
            println!("Named payment; the contact is resolved when spoken in a session.");
            println!("{}", serde_json::to_string_pretty(&named)?);
        }
        None => anyhow::bail!("Unrecognized transcript: \"{}\"", transcript),
    }
    Ok(())
}

async fn run_contacts(directory: &ContactDirectory, action: ContactsCommand) -> Result<()> {
    directory.init().await.context("Failed to load contacts")?;

    match action {
        ContactsCommand::List => {
            let contacts = directory.list();
            println!("{:<24} {:<8} {:<16} ACCOUNT", "NAME", "TYPE", "NUMBER");
            println!("{}", "─".repeat(60));
            for c in &contacts {
                println!("{:<24} {:<8} {:<16} {}", c.name, c.kind.to_string(), c.phone, c.account_number.as_deref().unwrap_or("-"));
            }
            println!("\n{} contact(s)", contacts.len());
        }
        ContactsCommand::Add { name, number, kind, account } => {
            let mut contact = VoiceContact::new(name, kind, number);
            contact.account_number = account;
            let saved = directory.save(contact).await.context("Failed to save contact")?;
            info!("📇 Saved {} ({}: {})", saved.name, saved.kind, saved.phone);
        }
        ContactsCommand::Remove { name } => {
            if directory.delete(&name).await.context("Failed to remove contact")? {
                info!("🗑️  Removed {}", name);
            } else {
                warn!("No contact named {}", name);
            }
        }
        ContactsCommand::Clear => {
            directory.clear().await.context("Failed to clear contacts")?;
            info!("🗑️  Removed all contacts");
        }
    }
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn wait_for_shutdown() {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("🛑 Received Ctrl+C, shutting down...");
        }
        _ = async {
            #[cfg(unix)]
            {
                match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                    Ok(mut sigterm) => { sigterm.recv().await; }
                    Err(e) => {
                        warn!("Failed to register SIGTERM handler: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await;
            }
        } => {
            info!("🛑 Received SIGTERM, shutting down...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let config = AppConfig::from_args();

    // Respect RUST_LOG env var, fallback to verbose flag, default to info
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| if config.verbose { EnvFilter::try_new("debug") } else { EnvFilter::try_new("info") })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_timer(LocalTime::new(time::macros::format_description!("[hour]:[minute]:[second]")))
        .init();

    info!("💸 Voice Pay v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }

    let directory = Arc::new(ContactDirectory::new(Arc::new(JsonFileStore::new(&config.data_dir))));

    match config.command.clone().unwrap_or(Command::Listen) {
        Command::Parse { transcript } => run_parse(&transcript.join(" ")),
        Command::Contacts { action } => run_contacts(&directory, action).await,
        Command::Listen => {
            config.log_config();
            run_listen(&config, directory).await?;
            // A pending stdin read cannot be cancelled and would hold the runtime open
            std::process::exit(0);
        }
    }
}
