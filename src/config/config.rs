//! Application configuration and CLI argument parsing.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::contacts::ContactType;

/// Voice payment application configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "voice-pay")]
#[command(author, version, about = "Speak a mobile money instruction, confirm it, and hand it off", long_about = None)]
pub struct AppConfig {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory holding the saved contact list
    #[arg(long, short = 'd', env = "VOICE_PAY_DATA_DIR", default_value_os_t = default_data_dir(), global = true)]
    pub data_dir: PathBuf,

    /// Locale passed to speech capture
    #[arg(long, default_value = "en-KE")]
    pub locale: String,

    /// Text-to-speech command; the phrase is appended as the last argument
    #[arg(long, env = "VOICE_PAY_TTS", default_value = "espeak-ng")]
    pub tts_command: String,

    /// Do not speak; readback and prompts are only logged
    #[arg(long)]
    pub mute: bool,

    /// How many times to ask for a yes/no answer before giving up (1-10)
    #[arg(long, default_value = "3", value_parser = parse_attempts)]
    pub max_confirmation_attempts: u32,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Listen for voice commands (default)
    Listen,
    /// Parse a transcript and print the intent without executing anything
    Parse {
        /// Transcript words, e.g. `send 500 to 0712345678`
        #[arg(required = true, num_args = 1..)]
        transcript: Vec<String>,
    },
    /// Manage saved contacts
    Contacts {
        #[command(subcommand)]
        action: ContactsCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ContactsCommand {
    /// List saved contacts
    List,
    /// Add or update a contact
    Add {
        /// Contact name (unique, case-insensitive)
        name: String,
        /// Phone, till or paybill business number
        number: String,
        /// Kind of payment target
        #[arg(long = "type", value_enum, default_value = "mobile")]
        kind: ContactType,
        /// Account number (paybill only)
        #[arg(long)]
        account: Option<String>,
    },
    /// Remove a contact by name
    Remove { name: String },
    /// Remove all contacts
    Clear,
}

impl AppConfig {
    /// Parse configuration from command line arguments.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.exists() && !self.data_dir.is_dir() {
            anyhow::bail!("Data path is not a directory: {}", self.data_dir.display());
        }

        if !self.mute && self.tts_command.trim().is_empty() {
            anyhow::bail!("TTS command is empty; pass --mute to disable speech output");
        }

        if self.locale.trim().is_empty() {
            anyhow::bail!("Locale must not be empty");
        }

        Ok(())
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        info!("Configuration:");
        info!("  Data directory: {}", self.data_dir.display());
        info!("  Locale: {}", self.locale);
        if self.mute {
            info!("  Speech output: muted");
        } else {
            info!("  TTS command: {}", self.tts_command);
        }
        info!("  Confirmation attempts: {}", self.max_confirmation_attempts);
    }
}

/// Get the default data directory (~/.voice-pay).
fn default_data_dir() -> PathBuf {
    if let Some(home_dir) = dirs::home_dir() {
        home_dir.join(".voice-pay")
    } else {
        PathBuf::from(".voice-pay")
    }
}

/// Parse and validate the confirmation attempt count (1-10).
fn parse_attempts(s: &str) -> Result<u32, String> {
    let value: u32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if (1..=10).contains(&value) {
        Ok(value)
    } else {
        Err(format!("confirmation attempts must be between 1 and 10, got {}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_listen() {
        let config = AppConfig::try_parse_from(["voice-pay", "--mute"]).unwrap();
        assert!(config.command.is_none());
        assert_eq!(config.max_confirmation_attempts, 3);
        assert_eq!(config.locale, "en-KE");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_attempts_range() {
        assert!(AppConfig::try_parse_from(["voice-pay", "--max-confirmation-attempts", "0"]).is_err());
        assert!(AppConfig::try_parse_from(["voice-pay", "--max-confirmation-attempts", "11"]).is_err());
        assert!(AppConfig::try_parse_from(["voice-pay", "--max-confirmation-attempts", "5"]).is_ok());
    }

    #[test]
    fn test_contacts_add_subcommand() {
        let config = AppConfig::try_parse_from(["voice-pay", "contacts", "add", "KPLC", "888880", "--type", "paybill", "--account", "1234"]).unwrap();
        match config.command {
            Some(Command::Contacts { action: ContactsCommand::Add { name, number, kind, account } }) => {
                assert_eq!(name, "KPLC");
                assert_eq!(number, "888880");
                assert_eq!(kind, ContactType::Paybill);
                assert_eq!(account.as_deref(), Some("1234"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_data_dir_must_be_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = AppConfig::try_parse_from(["voice-pay", "--mute", "--data-dir", file.path().to_str().unwrap()]).unwrap();
        assert!(config.validate().is_err());
    }
}
