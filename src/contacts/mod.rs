//! Contact directory module.
//!
//! Stores named payment targets and resolves spoken names to them.

mod contact;
mod directory;
mod store;

use thiserror::Error;

pub use contact::{ContactType, VoiceContact, is_dialable, is_phone_like, normalize_identifier, normalize_phone};
pub use directory::ContactDirectory;
pub use store::{CONTACTS_KEY, ContactStore, JsonFileStore, MemoryStore};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("contact name is required")]
    MissingName,

    #[error("contact '{0}' has no number")]
    MissingNumber(String),

    #[error("paybill contact '{0}' needs an account number")]
    MissingAccountNumber(String),

    #[error("contact storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("contact data is malformed: {0}")]
    Serde(#[from] serde_json::Error),
}
