//! Persistence backends for the contact list.
//!
//! The directory always loads and saves the whole list; backends do not need to
//! support partial updates.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use super::{DirectoryError, VoiceContact};

/// Fixed storage identifier for the contact list.
pub const CONTACTS_KEY: &str = "voice_contacts";

/// Load/save primitives for the full contact list.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Load every stored contact. A store that has never been written returns an empty list.
    async fn load(&self) -> Result<Vec<VoiceContact>, DirectoryError>;

    /// Replace the stored list.
    async fn save(&self, contacts: &[VoiceContact]) -> Result<(), DirectoryError>;
}

/// JSON file under the application data directory.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for `<data_dir>/voice_contacts.json`.
    ///
    /// # Arguments
    /// * `data_dir` - Directory holding the file; created on first save
    pub fn new(data_dir: &Path) -> Self {
        Self { path: data_dir.join(format!("{CONTACTS_KEY}.json")) }
    }

    /// Location of the contact file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContactStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<VoiceContact>, DirectoryError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No contact file at {}, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(&self, contacts: &[VoiceContact]) -> Result<(), DirectoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write-then-rename so a crash never leaves a truncated list behind
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(contacts)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!("Persisted {} contact(s) to {}", contacts.len(), self.path.display());
        Ok(())
    }
}

/// Volatile store, used in tests and when persistence is not wanted.
#[derive(Default)]
pub struct MemoryStore {
    contacts: Mutex<Vec<VoiceContact>>,
}

impl MemoryStore {
    /// Create a store preloaded with `contacts`.
    pub fn with_contacts(contacts: Vec<VoiceContact>) -> Self {
        Self { contacts: Mutex::new(contacts) }
    }

    /// Copy of the last saved list.
    pub fn snapshot(&self) -> Vec<VoiceContact> {
        self.contacts.lock().clone()
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn load(&self) -> Result<Vec<VoiceContact>, DirectoryError> {
        Ok(self.contacts.lock().clone())
    }

    async fn save(&self, contacts: &[VoiceContact]) -> Result<(), DirectoryError> {
        *self.contacts.lock() = contacts.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::ContactType;

    #[tokio::test]
    async fn test_json_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_json_store_persists_full_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(&dir.path().join("nested"));
        let contacts = vec![
            VoiceContact::new("David", ContactType::Mobile, "0712345678"),
            VoiceContact::new("KPLC", ContactType::Paybill, "888880").with_account("1234"),
        ];

        store.save(&contacts).await.unwrap();
        assert!(store.path().ends_with("voice_contacts.json"));
        assert_eq!(JsonFileStore::new(&dir.path().join("nested")).load().await.unwrap(), contacts);
    }

    #[tokio::test]
    async fn test_json_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.path(), b"not json").unwrap();
        assert!(matches!(store.load().await, Err(DirectoryError::Serde(_))));
    }
}
