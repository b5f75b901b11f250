//! In-memory contact directory with fuzzy name resolution.
//!
//! The directory mirrors the backing store. [`ContactDirectory::init`] must be
//! awaited once before lookups see stored contacts; until then the directory
//! behaves as empty rather than blocking the caller.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::contact::{ContactType, VoiceContact, is_phone_like, normalize_phone};
use super::{ContactStore, DirectoryError};

/// Owner of the saved contacts for one pipeline.
pub struct ContactDirectory {
    store: Arc<dyn ContactStore>,       // Backing store (whole-list load/save)
    contacts: RwLock<Vec<VoiceContact>>, // Insertion-ordered mirror
    loaded: OnceCell<()>,                // One-time initialization guard
}

impl ContactDirectory {
    /// Create an empty directory over a backing store.
    ///
    /// # Arguments
    /// * `store` - Persistence for the whole contact list
    ///
    /// # Returns
    /// A new `ContactDirectory`; call [`ContactDirectory::init`] to load the store.
    pub fn new(store: Arc<dyn ContactStore>) -> Self {
        Self { store, contacts: RwLock::new(Vec::new()), loaded: OnceCell::new() }
    }

    /// Load the store into memory. Subsequent calls are no-ops.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read; a later call retries.
    pub async fn init(&self) -> Result<(), DirectoryError> {
        self.loaded
            .get_or_try_init(|| async {
                let loaded = self.store.load().await?;
                info!("📇 Loaded {} contact(s)", loaded.len());
                *self.contacts.write() = loaded;
                Ok::<_, DirectoryError>(())
            })
            .await?;
        Ok(())
    }

    /// All contacts in insertion order.
    pub fn list(&self) -> Vec<VoiceContact> {
        self.contacts.read().clone()
    }

    /// Insert a contact, or update the one with the same name (case-insensitive).
    ///
    /// # Errors
    /// Returns an error if validation fails or the store rejects the write.
    pub async fn save(&self, contact: VoiceContact) -> Result<VoiceContact, DirectoryError> {
        let contact = contact.normalized();
        if contact.name.is_empty() {
            return Err(DirectoryError::MissingName);
        }
        if contact.phone.is_empty() {
            return Err(DirectoryError::MissingNumber(contact.name));
        }
        if contact.kind == ContactType::Paybill && contact.account_number.is_none() {
            return Err(DirectoryError::MissingAccountNumber(contact.name));
        }

        let snapshot = {
            let mut contacts = self.contacts.write();
            match contacts.iter_mut().find(|c| c.is_named(&contact.name)) {
                Some(existing) => {
                    debug!("Updating contact '{}'", existing.name);
                    *existing = contact.clone();
                }
                None => {
                    debug!("Adding contact '{}'", contact.name);
                    contacts.push(contact.clone());
                }
            }
            contacts.clone()
        };

        self.store.save(&snapshot).await?;
        Ok(contact)
    }

    /// Remove a contact by name (case-insensitive).
    ///
    /// # Returns
    /// `true` if a contact was removed, `false` if none had that name.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub async fn delete(&self, name: &str) -> Result<bool, DirectoryError> {
        let snapshot = {
            let mut contacts = self.contacts.write();
            let before = contacts.len();
            contacts.retain(|c| !c.is_named(name));
            if contacts.len() == before {
                return Ok(false);
            }
            contacts.clone()
        };

        self.store.save(&snapshot).await?;
        Ok(true)
    }

    /// Remove every contact.
    ///
    /// # Errors
    /// Returns an error if the store rejects the write.
    pub async fn clear(&self) -> Result<(), DirectoryError> {
        self.contacts.write().clear();
        self.store.save(&[]).await
    }

    /// Resolve a spoken target to a phone number.
    ///
    /// Phone-shaped input is normalized and returned without a lookup. Names
    /// only match mobile and pochi contacts, never tills or paybills.
    pub fn resolve_phone_or_name(&self, query: &str) -> Option<String> {
        if is_phone_like(query) {
            return Some(normalize_phone(query));
        }
        self.find(query, |c| c.kind.is_phone()).map(|c| c.phone)
    }

    /// Resolve a spoken name to a full contact of any type.
    ///
    /// Phone-shaped input yields an unsaved mobile contact for that number.
    pub fn resolve_contact(&self, query: &str) -> Option<VoiceContact> {
        if is_phone_like(query) {
            let phone = normalize_phone(query);
            return Some(VoiceContact::new(phone.clone(), ContactType::Mobile, phone));
        }
        self.find(query, |_| true)
    }

    /// Exact name, then name prefix, then per-word prefix. Ties go to the
    /// earliest inserted contact.
    fn find(&self, query: &str, eligible: impl Fn(&VoiceContact) -> bool) -> Option<VoiceContact> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return None;
        }

        let contacts = self.contacts.read();
        let candidates: Vec<(String, &VoiceContact)> =
            contacts.iter().filter(|&c| eligible(c)).map(|c| (c.name.trim().to_lowercase(), c)).collect();

        let found = candidates
            .iter()
            .find(|(name, _)| *name == query)
            .or_else(|| candidates.iter().find(|(name, _)| name.starts_with(&query)))
            .or_else(|| candidates.iter().find(|(name, _)| words_overlap(&query, name)))
            .map(|(_, contact)| (*contact).clone());

        if let Some(ref contact) = found {
            debug!("Resolved '{}' to contact '{}'", query, contact.name);
        }
        found
    }
}

/// Every query word must prefix some word of the name, in any order.
fn words_overlap(query: &str, name: &str) -> bool {
    let name_words: Vec<&str> = name.split_whitespace().collect();
    query.split_whitespace().all(|q| name_words.iter().any(|w| w.starts_with(q)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contacts::MemoryStore;

    async fn directory(contacts: Vec<VoiceContact>) -> (ContactDirectory, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_contacts(contacts));
        let directory = ContactDirectory::new(store.clone());
        directory.init().await.unwrap();
        (directory, store)
    }

    fn david() -> VoiceContact {
        VoiceContact::new("David", ContactType::Mobile, "0712345678")
    }

    #[tokio::test]
    async fn test_phone_input_bypasses_lookup() {
        let decoy = VoiceContact::new("0712345678", ContactType::Mobile, "0799000111");
        let (dir, _) = directory(vec![decoy]).await;
        assert_eq!(dir.resolve_phone_or_name("0712345678").as_deref(), Some("0712345678"));
        assert_eq!(dir.resolve_phone_or_name("+254 712 345678").as_deref(), Some("0712345678"));
        assert_eq!(dir.resolve_contact("0712345678").map(|c| c.phone).as_deref(), Some("0712345678"));
    }

    #[tokio::test]
    async fn test_name_resolution_precedence() {
        let (dir, _) = directory(vec![david()]).await;
        assert_eq!(dir.resolve_phone_or_name("david").as_deref(), Some("0712345678"));
        assert_eq!(dir.resolve_phone_or_name("dav").as_deref(), Some("0712345678"));
        assert_eq!(dir.resolve_contact("David"), Some(david()));
        assert_eq!(dir.resolve_phone_or_name("peter"), None);
        assert_eq!(dir.resolve_phone_or_name("  "), None);
    }

    #[tokio::test]
    async fn test_word_prefix_match_is_order_independent() {
        let (dir, _) = directory(vec![VoiceContact::new("John Doe", ContactType::Mobile, "0711111111")]).await;
        assert_eq!(dir.resolve_phone_or_name("doe").as_deref(), Some("0711111111"));
        assert_eq!(dir.resolve_phone_or_name("do jo").as_deref(), Some("0711111111"));
        assert_eq!(dir.resolve_phone_or_name("john smith"), None);
    }

    #[tokio::test]
    async fn test_exact_match_beats_earlier_prefix_match() {
        let (dir, _) = directory(vec![
            VoiceContact::new("Jonathan", ContactType::Mobile, "0700000001"),
            VoiceContact::new("Jon", ContactType::Mobile, "0700000002"),
        ])
        .await;
        assert_eq!(dir.resolve_phone_or_name("jon").as_deref(), Some("0700000002"));
        // Both prefix-match; insertion order breaks the tie
        assert_eq!(dir.resolve_phone_or_name("jo").as_deref(), Some("0700000001"));
    }

    #[tokio::test]
    async fn test_phone_lookup_skips_merchant_contacts() {
        let (dir, _) = directory(vec![VoiceContact::new("David", ContactType::Till, "522533")]).await;
        assert_eq!(dir.resolve_phone_or_name("david"), None);
        assert_eq!(dir.resolve_contact("david").map(|c| c.kind), Some(ContactType::Till));
    }

    #[tokio::test]
    async fn test_save_upserts_case_insensitively_and_persists() {
        let (dir, store) = directory(vec![david()]).await;
        dir.save(VoiceContact::new("DAVID", ContactType::Pochi, "+254 722 000 111")).await.unwrap();

        let contacts = dir.list();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].kind, ContactType::Pochi);
        assert_eq!(contacts[0].phone, "0722000111");
        assert_eq!(store.snapshot(), contacts);
    }

    #[tokio::test]
    async fn test_save_validation() {
        let (dir, _) = directory(Vec::new()).await;
        assert!(matches!(dir.save(VoiceContact::new(" ", ContactType::Mobile, "0712345678")).await, Err(DirectoryError::MissingName)));
        assert!(matches!(dir.save(VoiceContact::new("A", ContactType::Mobile, " ")).await, Err(DirectoryError::MissingNumber(_))));
        assert!(matches!(
            dir.save(VoiceContact::new("KPLC", ContactType::Paybill, "888880")).await,
            Err(DirectoryError::MissingAccountNumber(_))
        ));
        assert!(dir.list().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (dir, store) = directory(vec![david(), VoiceContact::new("Mum", ContactType::Mobile, "0722000111")]).await;
        assert!(dir.delete("DAVID").await.unwrap());
        assert!(!dir.delete("david").await.unwrap());
        assert_eq!(store.snapshot().len(), 1);

        dir.clear().await.unwrap();
        assert!(dir.list().is_empty());
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_uninitialized_directory_is_empty() {
        let store = Arc::new(MemoryStore::with_contacts(vec![david()]));
        let dir = ContactDirectory::new(store);
        assert_eq!(dir.resolve_phone_or_name("david"), None);

        dir.init().await.unwrap();
        dir.init().await.unwrap();
        assert_eq!(dir.resolve_phone_or_name("david").as_deref(), Some("0712345678"));
    }
}
