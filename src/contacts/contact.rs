//! Saved payment targets and number normalization.

use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PHONE_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9+\s\-()]{7,15}$").unwrap());
static DIALABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9+\s\-()]*[0-9][0-9+\s\-()]*$").unwrap());

/// Kind of payment target a contact points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    /// Regular mobile number (also what untyped legacy records load as)
    #[default]
    Mobile,
    /// Personal pochi wallet, addressed by phone number
    Pochi,
    /// Merchant till number
    Till,
    /// Business paybill number, needs an account number
    Paybill,
}

impl ContactType {
    /// Whether the contact's number is a phone number.
    pub fn is_phone(&self) -> bool {
        matches!(self, ContactType::Mobile | ContactType::Pochi)
    }
}

impl std::fmt::Display for ContactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactType::Mobile => write!(f, "mobile"),
            ContactType::Pochi => write!(f, "pochi"),
            ContactType::Till => write!(f, "till"),
            ContactType::Paybill => write!(f, "paybill"),
        }
    }
}

/// A named payment target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceContact {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ContactType,
    /// Phone number (mobile/pochi), till number, or paybill business number
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

impl VoiceContact {
    /// Create a contact without an account number.
    ///
    /// # Arguments
    /// * `name` - Display name, matched case-insensitively
    /// * `kind` - What the number addresses
    /// * `phone` - Phone, till or paybill business number, stored as given
    ///
    /// # Returns
    /// A new `VoiceContact`; numbers are normalized when the directory saves it.
    pub fn new(name: impl Into<String>, kind: ContactType, phone: impl Into<String>) -> Self {
        Self { name: name.into(), kind, phone: phone.into(), account_number: None }
    }

    /// Attach the account number a paybill contact pays into.
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account_number = Some(account.into());
        self
    }

    /// Case-insensitive name comparison.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Copy with the number normalized for its type.
    pub(crate) fn normalized(&self) -> Self {
        let phone = if self.kind.is_phone() { normalize_phone(&self.phone) } else { normalize_identifier(&self.phone) };
        Self {
            name: self.name.trim().to_string(),
            kind: self.kind,
            phone,
            account_number: self.account_number.as_deref().map(normalize_identifier).filter(|a| !a.is_empty()),
        }
    }
}

/// Whether the text already looks like a phone number rather than a name.
pub fn is_phone_like(text: &str) -> bool {
    PHONE_SHAPE.is_match(text.trim())
}

/// Whether the text is made only of phone characters (digits, `+`, spaces,
/// dashes and parentheses) with at least one digit, whatever its length.
pub fn is_dialable(text: &str) -> bool {
    DIALABLE.is_match(text.trim())
}

/// Strip formatting from a phone number and rewrite `+254` to a local `0` prefix.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')')).collect();
    match digits.strip_prefix("+254") {
        Some(rest) => format!("0{rest}"),
        None => digits,
    }
}

/// Till and paybill identifiers only lose whitespace.
pub fn normalize_identifier(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("0712 345 678"), "0712345678");
        assert_eq!(normalize_phone("+254 712-345-678"), "0712345678");
        assert_eq!(normalize_phone("(0712) 345678"), "0712345678");
        assert_eq!(normalize_phone("0712345678"), "0712345678");
    }

    #[test]
    fn test_phone_shape() {
        assert!(is_phone_like("0712345678"));
        assert!(is_phone_like(" +254712345678 "));
        assert!(is_phone_like("0712-345-678"));
        assert!(!is_phone_like("12345"));
        assert!(!is_phone_like("David"));
        assert!(!is_phone_like("07123456789012345"));
    }

    #[test]
    fn test_dialable_rejects_punctuation() {
        assert!(is_dialable("12345"));
        assert!(is_dialable(" (0712) 345-678 "));
        assert!(!is_dialable("0712345678."));
        assert!(!is_dialable("07*12#"));
        assert!(!is_dialable("+ - ()"));
        assert!(!is_dialable("dav1d"));
    }

    #[test]
    fn test_normalized_only_rewrites_phone_types() {
        let till = VoiceContact::new(" Naivas ", ContactType::Till, "+254 522 533").normalized();
        assert_eq!(till.name, "Naivas");
        assert_eq!(till.phone, "+254522533");

        let mobile = VoiceContact::new("Mum", ContactType::Mobile, "+254 712 345 678").normalized();
        assert_eq!(mobile.phone, "0712345678");
    }

    #[test]
    fn test_untyped_record_loads_as_mobile() {
        let contact: VoiceContact = serde_json::from_str(r#"{"name":"David","phone":"0712345678"}"#).unwrap();
        assert_eq!(contact.kind, ContactType::Mobile);
        assert_eq!(contact.account_number, None);

        let paybill: VoiceContact = serde_json::from_str(r#"{"name":"KPLC","type":"paybill","phone":"888880","accountNumber":"1234"}"#).unwrap();
        assert_eq!(paybill.kind, ContactType::Paybill);
        assert_eq!(paybill.account_number.as_deref(), Some("1234"));
    }
}
