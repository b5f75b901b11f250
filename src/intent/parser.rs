//! Ordered command grammar for payment transcripts.
//!
//! Each rule is a full-match, case-insensitive pattern tried in declaration
//! order. The first rule that matches wins, so specific rules must stay ahead of
//! the generic named-payment rule (`pay <name> <amount>` would otherwise swallow
//! `pay till 522533 500`).

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Amount as spoken: digits with optional thousands separators and decimals.
const AMOUNT: &str = r"([\d,]+(?:\.\d+)?)";

static AMOUNT_SHAPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());

/// A concrete payment instruction, ready for confirmation and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Send money to a phone number
    SendMoney { amount: String, phone: String },
    /// Pay into a personal pochi wallet addressed by phone number
    Pochi { amount: String, phone: String },
    /// Pay a business number with an account reference
    Paybill { amount: String, business: String, account: String },
    /// Buy goods through a till number
    Till { amount: String, till: String },
    /// Withdraw cash at an agent
    Withdraw { amount: String, agent: String, store: String },
}

impl Intent {
    /// The amount as a plain decimal string (separators already stripped).
    pub fn amount(&self) -> &str {
        match self {
            Intent::SendMoney { amount, .. }
            | Intent::Pochi { amount, .. }
            | Intent::Paybill { amount, .. }
            | Intent::Till { amount, .. }
            | Intent::Withdraw { amount, .. } => amount,
        }
    }

    /// Wire name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::SendMoney { .. } => "SEND_MONEY",
            Intent::Pochi { .. } => "POCHI",
            Intent::Paybill { .. } => "PAYBILL",
            Intent::Till { .. } => "TILL",
            Intent::Withdraw { .. } => "WITHDRAW",
        }
    }
}

/// Result of parsing a transcript.
///
/// A named payment only carries the contact name; it has to be resolved
/// against the contact directory before it becomes an [`Intent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedIntent {
    Payment(Intent),
    NamedPayment {
        amount: String,
        #[serde(rename = "contactName")]
        contact_name: String,
    },
}

type Builder = fn(&Captures<'_>) -> Option<ParsedIntent>;

struct Rule {
    name: &'static str,
    pattern: Regex,
    build: Builder,
}

impl Rule {
    fn new(name: &'static str, pattern: &str, build: Builder) -> Self {
        let pattern = Regex::new(&format!("(?i)^{pattern}$")).unwrap();
        Self { name, pattern, build }
    }
}

/// Grammar rules in precedence order. Do not reorder without re-checking
/// `test_till_takes_precedence_over_named_payment`.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        Rule::new("send_money", &format!(r"send\s+{AMOUNT}\s*(?:shillings?|bob|kes)?\s+to\s+(.+)"), |c| {
            Some(ParsedIntent::Payment(Intent::SendMoney { amount: amount(c, 1)?, phone: text(c, 2) }))
        }),
        Rule::new("pochi", &format!(r"pochi\s+{AMOUNT}\s+to\s+(.+)"), |c| {
            Some(ParsedIntent::Payment(Intent::Pochi { amount: amount(c, 1)?, phone: text(c, 2) }))
        }),
        Rule::new("paybill", &format!(r"(?:pay\s*bill)\s+(\d+)\s+account\s+(\d+)\s+(?:amount\s+)?{AMOUNT}"), |c| {
            Some(ParsedIntent::Payment(Intent::Paybill { amount: amount(c, 3)?, business: text(c, 1), account: text(c, 2) }))
        }),
        Rule::new("till", &format!(r"(?:pay\s+till|buy\s+goods)\s+(\d+)\s+(?:amount\s+)?{AMOUNT}"), |c| {
            Some(ParsedIntent::Payment(Intent::Till { amount: amount(c, 2)?, till: text(c, 1) }))
        }),
        Rule::new("withdraw", &format!(r"withdraw\s+{AMOUNT}\s+agent\s+(\d+)\s+store\s+(\d+)"), |c| {
            Some(ParsedIntent::Payment(Intent::Withdraw { amount: amount(c, 1)?, agent: text(c, 2), store: text(c, 3) }))
        }),
        Rule::new("named_payment", &format!(r"(?:pay|buy\s+at|buy\s+from)\s+([a-z][a-z0-9\s]*?)\s+(?:amount\s+)?{AMOUNT}"), |c| {
            Some(ParsedIntent::NamedPayment { amount: amount(c, 2)?, contact_name: text(c, 1) })
        }),
    ]
});

/// Parse a transcript into a payment intent.
///
/// Returns `None` when no rule matches; the caller owns the error message.
pub fn parse(transcript: &str) -> Option<ParsedIntent> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return None;
    }

    for rule in RULES.iter() {
        let Some(captures) = rule.pattern.captures(transcript) else {
            continue;
        };
        if let Some(intent) = (rule.build)(&captures) {
            debug!("Transcript matched rule '{}'", rule.name);
            return Some(intent);
        }
    }

    debug!("No grammar rule matched \"{}\"", transcript);
    None
}

/// Normalize a captured amount: drop thousands separators, then require a
/// plain decimal. Zero, overflow and sign checks belong to the executor.
fn amount(captures: &Captures<'_>, group: usize) -> Option<String> {
    let raw = captures.get(group)?.as_str().replace(',', "");
    AMOUNT_SHAPE.is_match(&raw).then_some(raw)
}

fn text(captures: &Captures<'_>, group: usize) -> String {
    captures.get(group).map(|m| m.as_str().trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(transcript: &str) -> Intent {
        match parse(transcript) {
            Some(ParsedIntent::Payment(intent)) => intent,
            other => panic!("expected a concrete intent for {transcript:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_send_money_to_number() {
        assert_eq!(payment("send 500 to 0712345678"), Intent::SendMoney { amount: "500".into(), phone: "0712345678".into() });
    }

    #[test]
    fn test_send_money_with_currency_word_keeps_name_verbatim() {
        assert_eq!(payment("Send 500 shillings to David"), Intent::SendMoney { amount: "500".into(), phone: "David".into() });
        assert_eq!(payment("send 20 bob to mama mboga"), Intent::SendMoney { amount: "20".into(), phone: "mama mboga".into() });
        assert_eq!(payment("SEND 1000 KES TO 0712 345 678"), Intent::SendMoney { amount: "1000".into(), phone: "0712 345 678".into() });
    }

    #[test]
    fn test_amount_separators_are_stripped() {
        assert_eq!(payment("send 1,000 to 0712345678"), payment("send 1000 to 0712345678"));
        assert_eq!(payment("send 1,000 to 0712345678").amount(), "1000");
        assert_eq!(payment("send 12,500.50 to 0712345678").amount(), "12500.50");
    }

    #[test]
    fn test_pochi() {
        assert_eq!(payment("pochi 250 to 0722000111"), Intent::Pochi { amount: "250".into(), phone: "0722000111".into() });
    }

    #[test]
    fn test_paybill_variants() {
        let expected = Intent::Paybill { amount: "500".into(), business: "247247".into(), account: "1234".into() };
        assert_eq!(payment("pay bill 247247 account 1234 amount 500"), expected);
        assert_eq!(payment("paybill 247247 account 1234 500"), expected);
        assert_eq!(payment("  Pay Bill 247247 Account 1234 Amount 500  "), expected);
    }

    #[test]
    fn test_till_variants() {
        let expected = Intent::Till { amount: "500".into(), till: "522533".into() };
        assert_eq!(payment("pay till 522533 500"), expected);
        assert_eq!(payment("buy goods 522533 amount 500"), expected);
    }

    #[test]
    fn test_till_takes_precedence_over_named_payment() {
        assert!(matches!(parse("pay till 522533 500"), Some(ParsedIntent::Payment(Intent::Till { .. }))));
        assert!(matches!(parse("pay bill 247247 account 1234 500"), Some(ParsedIntent::Payment(Intent::Paybill { .. }))));
    }

    #[test]
    fn test_withdraw() {
        assert_eq!(
            payment("withdraw 2,000 agent 123456 store 2"),
            Intent::Withdraw { amount: "2000".into(), agent: "123456".into(), store: "2".into() }
        );
    }

    #[test]
    fn test_named_payment() {
        assert_eq!(parse("pay Naivas 1500"), Some(ParsedIntent::NamedPayment { amount: "1500".into(), contact_name: "Naivas".into() }));
        assert_eq!(
            parse("buy at Java House amount 800"),
            Some(ParsedIntent::NamedPayment { amount: "800".into(), contact_name: "Java House".into() })
        );
        assert_eq!(
            parse("buy from shop 24 300"),
            Some(ParsedIntent::NamedPayment { amount: "300".into(), contact_name: "shop 24".into() })
        );
    }

    #[test]
    fn test_unrecognized_transcripts() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("what is my balance"), None);
        assert_eq!(parse("send money to david"), None);
        assert_eq!(parse("send ,,, to david"), None);
        assert_eq!(parse("pay 500 naivas"), None);
    }

    #[test]
    fn test_intent_serializes_with_type_tag() {
        let json = serde_json::to_value(Intent::SendMoney { amount: "500".into(), phone: "0712345678".into() }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "SEND_MONEY", "amount": "500", "phone": "0712345678"}));
    }
}
