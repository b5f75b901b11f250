//! Payment intents spoken by the user.
//!
//! Provides the ordered command grammar that turns a transcript into a typed
//! intent, and the describer that reads a concrete intent back as a sentence.

mod describe;
mod parser;

pub use describe::describe;
pub use parser::{Intent, ParsedIntent, parse};
