//! Voice command session module.
//!
//! Orchestrates capture, parsing, contact resolution and the yes/no
//! confirmation protocol for a single payment instruction.

mod error;
mod machine;
mod state;


pub use error::SessionError;
pub use machine::{ConfirmationOutcome, IntentSink, VoiceCommandSession, is_affirmative};
pub use state::SessionState;
