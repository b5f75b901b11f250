//! Speech collaborators: single-shot capture and interruptible synthesis.
//!
//! The session only depends on the two traits here. Concrete backends read
//! typed utterances from the terminal and speak through an external TTS binary.

mod console;
mod synthesizer;

use async_trait::async_trait;
use thiserror::Error;

pub use console::ConsoleCapture;
pub use synthesizer::{CommandSynthesizer, MuteSynthesizer, split_sentences};

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("no speech detected")]
    NoSpeech,

    #[error("speech input closed")]
    Closed,

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("synthesis failed: {0}")]
    Synthesis(String),
}

/// Captures one utterance per call.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Whether this environment can capture speech at all.
    fn is_supported(&self) -> bool {
        true
    }

    /// Listen for a single utterance and return its transcript.
    ///
    /// Callers impose no timeout; the backend decides when to give up.
    async fn listen_once(&self, locale: &str) -> Result<String, SpeechError>;
}

/// Speaks one phrase per call.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak the text, resolving when playback ends or is interrupted.
    async fn speak(&self, text: &str) -> Result<(), SpeechError>;

    /// Interrupt any playback in progress. Idempotent.
    fn cancel(&self);
}
