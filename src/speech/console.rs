//! Terminal-backed capture: each typed line stands in for one utterance.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{SpeechCapture, SpeechError};

/// Reads utterances from standard input.
pub struct ConsoleCapture {
    lines: Mutex<Lines<BufReader<Stdin>>>, // Shared stdin reader
}

impl ConsoleCapture {
    /// Create a capture over the process's standard input.
    pub fn new() -> Self {
        Self { lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()) }
    }
}

impl Default for ConsoleCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechCapture for ConsoleCapture {
    async fn listen_once(&self, locale: &str) -> Result<String, SpeechError> {
        debug!("Listening ({})", locale);
        info!("🎤 Listening...");

        let line = self.lines.lock().await.next_line().await.map_err(|e| SpeechError::Capture(e.to_string()))?;

        match line {
            Some(text) if text.trim().is_empty() => Err(SpeechError::NoSpeech),
            Some(text) => {
                let text = text.trim().to_string();
                info!("🗣️ You: {}", text);
                Ok(text)
            }
            None => Err(SpeechError::Closed),
        }
    }
}
