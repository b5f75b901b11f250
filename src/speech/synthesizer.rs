//! Text-to-speech through an external command such as `espeak-ng` or `say`.

use std::process::Stdio;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{SpeechError, SpeechSynthesizer};

/// Speaks by running a TTS program once per sentence.
pub struct CommandSynthesizer {
    program: String,                     // TTS executable
    args: Vec<String>,                   // Extra arguments placed before the text
    interrupt: Mutex<CancellationToken>, // Replaced on every cancel
}

impl CommandSynthesizer {
    /// Create a synthesizer from a command line like `espeak-ng -s 150`.
    pub fn new(command: &str) -> Result<Self, SpeechError> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| SpeechError::Synthesis("empty TTS command".to_string()))?;

        info!("Initializing speech synthesis with '{}'", program);

        Ok(Self { program, args: parts.collect(), interrupt: Mutex::new(CancellationToken::new()) })
    }

    /// Speak a single sentence, stopping early if the token fires.
    async fn speak_sentence(&self, sentence: &str, token: &CancellationToken) -> Result<(), SpeechError> {
        debug!("Synthesizing sentence: \"{}\"", sentence);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(sentence)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SpeechError::Synthesis(format!("failed to start {}: {}", self.program, e)))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| SpeechError::Synthesis(e.to_string()))?;
                if !status.success() {
                    return Err(SpeechError::Synthesis(format!("{} exited with {}", self.program, status)));
                }
                Ok(())
            }
            _ = token.cancelled() => {
                info!("⏸️  Speech interrupted");
                // The process may already be gone
                let _ = child.kill().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        let token = self.interrupt.lock().clone();
        info!("🔊 {}", text);

        for sentence in split_sentences(text) {
            if token.is_cancelled() {
                break;
            }
            self.speak_sentence(&sentence, &token).await?;
        }
        Ok(())
    }

    fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.interrupt.lock(), CancellationToken::new());
        previous.cancel();
    }
}

/// Logs phrases instead of speaking them.
#[derive(Default)]
pub struct MuteSynthesizer;

#[async_trait]
impl SpeechSynthesizer for MuteSynthesizer {
    async fn speak(&self, text: &str) -> Result<(), SpeechError> {
        info!("🔇 {}", text);
        Ok(())
    }

    fn cancel(&self) {}
}

/// Split text into sentences so playback can be interrupted between them.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    let chars: Vec<char> = text.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        current.push(c);

        // A dot between digits is a decimal amount, not a boundary
        let decimal = c == '.' && i > 0 && chars[i - 1].is_ascii_digit() && chars.get(i + 1).is_some_and(char::is_ascii_digit);
        if matches!(c, '.' | '!' | '?' | '\n') && !decimal {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }

    let trimmed = current.trim().to_string();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }

    sentences
}
