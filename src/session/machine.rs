//! Voice command session: listen, parse, resolve, confirm, execute.
//!
//! One session runs at a time per instance. The session suspends only while
//! capturing an utterance or speaking a phrase, and is driven in steps so
//! manual confirm/cancel can be applied between them:
//!
//! ```text
//! idle -> listening -> processing -> confirming -> awaiting_confirmation -> idle
//!              \            \                              |
//!               `-----------`--> error       retry <------'
//! ```

use std::future::Future;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::{debug, info, warn};

use super::{SessionError, SessionState};
use crate::contacts::{ContactDirectory, ContactType, VoiceContact, is_dialable, is_phone_like, normalize_phone};
use crate::intent::{Intent, ParsedIntent, describe, parse};
use crate::speech::{SpeechCapture, SpeechSynthesizer};

/// Short answers accepted as "yes". Anything else cancels.
static AFFIRMATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:yes|yeah|yep|yup|confirm|send|do it|go|ok|okay)\b").unwrap());

const CONFIRM_PROMPT: &str = "Say yes to confirm or no to cancel.";
const CANCELLED: &str = "Okay, I've cancelled that.";

/// Receives the outcome of each session.
pub trait IntentSink: Send + Sync {
    /// Called exactly once per confirmed session with the final intent.
    fn submit(&self, intent: &Intent);

    /// Called when a session ends without executing.
    fn dismissed(&self) {}
}

/// Result of one confirmation attempt.
#[derive(Debug)]
pub enum ConfirmationOutcome {
    /// The intent was handed to the sink
    Executed(Intent),
    /// The user declined; nothing was submitted
    Cancelled,
    /// The answer could not be captured; the intent is still pending
    Retry(SessionError),
}

/// Drives one voice command at a time.
pub struct VoiceCommandSession {
    capture: Arc<dyn SpeechCapture>,         // One-shot utterance capture
    synthesizer: Arc<dyn SpeechSynthesizer>, // Readback and prompts
    directory: Arc<ContactDirectory>,        // Name resolution and auto-learning
    sink: Arc<dyn IntentSink>,               // Submission and dismissal callbacks
    locale: String,                          // Capture locale
    state: SessionState,
    transcript: Option<String>,
    pending: Option<Intent>,
    spoken_name: Option<String>, // Name a send/pochi target resolved from, learned on execute
    last_error: Option<String>,
}

impl VoiceCommandSession {
    /// Create an idle session.
    ///
    /// # Arguments
    /// * `capture` - Source of spoken instructions and yes/no answers
    /// * `synthesizer` - Speaks readbacks, prompts and error messages
    /// * `directory` - Resolves names and learns new ones after execution
    /// * `sink` - Receives confirmed intents and dismissals
    /// * `locale` - Passed to every capture call
    ///
    /// # Returns
    /// A new `VoiceCommandSession` in the `idle` state.
    pub fn new(
        capture: Arc<dyn SpeechCapture>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        directory: Arc<ContactDirectory>,
        sink: Arc<dyn IntentSink>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            capture,
            synthesizer,
            directory,
            sink,
            locale: locale.into(),
            state: SessionState::Idle,
            transcript: None,
            pending: None,
            spoken_name: None,
            last_error: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transcript of the instruction being handled, if one was captured.
    pub fn last_transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    /// Intent waiting for confirmation.
    pub fn pending_intent(&self) -> Option<&Intent> {
        self.pending.as_ref()
    }

    /// Spoken message of the error that ended the last session.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Start a new session: listen for an instruction, resolve it and read it back.
    ///
    /// Any pending intent from an earlier session is discarded first. On success
    /// the session is left in `confirming` holding the resolved intent.
    ///
    /// # Errors
    /// Returns the terminal error after moving to `error` and speaking its message.
    pub async fn start(&mut self) -> Result<Intent, SessionError> {
        self.synthesizer.cancel();
        if self.pending.is_some() {
            debug!("Discarding pending intent from previous session");
        }
        self.reset();

        if !self.capture.is_supported() {
            return Err(self.fail(SessionError::UnsupportedEnvironment).await);
        }

        // An unreadable store leaves the directory empty; numbers still work
        best_effort("load contacts", self.directory.init()).await;

        self.state = SessionState::Listening;
        let transcript = match self.capture.listen_once(&self.locale).await {
            Ok(transcript) => transcript,
            Err(e) => return Err(self.fail(SessionError::Capture(e)).await),
        };

        self.state = SessionState::Processing;
        self.transcript = Some(transcript.clone());
        info!("🧠 Processing: \"{}\"", transcript);

        let Some(parsed) = parse(&transcript) else {
            return Err(self.fail(SessionError::Parse(transcript)).await);
        };

        let intent = match self.resolve(parsed) {
            Ok(intent) => intent,
            Err(e) => return Err(self.fail(e).await),
        };

        self.pending = Some(intent.clone());
        self.state = SessionState::Confirming;

        let readback = describe(&intent);
        info!("💬 {}", readback);
        self.speak(&format!("{readback} {CONFIRM_PROMPT}")).await;

        Ok(intent)
    }

    /// Listen once for a yes/no answer to the pending intent.
    ///
    /// # Errors
    /// Returns [`SessionError::NothingPending`] when no intent is held.
    pub async fn listen_for_confirmation(&mut self) -> Result<ConfirmationOutcome, SessionError> {
        if self.pending.is_none() {
            return Err(SessionError::NothingPending);
        }

        self.state = SessionState::AwaitingConfirmation;
        let answer = match self.capture.listen_once(&self.locale).await {
            Ok(answer) => answer,
            Err(e) => {
                let error = SessionError::ConfirmationCapture(e);
                warn!("Confirmation not captured: {}", error);
                self.state = SessionState::Confirming;
                self.speak(&error.to_string()).await;
                return Ok(ConfirmationOutcome::Retry(error));
            }
        };

        if is_affirmative(&answer) {
            return Ok(ConfirmationOutcome::Executed(self.execute().await?));
        }

        info!("❎ Declined: \"{}\"", answer.trim());
        self.speak(CANCELLED).await;
        self.dismiss();
        Ok(ConfirmationOutcome::Cancelled)
    }

    /// Confirm the pending intent without a spoken answer.
    ///
    /// # Errors
    /// Returns [`SessionError::NothingPending`] when no intent is held.
    pub async fn tap_confirm(&mut self) -> Result<Intent, SessionError> {
        self.execute().await
    }

    /// Abandon whatever is in progress and return to idle.
    pub fn cancel(&mut self) {
        self.synthesizer.cancel();
        if self.state.is_active() || self.pending.is_some() {
            info!("❎ Session cancelled");
            self.dismiss();
        } else {
            self.reset();
        }
    }

    /// Run a full session, giving the user up to `max_attempts` tries to answer.
    ///
    /// Running out of attempts cancels; it never executes.
    pub async fn run_once(&mut self, max_attempts: u32) -> Result<ConfirmationOutcome, SessionError> {
        self.start().await?;

        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.listen_for_confirmation().await? {
                ConfirmationOutcome::Retry(e) if e.is_input_closed() || attempt >= max_attempts => {
                    warn!("Giving up on confirmation after {} attempt(s)", attempt);
                    self.cancel();
                    return Ok(ConfirmationOutcome::Retry(e));
                }
                ConfirmationOutcome::Retry(_) => attempt += 1,
                outcome => return Ok(outcome),
            }
        }
    }

    /// Rewrite a parsed intent into a concrete one using the contact directory.
    fn resolve(&mut self, parsed: ParsedIntent) -> Result<Intent, SessionError> {
        match parsed {
            ParsedIntent::Payment(Intent::SendMoney { amount, phone }) => {
                Ok(Intent::SendMoney { amount, phone: self.resolve_recipient(&phone)? })
            }
            ParsedIntent::Payment(Intent::Pochi { amount, phone }) => Ok(Intent::Pochi { amount, phone: self.resolve_recipient(&phone)? }),
            ParsedIntent::Payment(intent) => Ok(intent),
            ParsedIntent::NamedPayment { amount, contact_name } => {
                let contact = self.directory.resolve_contact(&contact_name).ok_or(SessionError::UnknownContact(contact_name))?;
                debug!("Named payment resolved to {} contact '{}'", contact.kind, contact.name);

                match contact.kind {
                    ContactType::Mobile => Ok(Intent::SendMoney { amount, phone: contact.phone }),
                    ContactType::Pochi => Ok(Intent::Pochi { amount, phone: contact.phone }),
                    ContactType::Till => Ok(Intent::Till { amount, till: contact.phone }),
                    ContactType::Paybill => match contact.account_number {
                        Some(account) => Ok(Intent::Paybill { amount, business: contact.phone, account }),
                        None => Err(SessionError::PaybillMissingAccount(contact.name)),
                    },
                }
            }
        }
    }

    /// A name must resolve; a number too short to be phone-shaped passes through
    /// only if it is made of phone characters.
    fn resolve_recipient(&mut self, target: &str) -> Result<String, SessionError> {
        if let Some(phone) = self.directory.resolve_phone_or_name(target) {
            if !is_phone_like(target) {
                self.spoken_name = Some(target.trim().to_string());
            }
            return Ok(phone);
        }
        if is_dialable(target) {
            return Ok(normalize_phone(target));
        }
        Err(SessionError::UnknownRecipient(target.to_string()))
    }

    async fn execute(&mut self) -> Result<Intent, SessionError> {
        let intent = self.pending.take().ok_or(SessionError::NothingPending)?;
        self.synthesizer.cancel();

        if let Some(name) = self.spoken_name.take() {
            self.learn_contact(name, &intent).await;
        }

        info!("✅ Confirmed {}: {}", intent.kind(), describe(&intent));
        self.sink.submit(&intent);
        self.reset();
        Ok(intent)
    }

    /// Remember the name spoken in "send ... to <name>" so it resolves directly next time.
    async fn learn_contact(&self, name: String, intent: &Intent) {
        let (kind, phone) = match intent {
            Intent::SendMoney { phone, .. } => (ContactType::Mobile, phone),
            Intent::Pochi { phone, .. } => (ContactType::Pochi, phone),
            _ => return,
        };
        if self.directory.list().iter().any(|c| c.is_named(&name)) {
            return;
        }

        debug!("Learning contact '{}' -> {}", name, phone);
        best_effort("save learned contact", self.directory.save(VoiceContact::new(name, kind, phone.clone()))).await;
    }

    async fn fail(&mut self, error: SessionError) -> SessionError {
        warn!("❌ {}", error);
        self.state = SessionState::Error;
        self.pending = None;
        self.spoken_name = None;
        self.last_error = Some(error.to_string());
        self.speak(&error.to_string()).await;
        error
    }

    fn dismiss(&mut self) {
        self.reset();
        self.sink.dismissed();
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.transcript = None;
        self.pending = None;
        self.spoken_name = None;
        self.last_error = None;
    }

    async fn speak(&self, text: &str) {
        best_effort("speak", self.synthesizer.speak(text)).await;
    }
}

/// Whether a confirmation answer means "yes".
pub fn is_affirmative(answer: &str) -> bool {
    AFFIRMATIVE.is_match(answer.trim())
}

/// Boundary for operations whose failure must not change the session outcome:
/// speech output and contact persistence. Errors are logged and dropped here.
async fn best_effort<T, E: std::fmt::Display>(what: &str, operation: impl Future<Output = Result<T, E>>) -> Option<T> {
    match operation.await {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring failed {}: {}", what, e);
            None
        }
    }
}
