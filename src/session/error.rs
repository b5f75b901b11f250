//! Session failures. The `Display` text is what the user hears and sees.

use thiserror::Error;

use crate::speech::SpeechError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Voice commands are not supported on this device.")]
    UnsupportedEnvironment,

    #[error("I couldn't hear you ({0}). Please try again.")]
    Capture(#[source] SpeechError),

    #[error("Sorry, I didn't understand \"{0}\". Try saying something like: send 500 to 0712345678.")]
    Parse(String),

    #[error("I don't have a number for {0}. Add them first, or say a number directly.")]
    UnknownRecipient(String),

    #[error("I couldn't find a contact called {0}. Add them first, or say a number directly.")]
    UnknownContact(String),

    #[error("{0} is saved as a paybill without an account number. Edit the contact and add the account number.")]
    PaybillMissingAccount(String),

    /// Recoverable: the intent is still pending.
    #[error("Sorry, I didn't catch that. Say yes to confirm or no to cancel, or tap confirm.")]
    ConfirmationCapture(#[source] SpeechError),

    #[error("There is no payment waiting for confirmation.")]
    NothingPending,
}

impl SessionError {
    /// Whether the session survives this error with its pending intent intact.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SessionError::ConfirmationCapture(_))
    }

    /// Whether the speech input has gone away for good.
    pub fn is_input_closed(&self) -> bool {
        matches!(self, SessionError::Capture(SpeechError::Closed) | SessionError::ConfirmationCapture(SpeechError::Closed))
    }
}
