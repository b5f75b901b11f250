//! Session lifecycle states.

/// Where a voice command session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session in progress
    #[default]
    Idle,
    /// Waiting for the spoken instruction
    Listening,
    /// Parsing and resolving the transcript
    Processing,
    /// Intent resolved and read back; waiting for a yes/no or a tap
    Confirming,
    /// Listening for the yes/no answer
    AwaitingConfirmation,
    /// Session ended with an error; a new session may start right away
    Error,
}

impl SessionState {
    /// Returns true while a session holds resources (capture or pending intent).
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Idle | SessionState::Error)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Listening => write!(f, "listening"),
            SessionState::Processing => write!(f, "processing"),
            SessionState::Confirming => write!(f, "confirming"),
            SessionState::AwaitingConfirmation => write!(f, "awaiting_confirmation"),
            SessionState::Error => write!(f, "error"),
        }
    }
}
