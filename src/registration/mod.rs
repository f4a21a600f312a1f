//! Self-service registration with email verification.
//!
//! The [`CodeEntry`] widget turns keystrokes and pastes into a candidate code.
//! The [`RegistrationOrchestrator`] owns the form, the verification session
//! and the resend cooldown, and gates the final submission. Both are headless:
//! the TUI renders them and feeds them events.

pub mod code_entry;
pub mod cooldown;
pub mod form;
pub mod orchestrator;

pub use code_entry::{ArrowDirection, CodeEntry, Emission, FocusTarget, SlotCursor, DEFAULT_CODE_LENGTH};
pub use cooldown::{ManualScheduler, RepeatingTask, TickScheduler, TimerId, TokioScheduler};
pub use form::{is_valid_email, RegistrationForm, VerificationSession};
pub use orchestrator::{PendingRequest, RegistrationOrchestrator, RegistrationPhase, SessionId};

/// Problems caught locally, before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter your email address")]
    EmailRequired,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please wait {remaining} seconds before requesting a new code")]
    CooldownActive { remaining: u32 },

    #[error("Please enter the {expected}-digit verification code")]
    CodeIncomplete { expected: usize },

    #[error("Please fill in all required fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("Please verify your email address first")]
    VerificationRequired,

    #[error("Registration is currently disabled")]
    RegistrationDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Transport failure or a non-success answer.
    #[error("{0}")]
    Request(String),

    /// The server rejected the verification code.
    #[error("{0}")]
    Verification(String),

    /// The response belongs to a dialog session that has since been closed.
    #[error("Response arrived for a closed registration session")]
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }
}

/// Signals published by the orchestrator to whoever renders it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    Notice(Notice),
    /// The code was rejected and the entry widget was reset.
    CodeCleared,
    /// Registration succeeded; carries the server's answer.
    Registered(crate::api::RegisterResponse),
    Closed,
}
