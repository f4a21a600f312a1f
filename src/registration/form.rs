//! Registration form fields and verification session state.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::auth::DEFAULT_CODE_EXPIRE_MINUTES;

/// local-part@domain.tld, no whitespace.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub verification_code: String,
}

impl RegistrationForm {
    /// All identity fields filled in (the code is tracked separately).
    pub fn has_required_fields(&self) -> bool {
        !self.email.trim().is_empty()
            && !self.username.trim().is_empty()
            && !self.password.is_empty()
            && !self.confirm_password.is_empty()
    }

    pub fn passwords_match(&self) -> bool {
        self.password == self.confirm_password
    }

    pub fn password_long_enough(&self, min_length: usize) -> bool {
        self.password.chars().count() >= min_length
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationSession {
    pub sent_at: Option<DateTime<Utc>>,
    pub cooldown_remaining: u32,
    pub expire_minutes: u32,
    pub verified: bool,
    pub last_error: bool,
}

impl VerificationSession {
    pub fn new(expire_minutes: u32) -> Self {
        Self {
            sent_at: None,
            cooldown_remaining: 0,
            expire_minutes,
            verified: false,
            last_error: false,
        }
    }

    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0
    }

    pub fn code_sent(&self) -> bool {
        self.sent_at.is_some()
    }
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_EXPIRE_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("  first.last+tag@sub.example.org "));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@@b.com"));
    }

    #[test]
    fn password_length_counts_characters() {
        let form = RegistrationForm {
            password: "pässwörd".to_string(),
            ..Default::default()
        };
        assert!(form.password_long_enough(8));
        assert!(!form.password_long_enough(9));
    }

    #[test]
    fn required_fields_ignore_whitespace_only_identity() {
        let form = RegistrationForm {
            email: "a@b.com".to_string(),
            username: "   ".to_string(),
            password: "secret123".to_string(),
            confirm_password: "secret123".to_string(),
            verification_code: String::new(),
        };
        assert!(!form.has_required_fields());
    }
}
