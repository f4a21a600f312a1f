//! Registration dialog state machine.
//!
//! Each network-bound operation is split in two halves so the UI loop can run
//! the request on a background task: `begin_*` validates and marks the
//! orchestrator busy, returning the request to send; `finish_*` consumes the
//! outcome. The `async` wrappers chain both halves for callers that can await
//! in place (and for tests).
//!
//! Every request is tagged with the [`SessionId`] of the dialog session that
//! issued it. Closing or reopening the dialog starts a new session, and
//! `finish_*` drops any outcome that arrives for an older one.
//!
//! Conceptual flow: `Idle -> CodeSent -> (Cooling | Ready) -> Verified <->
//! VerificationFailed -> Submitting -> (Success | SubmissionFailed)`.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use super::code_entry::{CodeEntry, Emission};
use super::cooldown::{RepeatingTask, TickScheduler, TimerId};
use super::form::{is_valid_email, RegistrationForm, VerificationSession};
use super::{Notice, RegistrationError, RegistrationEvent, ValidationError};
use crate::api::{
    ApiError, AuthApi, RegisterRequest, RegisterResponse, RegistrationSettings, SendCodeRequest, SendCodeResponse,
    VerifyEmailRequest, VerifyEmailResponse,
};
use crate::config::RegistrationConfig;
use crate::constants::{
    code_sent_message, ERROR_REGISTER_FAILED, ERROR_SEND_CODE_FAILED, ERROR_VERIFY_FAILED, SUCCESS_EMAIL_VERIFIED,
    SUCCESS_REGISTERED,
};

const COOLDOWN_TICK: Duration = Duration::from_secs(1);

/// One open/close cycle of the dialog.
pub type SessionId = u64;

/// A request to send, tagged with the session that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest<T> {
    pub session: SessionId,
    pub request: T,
}

/// Where the interaction currently stands, derived from the flags below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationPhase {
    Closed,
    Idle,
    CodeSent,
    Verified,
    VerificationFailed,
    Submitting,
    SubmissionFailed,
}

pub struct RegistrationOrchestrator {
    options: RegistrationConfig,
    settings: RegistrationSettings,
    form: RegistrationForm,
    session: VerificationSession,
    code_entry: CodeEntry,
    scheduler: Box<dyn TickScheduler>,
    // Dropping the orchestrator drops this handle, which cancels the timer.
    cooldown_task: Option<RepeatingTask>,
    next_timer_id: TimerId,
    session_id: SessionId,
    busy: bool,
    submitting: bool,
    submit_failed: bool,
    open: bool,
    events: mpsc::UnboundedSender<RegistrationEvent>,
}

impl RegistrationOrchestrator {
    pub fn new(
        options: RegistrationConfig,
        scheduler: Box<dyn TickScheduler>,
    ) -> (Self, mpsc::UnboundedReceiver<RegistrationEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let settings = RegistrationSettings::default();
        let orchestrator = Self {
            code_entry: CodeEntry::new(options.code_length),
            session: VerificationSession::new(settings.verification_code_expire_minutes),
            options,
            settings,
            form: RegistrationForm::default(),
            scheduler,
            cooldown_task: None,
            next_timer_id: 0,
            session_id: 0,
            busy: false,
            submitting: false,
            submit_failed: false,
            open: false,
            events,
        };
        (orchestrator, rx)
    }

    // ---- accessors ----------------------------------------------------------

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    pub fn session(&self) -> &VerificationSession {
        &self.session
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    pub fn code_entry(&self) -> &CodeEntry {
        &self.code_entry
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Current session; bumped on every open and close.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn requires_verification(&self) -> bool {
        self.settings.require_email_verification
    }

    /// Id of the running cooldown timer, if any.
    pub fn active_timer(&self) -> Option<TimerId> {
        self.cooldown_task.as_ref().map(RepeatingTask::id)
    }

    pub fn phase(&self) -> RegistrationPhase {
        if !self.open {
            RegistrationPhase::Closed
        } else if self.submitting {
            RegistrationPhase::Submitting
        } else if self.submit_failed {
            RegistrationPhase::SubmissionFailed
        } else if self.session.verified {
            RegistrationPhase::Verified
        } else if self.session.last_error {
            RegistrationPhase::VerificationFailed
        } else if self.session.code_sent() {
            RegistrationPhase::CodeSent
        } else {
            RegistrationPhase::Idle
        }
    }

    // ---- lifecycle ----------------------------------------------------------

    /// Open the dialog. Resets everything, but only on the closed -> open transition.
    pub fn open(&mut self) {
        if self.open {
            return;
        }
        self.reset();
        self.open = true;
        log::info!("Registration dialog opened");
    }

    /// Close the dialog, cancelling the cooldown and discarding all input.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.reset();
        self.open = false;
        self.emit(RegistrationEvent::Closed);
        log::info!("Registration dialog closed");
    }

    /// Adopt the server's registration policy. Can arrive after `open`.
    pub fn apply_settings(&mut self, settings: RegistrationSettings) {
        if !self.session.code_sent() {
            self.session.expire_minutes = settings.verification_code_expire_minutes;
        }
        self.settings = settings;
    }

    fn reset(&mut self) {
        self.session_id += 1;
        self.cancel_cooldown();
        self.form = RegistrationForm::default();
        self.session = VerificationSession::new(self.settings.verification_code_expire_minutes);
        self.code_entry.clear();
        self.busy = false;
        self.submitting = false;
        self.submit_failed = false;
    }

    // ---- field updates ------------------------------------------------------

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.form.email = email.into();
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.form.username = username.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.form.password = password.into();
    }

    pub fn set_confirm_password(&mut self, confirm_password: impl Into<String>) {
        self.form.confirm_password = confirm_password.into();
    }

    /// Push an external code value into the entry widget.
    pub fn set_code(&mut self, code: &str) -> bool {
        if self.code_entry.set_value(code) {
            self.form.verification_code = self.code_entry.value();
            true
        } else {
            false
        }
    }

    // ---- derived predicates -------------------------------------------------

    pub fn can_send_code(&self) -> bool {
        self.open && !self.form.email.trim().is_empty() && !self.session.is_cooling_down() && !self.busy
    }

    pub fn can_submit_registration(&self) -> bool {
        self.form.has_required_fields()
            && (!self.requires_verification() || self.session.verified)
            && self.form.passwords_match()
            && self.form.password_long_enough(self.options.min_password_length)
    }

    // ---- code entry ---------------------------------------------------------

    /// Record the widget's latest value. Returns the code to verify when the
    /// widget reports completion and the email is not verified yet.
    pub fn on_code_emission(&mut self, emission: Emission) -> Option<String> {
        self.form.verification_code = emission.value;
        if emission.complete && !self.session.verified {
            Some(self.form.verification_code.clone())
        } else {
            None
        }
    }

    pub fn enter_code_character(&mut self, index: usize, raw: &str) -> Option<String> {
        let emission = self.code_entry.on_character_entered(index, raw);
        self.on_code_emission(emission)
    }

    pub fn code_backspace(&mut self, index: usize) -> Option<String> {
        let emission = self.code_entry.on_backspace(index);
        self.on_code_emission(emission)
    }

    pub fn paste_code(&mut self, text: &str) -> Option<String> {
        let emission = self.code_entry.on_paste(text);
        self.on_code_emission(emission)
    }

    pub fn move_code_focus(&mut self, direction: super::ArrowDirection) {
        let index = self.code_entry.focus_target().index();
        self.code_entry.on_arrow_key(direction, index);
    }

    pub fn focus_code_entry(&mut self) {
        self.code_entry.focus();
    }

    // ---- send verification code ---------------------------------------------

    pub fn begin_send_code(&mut self) -> Result<PendingRequest<SendCodeRequest>, RegistrationError> {
        let email = self.form.email.trim().to_string();
        let check = if email.is_empty() {
            Err(ValidationError::EmailRequired)
        } else if !is_valid_email(&email) {
            Err(ValidationError::InvalidEmail)
        } else if self.session.is_cooling_down() {
            Err(ValidationError::CooldownActive {
                remaining: self.session.cooldown_remaining,
            })
        } else {
            Ok(())
        };
        self.reject_invalid(check)?;

        self.busy = true;
        Ok(self.pending(SendCodeRequest { email }))
    }

    pub fn finish_send_code(
        &mut self,
        session: SessionId,
        result: Result<SendCodeResponse, ApiError>,
    ) -> Result<(), RegistrationError> {
        self.accept(session, "send code")?;
        self.busy = false;

        match result.and_then(SendCodeResponse::into_result) {
            Ok(response) => {
                self.session.sent_at = Some(Utc::now());
                if let Some(minutes) = response.expire_minutes {
                    self.session.expire_minutes = minutes;
                }
                self.start_cooldown();
                self.code_entry.focus();
                let message = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| code_sent_message(self.session.expire_minutes));
                self.notify(Notice::success(message));
                Ok(())
            }
            Err(err) => {
                log::warn!("Sending verification code failed: {err}");
                let message = err.user_message(ERROR_SEND_CODE_FAILED);
                self.notify(Notice::error(message.clone()));
                Err(RegistrationError::Request(message))
            }
        }
    }

    pub async fn send_verification_code(&mut self, api: &dyn AuthApi) -> Result<(), RegistrationError> {
        let pending = self.begin_send_code()?;
        let result = api.send_verification_code(&pending.request).await;
        self.finish_send_code(pending.session, result)
    }

    // ---- cooldown -----------------------------------------------------------

    fn start_cooldown(&mut self) {
        self.cancel_cooldown();
        if self.options.resend_cooldown_secs == 0 {
            return;
        }
        self.next_timer_id += 1;
        self.session.cooldown_remaining = self.options.resend_cooldown_secs;
        self.cooldown_task = Some(self.scheduler.schedule_repeating(self.next_timer_id, COOLDOWN_TICK));
    }

    fn cancel_cooldown(&mut self) {
        if let Some(mut task) = self.cooldown_task.take() {
            task.cancel();
        }
        self.session.cooldown_remaining = 0;
    }

    /// One second elapsed on timer `id`. Ticks from cancelled timers are ignored.
    pub fn on_cooldown_tick(&mut self, id: TimerId) {
        if self.active_timer() != Some(id) {
            return;
        }
        self.session.cooldown_remaining = self.session.cooldown_remaining.saturating_sub(1);
        if self.session.cooldown_remaining == 0 {
            self.cancel_cooldown();
        }
    }

    // ---- verify code --------------------------------------------------------

    pub fn begin_submit_code(&mut self, code: &str) -> Result<PendingRequest<VerifyEmailRequest>, RegistrationError> {
        let email = self.form.email.trim().to_string();
        let expected = self.code_entry.len();
        let check = if email.is_empty() {
            Err(ValidationError::EmailRequired)
        } else if code.chars().count() != expected {
            Err(ValidationError::CodeIncomplete { expected })
        } else {
            Ok(())
        };
        self.reject_invalid(check)?;

        self.busy = true;
        self.session.last_error = false;
        Ok(self.pending(VerifyEmailRequest {
            email,
            code: code.to_string(),
        }))
    }

    pub fn finish_submit_code(
        &mut self,
        session: SessionId,
        result: Result<VerifyEmailResponse, ApiError>,
    ) -> Result<(), RegistrationError> {
        self.accept(session, "verification")?;
        self.busy = false;

        let failure = match result.and_then(VerifyEmailResponse::into_result) {
            Ok(response) => {
                self.session.verified = true;
                self.session.last_error = false;
                self.notify(Notice::success(
                    response.message.unwrap_or_else(|| SUCCESS_EMAIL_VERIFIED.to_string()),
                ));
                return Ok(());
            }
            Err(err @ ApiError::Rejected(_)) => RegistrationError::Verification(err.user_message(ERROR_VERIFY_FAILED)),
            Err(err) if err.is_client_error() => RegistrationError::Verification(err.user_message(ERROR_VERIFY_FAILED)),
            Err(err) => {
                log::warn!("Verifying email failed: {err}");
                RegistrationError::Request(err.user_message(ERROR_VERIFY_FAILED))
            }
        };

        self.session.last_error = true;
        self.code_entry.clear();
        self.form.verification_code.clear();
        self.emit(RegistrationEvent::CodeCleared);
        self.notify(Notice::error(failure.to_string()));
        Err(failure)
    }

    pub async fn submit_code(&mut self, api: &dyn AuthApi, code: &str) -> Result<(), RegistrationError> {
        let pending = self.begin_submit_code(code)?;
        let result = api.verify_email(&pending.request).await;
        self.finish_submit_code(pending.session, result)
    }

    // ---- register -----------------------------------------------------------

    pub fn begin_submit_registration(&mut self) -> Result<PendingRequest<RegisterRequest>, RegistrationError> {
        let min = self.options.min_password_length;
        // The submit control is already gated, but the UI state may be stale.
        let check = if !self.settings.enable_registration {
            Err(ValidationError::RegistrationDisabled)
        } else if !self.form.has_required_fields() {
            Err(ValidationError::MissingFields)
        } else if !is_valid_email(&self.form.email) {
            Err(ValidationError::InvalidEmail)
        } else if !self.form.passwords_match() {
            Err(ValidationError::PasswordMismatch)
        } else if !self.form.password_long_enough(min) {
            Err(ValidationError::PasswordTooShort { min })
        } else if self.requires_verification() && !self.session.verified {
            Err(ValidationError::VerificationRequired)
        } else {
            Ok(())
        };
        self.reject_invalid(check)?;

        self.submitting = true;
        self.submit_failed = false;
        Ok(self.pending(RegisterRequest {
            email: self.form.email.trim().to_string(),
            username: self.form.username.trim().to_string(),
            password: self.form.password.clone(),
        }))
    }

    pub fn finish_submit_registration(
        &mut self,
        session: SessionId,
        result: Result<RegisterResponse, ApiError>,
    ) -> Result<RegisterResponse, RegistrationError> {
        self.accept(session, "registration")?;
        self.submitting = false;

        match result {
            Ok(response) => {
                let message = if response.message.trim().is_empty() {
                    SUCCESS_REGISTERED.to_string()
                } else {
                    response.message.clone()
                };
                self.notify(Notice::success(message));
                self.emit(RegistrationEvent::Registered(response.clone()));
                self.close();
                Ok(response)
            }
            Err(err) => {
                log::warn!("Registration failed: {err}");
                self.submit_failed = true;
                let message = err.user_message(ERROR_REGISTER_FAILED);
                self.notify(Notice::error(message.clone()));
                Err(RegistrationError::Request(message))
            }
        }
    }

    pub async fn submit_registration(&mut self, api: &dyn AuthApi) -> Result<RegisterResponse, RegistrationError> {
        let pending = self.begin_submit_registration()?;
        let result = api.register(&pending.request).await;
        self.finish_submit_registration(pending.session, result)
    }

    // ---- sessions -----------------------------------------------------------

    fn pending<T>(&self, request: T) -> PendingRequest<T> {
        PendingRequest {
            session: self.session_id,
            request,
        }
    }

    /// Outcomes for a closed dialog or an earlier session are dropped untouched.
    fn accept(&self, session: SessionId, what: &str) -> Result<(), RegistrationError> {
        if self.open && session == self.session_id {
            return Ok(());
        }
        log::info!(
            "Dropping {what} response for session {session} (current {}, open: {})",
            self.session_id,
            self.open
        );
        Err(RegistrationError::Stale)
    }

    // ---- notifications ------------------------------------------------------

    fn reject_invalid(&self, check: Result<(), ValidationError>) -> Result<(), RegistrationError> {
        check.map_err(|err| {
            self.notify(Notice::error(err.to_string()));
            RegistrationError::Validation(err)
        })
    }

    fn notify(&self, notice: Notice) {
        log::info!("Registration notice ({:?}): {}", notice.level, notice.message);
        self.emit(RegistrationEvent::Notice(notice));
    }

    fn emit(&self, event: RegistrationEvent) {
        // A dropped receiver only means nobody renders the dialog anymore.
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for RegistrationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationOrchestrator")
            .field("phase", &self.phase())
            .field("session", &self.session)
            .field("session_id", &self.session_id)
            .field("busy", &self.busy)
            .field("active_timer", &self.active_timer())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::ManualScheduler;

    fn orchestrator() -> (RegistrationOrchestrator, ManualScheduler) {
        let scheduler = ManualScheduler::new();
        let (mut orchestrator, _rx) =
            RegistrationOrchestrator::new(RegistrationConfig::default(), Box::new(scheduler.clone()));
        orchestrator.open();
        (orchestrator, scheduler)
    }

    fn sent() -> Result<SendCodeResponse, ApiError> {
        Ok(SendCodeResponse {
            success: true,
            message: None,
            expire_minutes: Some(10),
        })
    }

    #[test]
    fn phase_follows_flags() {
        let (mut orchestrator, _) = orchestrator();
        assert_eq!(orchestrator.phase(), RegistrationPhase::Idle);

        orchestrator.set_email("a@b.com");
        let pending = orchestrator.begin_send_code().unwrap();
        orchestrator.finish_send_code(pending.session, sent()).unwrap();
        assert_eq!(orchestrator.phase(), RegistrationPhase::CodeSent);
        assert_eq!(orchestrator.session().expire_minutes, 10);

        orchestrator.close();
        assert_eq!(orchestrator.phase(), RegistrationPhase::Closed);
    }

    #[test]
    fn restarting_cooldown_cancels_previous_timer() {
        let (mut orchestrator, scheduler) = orchestrator();
        orchestrator.set_email("a@b.com");
        let pending = orchestrator.begin_send_code().unwrap();
        orchestrator.finish_send_code(pending.session, sent()).unwrap();
        let first = orchestrator.active_timer().unwrap();

        // Simulate a second successful send without waiting the cooldown out.
        orchestrator.finish_send_code(orchestrator.session_id(), sent()).unwrap();
        let second = orchestrator.active_timer().unwrap();

        assert_ne!(first, second);
        assert_eq!(scheduler.cancelled(), vec![first]);
        assert_eq!(scheduler.active(), vec![second]);
    }

    #[test]
    fn stale_ticks_are_ignored() {
        let (mut orchestrator, _) = orchestrator();
        orchestrator.set_email("a@b.com");
        let pending = orchestrator.begin_send_code().unwrap();
        orchestrator.finish_send_code(pending.session, sent()).unwrap();
        let id = orchestrator.active_timer().unwrap();

        orchestrator.on_cooldown_tick(id + 100);
        assert_eq!(orchestrator.session().cooldown_remaining, 60);
        orchestrator.on_cooldown_tick(id);
        assert_eq!(orchestrator.session().cooldown_remaining, 59);
    }

    #[test]
    fn send_result_after_close_starts_no_timer() {
        let (mut orchestrator, scheduler) = orchestrator();
        orchestrator.set_email("a@b.com");
        let pending = orchestrator.begin_send_code().unwrap();
        orchestrator.close();

        assert_eq!(
            orchestrator.finish_send_code(pending.session, sent()),
            Err(RegistrationError::Stale)
        );
        assert_eq!(orchestrator.active_timer(), None);
        assert!(scheduler.active().is_empty());
        assert!(scheduler.scheduled().is_empty());
        assert_eq!(orchestrator.session().cooldown_remaining, 0);
        assert!(!orchestrator.session().code_sent());
    }

    #[test]
    fn verify_result_from_previous_session_is_dropped() {
        let (mut orchestrator, _) = orchestrator();
        orchestrator.set_email("a@b.com");
        let pending = orchestrator.begin_submit_code("123456").unwrap();
        orchestrator.close();
        orchestrator.open();
        orchestrator.set_email("other@x.com");

        let verified = Ok(VerifyEmailResponse {
            success: true,
            message: None,
        });
        assert_eq!(
            orchestrator.finish_submit_code(pending.session, verified),
            Err(RegistrationError::Stale)
        );
        assert!(!orchestrator.session().verified);
        assert_eq!(orchestrator.form().email, "other@x.com");
        assert_eq!(orchestrator.phase(), RegistrationPhase::Idle);
    }

    #[test]
    fn registration_result_from_previous_session_is_dropped() {
        let (mut orchestrator, _) = orchestrator();
        orchestrator.set_email("a@b.com");
        orchestrator.set_username("alice");
        orchestrator.set_password("correct horse");
        orchestrator.set_confirm_password("correct horse");
        let pending = orchestrator.begin_submit_registration().unwrap();
        orchestrator.close();
        orchestrator.open();
        orchestrator.set_username("bob");

        let result = orchestrator.finish_submit_registration(
            pending.session,
            Err(ApiError::Http {
                status: 409,
                message: "Username taken".to_string(),
            }),
        );
        assert_eq!(result, Err(RegistrationError::Stale));
        assert_eq!(orchestrator.phase(), RegistrationPhase::Idle);
        assert_eq!(orchestrator.form().username, "bob");
    }

    #[test]
    fn session_changes_on_open_and_close() {
        let (mut orchestrator, _) = orchestrator();
        let first = orchestrator.session_id();
        orchestrator.close();
        let closed = orchestrator.session_id();
        orchestrator.open();
        assert!(first < closed && closed < orchestrator.session_id());
    }

    #[test]
    fn reopening_while_open_keeps_state() {
        let (mut orchestrator, _) = orchestrator();
        orchestrator.set_username("alice");
        orchestrator.open();
        assert_eq!(orchestrator.form().username, "alice");
    }
}
