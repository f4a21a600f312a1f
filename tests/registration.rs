use std::sync::Mutex;

use accountdesk::api::{
    ApiError, AuthApi, RegisterRequest, RegisterResponse, RegistrationSettings, SendCodeRequest, SendCodeResponse,
    VerifyEmailRequest, VerifyEmailResponse,
};
use accountdesk::config::RegistrationConfig;
use accountdesk::constants::{code_sent_message, ERROR_SEND_CODE_FAILED, ERROR_VERIFY_FAILED};
use accountdesk::registration::{
    ManualScheduler, NoticeLevel, RegistrationError, RegistrationEvent, RegistrationOrchestrator, RegistrationPhase,
    ValidationError,
};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

/// Scripted backend recording every call it receives.
struct FakeAuth {
    send: Result<SendCodeResponse, ApiError>,
    verify: Result<VerifyEmailResponse, ApiError>,
    register: Result<RegisterResponse, ApiError>,
    calls: Mutex<Vec<String>>,
}

impl FakeAuth {
    fn happy() -> Self {
        Self {
            send: Ok(SendCodeResponse {
                success: true,
                message: None,
                expire_minutes: Some(10),
            }),
            verify: Ok(VerifyEmailResponse {
                success: true,
                message: None,
            }),
            register: Ok(RegisterResponse {
                user_id: Some("u-1".to_string()),
                email: Some("alice@example.com".to_string()),
                username: Some("alice".to_string()),
                message: String::new(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AuthApi for FakeAuth {
    async fn registration_settings(&self) -> Result<RegistrationSettings, ApiError> {
        self.record("settings".to_string());
        Ok(RegistrationSettings::default())
    }

    async fn send_verification_code(&self, request: &SendCodeRequest) -> Result<SendCodeResponse, ApiError> {
        self.record(format!("send {}", request.email));
        self.send.clone()
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<VerifyEmailResponse, ApiError> {
        self.record(format!("verify {} {}", request.email, request.code));
        self.verify.clone()
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.record(format!("register {} {}", request.email, request.username));
        self.register.clone()
    }
}

fn open_orchestrator(
    require_verification: bool,
) -> (RegistrationOrchestrator, UnboundedReceiver<RegistrationEvent>, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let (mut orchestrator, events) =
        RegistrationOrchestrator::new(RegistrationConfig::default(), Box::new(scheduler.clone()));
    orchestrator.open();
    orchestrator.apply_settings(RegistrationSettings {
        require_email_verification: require_verification,
        ..RegistrationSettings::default()
    });
    (orchestrator, events, scheduler)
}

fn fill_account(orchestrator: &mut RegistrationOrchestrator) {
    orchestrator.set_email("alice@example.com");
    orchestrator.set_username("alice");
    orchestrator.set_password("correct horse");
    orchestrator.set_confirm_password("correct horse");
}

fn drain(events: &mut UnboundedReceiver<RegistrationEvent>) -> Vec<RegistrationEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

#[tokio::test]
async fn test_full_flow_with_verification() {
    let (mut orchestrator, mut events, scheduler) = open_orchestrator(true);
    let api = FakeAuth::happy();
    fill_account(&mut orchestrator);
    assert!(!orchestrator.can_submit_registration());

    orchestrator.send_verification_code(&api).await.unwrap();
    assert_eq!(orchestrator.phase(), RegistrationPhase::CodeSent);
    assert_eq!(orchestrator.session().cooldown_remaining, 60);
    assert_eq!(scheduler.active().len(), 1);

    // Pasting the full code asks for verification
    let code = orchestrator.paste_code("123456").unwrap();
    orchestrator.submit_code(&api, &code).await.unwrap();
    assert_eq!(orchestrator.phase(), RegistrationPhase::Verified);
    assert!(orchestrator.can_submit_registration());

    let response = orchestrator.submit_registration(&api).await.unwrap();
    assert_eq!(response.username.as_deref(), Some("alice"));
    assert_eq!(orchestrator.phase(), RegistrationPhase::Closed);
    // Closing cancels the cooldown timer
    assert!(scheduler.active().is_empty());

    assert_eq!(
        api.calls(),
        vec![
            "send alice@example.com",
            "verify alice@example.com 123456",
            "register alice@example.com alice"
        ]
    );

    let events = drain(&mut events);
    assert!(events.iter().any(|e| matches!(e, RegistrationEvent::Registered(_))));
    assert_eq!(events.last(), Some(&RegistrationEvent::Closed));
}

#[tokio::test]
async fn test_code_sent_notice_mentions_validity() {
    let (mut orchestrator, mut events, _) = open_orchestrator(true);
    let api = FakeAuth::happy();
    orchestrator.set_email("alice@example.com");
    orchestrator.send_verification_code(&api).await.unwrap();

    let expected = code_sent_message(10);
    assert_eq!(expected, "Verification code sent, valid for 10 minutes");
    assert!(drain(&mut events).iter().any(|e| matches!(
        e,
        RegistrationEvent::Notice(n) if n.level == NoticeLevel::Success && n.message == expected
    )));
}

#[tokio::test]
async fn test_cooldown_counts_down_and_releases() {
    let (mut orchestrator, _events, scheduler) = open_orchestrator(true);
    let api = FakeAuth::happy();
    orchestrator.set_email("alice@example.com");
    orchestrator.send_verification_code(&api).await.unwrap();
    assert!(!orchestrator.can_send_code());

    // A resend during the cooldown is refused locally
    let err = orchestrator.send_verification_code(&api).await.unwrap_err();
    assert_eq!(
        err,
        RegistrationError::Validation(ValidationError::CooldownActive { remaining: 60 })
    );
    assert_eq!(api.calls().len(), 1);

    let timer = orchestrator.active_timer().unwrap();
    for _ in 0..60 {
        orchestrator.on_cooldown_tick(timer);
    }
    assert_eq!(orchestrator.session().cooldown_remaining, 0);
    assert_eq!(orchestrator.active_timer(), None);
    assert_eq!(scheduler.cancelled(), vec![timer]);
    assert!(orchestrator.can_send_code());

    orchestrator.send_verification_code(&api).await.unwrap();
    assert_eq!(api.calls().len(), 2);
}

#[tokio::test]
async fn test_rejected_code_clears_entry() {
    let (mut orchestrator, mut events, _) = open_orchestrator(true);
    let mut api = FakeAuth::happy();
    api.verify = Err(ApiError::Http {
        status: 400,
        message: "Invalid or expired code".to_string(),
    });
    orchestrator.set_email("alice@example.com");
    orchestrator.send_verification_code(&api).await.unwrap();
    drain(&mut events);

    let code = orchestrator.paste_code("000000").unwrap();
    let err = orchestrator.submit_code(&api, &code).await.unwrap_err();
    assert_eq!(err, RegistrationError::Verification("Invalid or expired code".to_string()));
    assert_eq!(orchestrator.phase(), RegistrationPhase::VerificationFailed);
    assert!(orchestrator.code_entry().is_empty());
    assert!(orchestrator.form().verification_code.is_empty());

    let events = drain(&mut events);
    assert!(events.contains(&RegistrationEvent::CodeCleared));
    assert!(events.iter().any(|e| matches!(
        e,
        RegistrationEvent::Notice(n) if n.level == NoticeLevel::Error && n.message == "Invalid or expired code"
    )));
}

#[tokio::test]
async fn test_verification_failure_without_detail_uses_generic_message() {
    let (mut orchestrator, mut events, _) = open_orchestrator(true);
    let mut api = FakeAuth::happy();
    api.verify = Ok(VerifyEmailResponse {
        success: false,
        message: None,
    });
    orchestrator.set_email("alice@example.com");

    let code = orchestrator.paste_code("123456").unwrap();
    let err = orchestrator.submit_code(&api, &code).await.unwrap_err();
    assert_eq!(err, RegistrationError::Verification(ERROR_VERIFY_FAILED.to_string()));
    assert!(!orchestrator.session().verified);
    assert_eq!(orchestrator.phase(), RegistrationPhase::VerificationFailed);
    assert!(orchestrator.code_entry().is_empty());
    assert_eq!(orchestrator.code_entry().value(), "");
    assert!(orchestrator.form().verification_code.is_empty());

    let events = drain(&mut events);
    assert!(events.contains(&RegistrationEvent::CodeCleared));
    assert!(events.iter().any(|e| matches!(
        e,
        RegistrationEvent::Notice(n) if n.level == NoticeLevel::Error && n.message == ERROR_VERIFY_FAILED
    )));
}

#[tokio::test]
async fn test_unsuccessful_send_surfaces_server_message() {
    let (mut orchestrator, mut events, scheduler) = open_orchestrator(true);
    let mut api = FakeAuth::happy();
    api.send = Ok(SendCodeResponse {
        success: false,
        message: Some("Email already registered".to_string()),
        expire_minutes: None,
    });
    orchestrator.set_email("alice@example.com");

    let err = orchestrator.send_verification_code(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Request("Email already registered".to_string()));
    assert!(scheduler.scheduled().is_empty());
    assert!(!orchestrator.session().code_sent());

    api.send = Ok(SendCodeResponse {
        success: false,
        message: Some("  ".to_string()),
        expire_minutes: None,
    });
    let err = orchestrator.send_verification_code(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Request(ERROR_SEND_CODE_FAILED.to_string()));
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, RegistrationEvent::Notice(n) if n.message == ERROR_SEND_CODE_FAILED)));
}

#[test]
fn test_send_response_after_close_is_dropped() {
    let (mut orchestrator, mut events, scheduler) = open_orchestrator(true);
    orchestrator.set_email("a@b.com");
    let pending = orchestrator.begin_send_code().unwrap();
    orchestrator.close();
    drain(&mut events);

    let result = orchestrator.finish_send_code(
        pending.session,
        Ok(SendCodeResponse {
            success: true,
            message: None,
            expire_minutes: Some(10),
        }),
    );
    assert_eq!(result, Err(RegistrationError::Stale));
    assert_eq!(orchestrator.phase(), RegistrationPhase::Closed);
    assert_eq!(orchestrator.active_timer(), None);
    assert!(scheduler.active().is_empty());
    assert_eq!(orchestrator.session().cooldown_remaining, 0);
    // Nothing is shown for a dialog that is gone
    assert!(drain(&mut events).is_empty());
}

#[test]
fn test_verify_response_from_earlier_session_is_dropped() {
    let (mut orchestrator, _events, _) = open_orchestrator(true);
    orchestrator.set_email("a@b.com");
    let pending = orchestrator.begin_submit_code("123456").unwrap();
    orchestrator.close();
    orchestrator.open();
    orchestrator.set_email("other@x.com");

    let result = orchestrator.finish_submit_code(
        pending.session,
        Ok(VerifyEmailResponse {
            success: true,
            message: None,
        }),
    );
    assert_eq!(result, Err(RegistrationError::Stale));
    assert!(!orchestrator.session().verified);
    assert_eq!(orchestrator.form().email, "other@x.com");
    assert!(!orchestrator.can_submit_registration());
}

#[tokio::test]
async fn test_server_outage_during_verification_is_a_request_error() {
    let (mut orchestrator, _events, _) = open_orchestrator(true);
    let mut api = FakeAuth::happy();
    api.verify = Err(ApiError::Network("connection refused".to_string()));
    orchestrator.set_email("alice@example.com");
    let err = orchestrator.submit_code(&api, "123456").await.unwrap_err();
    assert!(matches!(err, RegistrationError::Request(_)));
}

#[tokio::test]
async fn test_invalid_email_never_reaches_the_server() {
    let (mut orchestrator, _events, _) = open_orchestrator(true);
    let api = FakeAuth::happy();

    let err = orchestrator.send_verification_code(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Validation(ValidationError::EmailRequired));

    orchestrator.set_email("not-an-email");
    let err = orchestrator.send_verification_code(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Validation(ValidationError::InvalidEmail));

    assert!(api.calls().is_empty());
    assert!(!orchestrator.is_busy());
}

#[tokio::test]
async fn test_send_failure_keeps_send_available() {
    let (mut orchestrator, _events, scheduler) = open_orchestrator(true);
    let mut api = FakeAuth::happy();
    api.send = Err(ApiError::Http {
        status: 429,
        message: "Too many requests".to_string(),
    });
    orchestrator.set_email("alice@example.com");

    let err = orchestrator.send_verification_code(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Request("Too many requests".to_string()));
    assert!(scheduler.scheduled().is_empty());
    assert!(orchestrator.can_send_code());
}

#[tokio::test]
async fn test_registration_without_verification() {
    let (mut orchestrator, _events, _) = open_orchestrator(false);
    let api = FakeAuth::happy();
    fill_account(&mut orchestrator);
    assert!(orchestrator.can_submit_registration());

    orchestrator.submit_registration(&api).await.unwrap();
    assert_eq!(api.calls(), vec!["register alice@example.com alice"]);
}

#[tokio::test]
async fn test_local_checks_run_in_order() {
    let (mut orchestrator, _events, _) = open_orchestrator(true);
    let api = FakeAuth::happy();

    let err = orchestrator.submit_registration(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Validation(ValidationError::MissingFields));

    fill_account(&mut orchestrator);
    orchestrator.set_confirm_password("something else");
    let err = orchestrator.submit_registration(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Validation(ValidationError::PasswordMismatch));

    orchestrator.set_password("short");
    orchestrator.set_confirm_password("short");
    let err = orchestrator.submit_registration(&api).await.unwrap_err();
    assert_eq!(
        err,
        RegistrationError::Validation(ValidationError::PasswordTooShort { min: 8 })
    );

    orchestrator.set_password("long enough");
    orchestrator.set_confirm_password("long enough");
    let err = orchestrator.submit_registration(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Validation(ValidationError::VerificationRequired));

    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_disabled_registration_is_refused() {
    let (mut orchestrator, _events, _) = open_orchestrator(false);
    orchestrator.apply_settings(RegistrationSettings {
        enable_registration: false,
        ..RegistrationSettings::default()
    });
    let api = FakeAuth::happy();
    fill_account(&mut orchestrator);

    let err = orchestrator.submit_registration(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Validation(ValidationError::RegistrationDisabled));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn test_failed_registration_keeps_dialog_open() {
    let (mut orchestrator, _events, _) = open_orchestrator(false);
    let mut api = FakeAuth::happy();
    api.register = Err(ApiError::Http {
        status: 409,
        message: "Email already registered".to_string(),
    });
    fill_account(&mut orchestrator);

    let err = orchestrator.submit_registration(&api).await.unwrap_err();
    assert_eq!(err, RegistrationError::Request("Email already registered".to_string()));
    assert_eq!(orchestrator.phase(), RegistrationPhase::SubmissionFailed);
    assert!(orchestrator.is_open());
    assert_eq!(orchestrator.form().username, "alice");
}

#[tokio::test]
async fn test_completed_code_is_not_resubmitted_after_verification() {
    let (mut orchestrator, _events, _) = open_orchestrator(true);
    let api = FakeAuth::happy();
    orchestrator.set_email("alice@example.com");
    orchestrator.submit_code(&api, "123456").await.unwrap();

    assert_eq!(orchestrator.paste_code("654321"), None);
    assert_eq!(orchestrator.form().verification_code, "654321");
}

#[test]
fn test_close_discards_input_and_reopen_starts_clean() {
    let (mut orchestrator, mut events, _) = open_orchestrator(true);
    fill_account(&mut orchestrator);
    assert!(orchestrator.set_code("12"));

    orchestrator.close();
    assert_eq!(drain(&mut events), vec![RegistrationEvent::Closed]);

    orchestrator.open();
    assert_eq!(orchestrator.phase(), RegistrationPhase::Idle);
    assert!(orchestrator.form().email.is_empty());
    assert!(orchestrator.code_entry().is_empty());
}

#[test]
fn test_oversized_external_code_is_ignored() {
    let (mut orchestrator, _events, _) = open_orchestrator(true);
    assert!(orchestrator.set_code("123"));
    assert!(!orchestrator.set_code("1234567"));
    assert_eq!(orchestrator.form().verification_code, "123");
}
