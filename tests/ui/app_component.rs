use std::time::Duration;

use accountdesk::api::{ApiClient, SendCodeResponse};
use accountdesk::config::Config;
use accountdesk::logger::Logger;
use accountdesk::ui::core::{Action, Component, EventType};
use accountdesk::ui::AppComponent;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{backend::TestBackend, Terminal};

fn app() -> AppComponent {
    // Nothing listens here; requests fail fast and are reported as notices
    let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
    AppComponent::new(&Config::default(), api, Logger::new())
}

fn press(app: &mut AppComponent, code: KeyCode) {
    app.handle_event(EventType::Key(KeyEvent::new(code, KeyModifiers::NONE)));
}

fn screen(app: &mut AppComponent) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
    terminal.draw(|f| app.render(f, f.area())).unwrap();
    let buffer = terminal.backend().buffer();
    buffer.content().iter().map(|cell| cell.symbol()).collect()
}

#[tokio::test]
async fn test_quit_key() {
    let mut app = app();
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit());
}

#[tokio::test]
async fn test_ctrl_c_quits_from_a_dialog() {
    let mut app = app();
    press(&mut app, KeyCode::Char('n'));
    app.handle_event(EventType::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
    assert!(app.should_quit());
}

#[tokio::test]
async fn test_missing_access_token_is_reported() {
    let mut app = app();
    app.start();
    let text = screen(&mut app);
    assert!(text.contains("No access token set"));
}

#[tokio::test]
async fn test_registration_dialog_opens_and_closes() {
    let mut app = app();
    press(&mut app, KeyCode::Char('n'));
    assert!(screen(&mut app).contains("Create Account"));

    // Typing inside the dialog must not trigger global shortcuts
    press(&mut app, KeyCode::Char('q'));
    assert!(!app.should_quit());

    press(&mut app, KeyCode::Esc);
    assert!(!screen(&mut app).contains("Create Account"));
}

#[tokio::test]
async fn test_code_sent_after_dialog_closed_is_ignored() {
    let mut app = app();
    press(&mut app, KeyCode::Char('n'));
    press(&mut app, KeyCode::Esc);

    for session in 0..4 {
        app.dispatch(Action::VerificationCodeSent(
            session,
            Ok(SendCodeResponse {
                success: true,
                message: None,
                expire_minutes: Some(10),
            }),
        ));
    }
    let text = screen(&mut app);
    assert!(!text.contains("Verification code sent"));
    assert!(!text.contains("Create Account"));
}

#[tokio::test]
async fn test_delete_confirmation_flow() {
    let mut app = app();
    app.dispatch(Action::ShowDialog(accountdesk::ui::core::DialogType::DeleteConfirmation {
        token_id: "tok-1".to_string(),
        name: "ci-bot".to_string(),
    }));
    assert!(screen(&mut app).contains("ci-bot"));

    press(&mut app, KeyCode::Char('n'));
    assert!(!screen(&mut app).contains("ci-bot"));
}

#[tokio::test]
async fn test_logs_dialog_shows_app_activity() {
    let mut app = app();
    press(&mut app, KeyCode::Char('G'));
    assert!(screen(&mut app).contains("opening logs dialog"));
}
