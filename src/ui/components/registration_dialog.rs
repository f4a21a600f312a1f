//! Registration dialog: renders the orchestrator and turns keys into its inputs.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

use super::common::{
    create_button, create_dialog_block, create_input_paragraph, create_instructions_paragraph, notice_color,
    shortcuts,
};
use crate::config::RegistrationConfig;
use crate::constants::{DIALOG_TITLE_REGISTRATION, INFO_REGISTRATION_DISABLED};
use crate::registration::{
    ArrowDirection, Notice, RegistrationEvent, RegistrationOrchestrator, RegistrationPhase, TickScheduler,
};
use crate::ui::core::{Action, Component};
use crate::ui::layout::LayoutManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationField {
    Email,
    SendCode,
    Code,
    Username,
    Password,
    ConfirmPassword,
    Submit,
}

const ALL_FIELDS: [RegistrationField; 7] = [
    RegistrationField::Email,
    RegistrationField::SendCode,
    RegistrationField::Code,
    RegistrationField::Username,
    RegistrationField::Password,
    RegistrationField::ConfirmPassword,
    RegistrationField::Submit,
];

pub struct RegistrationDialog {
    orchestrator: RegistrationOrchestrator,
    events: mpsc::UnboundedReceiver<RegistrationEvent>,
    focus: RegistrationField,
    last_notice: Option<Notice>,
}

impl RegistrationDialog {
    pub fn new(options: RegistrationConfig, scheduler: Box<dyn TickScheduler>) -> Self {
        let (orchestrator, events) = RegistrationOrchestrator::new(options, scheduler);
        Self {
            orchestrator,
            events,
            focus: RegistrationField::Email,
            last_notice: None,
        }
    }

    pub fn orchestrator(&self) -> &RegistrationOrchestrator {
        &self.orchestrator
    }

    pub fn orchestrator_mut(&mut self) -> &mut RegistrationOrchestrator {
        &mut self.orchestrator
    }

    pub fn is_visible(&self) -> bool {
        self.orchestrator.is_open()
    }

    pub fn open(&mut self) {
        if !self.orchestrator.is_open() {
            self.focus = RegistrationField::Email;
            self.last_notice = None;
        }
        self.orchestrator.open();
    }

    pub fn close(&mut self) {
        self.orchestrator.close();
    }

    /// Take everything the orchestrator published since the last call.
    pub fn drain_events(&mut self) -> Vec<RegistrationEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            match &event {
                RegistrationEvent::Notice(notice) => self.last_notice = Some(notice.clone()),
                RegistrationEvent::CodeCleared => self.focus = RegistrationField::Code,
                RegistrationEvent::Registered(_) | RegistrationEvent::Closed => self.last_notice = None,
            }
            drained.push(event);
        }
        drained
    }

    fn focus_order(&self) -> Vec<RegistrationField> {
        let verify = self.orchestrator.requires_verification();
        ALL_FIELDS
            .into_iter()
            .filter(|field| verify || !matches!(field, RegistrationField::SendCode | RegistrationField::Code))
            .collect()
    }

    fn move_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let index = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (index + 1) % order.len()
        } else {
            (index + order.len() - 1) % order.len()
        };
        self.focus = order[next];
        if self.focus == RegistrationField::Code {
            self.orchestrator.focus_code_entry();
        }
    }

    fn text_value(&self, field: RegistrationField) -> Option<String> {
        let form = self.orchestrator.form();
        match field {
            RegistrationField::Email => Some(form.email.clone()),
            RegistrationField::Username => Some(form.username.clone()),
            RegistrationField::Password => Some(form.password.clone()),
            RegistrationField::ConfirmPassword => Some(form.confirm_password.clone()),
            _ => None,
        }
    }

    fn set_text_value(&mut self, field: RegistrationField, value: String) {
        match field {
            RegistrationField::Email => self.orchestrator.set_email(value),
            RegistrationField::Username => self.orchestrator.set_username(value),
            RegistrationField::Password => self.orchestrator.set_password(value),
            RegistrationField::ConfirmPassword => self.orchestrator.set_confirm_password(value),
            _ => {}
        }
    }

    fn edit_text(&mut self, key: KeyCode) {
        let Some(mut value) = self.text_value(self.focus) else {
            return;
        };
        match key {
            KeyCode::Char(c) => value.push(c),
            KeyCode::Backspace => {
                value.pop();
            }
            _ => return,
        }
        self.set_text_value(self.focus, value);
    }

    fn verify_action(&self, code: Option<String>) -> Action {
        match code {
            Some(code) if !self.orchestrator.is_busy() => Action::SubmitVerificationCode(code),
            _ => Action::None,
        }
    }

    fn handle_code_key(&mut self, key: KeyCode) -> Action {
        let index = self.orchestrator.code_entry().focus_target().index();
        match key {
            KeyCode::Char(c) => {
                let code = self.orchestrator.enter_code_character(index, &c.to_string());
                self.verify_action(code)
            }
            KeyCode::Backspace => {
                let code = self.orchestrator.code_backspace(index);
                self.verify_action(code)
            }
            KeyCode::Left => {
                self.orchestrator.move_code_focus(ArrowDirection::Left);
                Action::None
            }
            KeyCode::Right => {
                self.orchestrator.move_code_focus(ArrowDirection::Right);
                Action::None
            }
            KeyCode::Enter => {
                let entry = self.orchestrator.code_entry();
                let code = (entry.is_complete() && !self.orchestrator.session().verified).then(|| entry.value());
                self.verify_action(code)
            }
            _ => Action::None,
        }
    }

    fn submit_action(&self) -> Action {
        if self.orchestrator.is_submitting() {
            Action::None
        } else {
            Action::SubmitRegistration
        }
    }

    fn send_code_label(&self) -> String {
        let session = self.orchestrator.session();
        if self.orchestrator.is_busy() && !session.code_sent() {
            "Sending…".to_string()
        } else if session.is_cooling_down() {
            format!("Resend in {}s", session.cooldown_remaining)
        } else if session.code_sent() {
            "Resend code".to_string()
        } else {
            "Send code".to_string()
        }
    }

    fn render_code_slots(&self, f: &mut Frame, area: Rect) {
        let entry = self.orchestrator.code_entry();
        let session = self.orchestrator.session();
        let focused = self.focus == RegistrationField::Code;
        let cursor = entry.focus_target().index();

        let mut spans = Vec::new();
        for (index, slot) in entry.slots().iter().enumerate() {
            let digit = slot.map(|c| c.to_string()).unwrap_or_else(|| "_".to_string());
            let style = if focused && index == cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(format!(" {} ", digit), style));
            spans.push(Span::raw(" "));
        }

        let (border, title) = if session.verified {
            (Color::Green, " Verification code ✓ ".to_string())
        } else if session.last_error {
            (Color::Red, " Verification code ✗ ".to_string())
        } else if session.code_sent() {
            (
                if focused { Color::Cyan } else { Color::Gray },
                format!(" Verification code (valid {} min) ", session.expire_minutes),
            )
        } else {
            (Color::DarkGray, " Verification code ".to_string())
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(title)
            .style(Style::default().fg(border));
        f.render_widget(
            Paragraph::new(Line::from(spans)).alignment(Alignment::Center).block(block),
            area,
        );
    }

    fn title(&self) -> String {
        let phase = match self.orchestrator.phase() {
            RegistrationPhase::Closed | RegistrationPhase::Idle => return DIALOG_TITLE_REGISTRATION.to_string(),
            RegistrationPhase::CodeSent => "code sent",
            RegistrationPhase::Verified => "email verified",
            RegistrationPhase::VerificationFailed => "verification failed",
            RegistrationPhase::Submitting => "submitting…",
            RegistrationPhase::SubmissionFailed => "submission failed",
        };
        format!("{} · {}", DIALOG_TITLE_REGISTRATION, phase)
    }
}

impl Component for RegistrationDialog {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        if !self.is_visible() {
            return Action::None;
        }

        match key.code {
            KeyCode::Esc => return Action::HideDialog,
            KeyCode::Tab | KeyCode::Down => {
                self.move_focus(true);
                return Action::None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.move_focus(false);
                return Action::None;
            }
            _ => {}
        }

        if !self.orchestrator.settings().enable_registration {
            return Action::None;
        }

        match self.focus {
            RegistrationField::Code => self.handle_code_key(key.code),
            RegistrationField::SendCode => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') if self.orchestrator.can_send_code() => Action::SendVerificationCode,
                _ => Action::None,
            },
            RegistrationField::Email => match key.code {
                KeyCode::Enter if self.orchestrator.requires_verification() => {
                    if self.orchestrator.can_send_code() {
                        Action::SendVerificationCode
                    } else {
                        Action::None
                    }
                }
                KeyCode::Enter => self.submit_action(),
                code => {
                    self.edit_text(code);
                    Action::None
                }
            },
            RegistrationField::Submit => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.submit_action(),
                _ => Action::None,
            },
            _ => match key.code {
                KeyCode::Enter => self.submit_action(),
                code => {
                    self.edit_text(code);
                    Action::None
                }
            },
        }
    }

    fn handle_paste(&mut self, text: &str) -> Action {
        if !self.is_visible() {
            return Action::None;
        }
        match self.focus {
            RegistrationField::Code => {
                let code = self.orchestrator.paste_code(text);
                self.verify_action(code)
            }
            field => {
                if let Some(mut value) = self.text_value(field) {
                    value.push_str(text.trim_end_matches(['\r', '\n']));
                    self.set_text_value(field, value);
                }
                Action::None
            }
        }
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        if !self.is_visible() {
            return;
        }

        let area = LayoutManager::centered_rect_lines(60, 23, rect);
        f.render_widget(Clear, area);
        let title = self.title();
        let block = create_dialog_block(&title, Color::Cyan);
        let inner = block.inner(area);
        f.render_widget(block, area);

        if !self.orchestrator.settings().enable_registration {
            let message = Paragraph::new(INFO_REGISTRATION_DISABLED)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow));
            let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
            f.render_widget(message, rows[0]);
            f.render_widget(create_instructions_paragraph(&[shortcuts::ESC_CLOSE]), rows[1]);
            return;
        }

        let verify = self.orchestrator.requires_verification();
        let mut constraints = vec![Constraint::Length(3)];
        if verify {
            constraints.extend([Constraint::Length(1), Constraint::Length(3)]);
        }
        constraints.extend([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ]);
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        let form = self.orchestrator.form();
        let focus = self.focus;
        let mut row = 0;
        let mut next_row = || {
            row += 1;
            rows[row - 1]
        };

        f.render_widget(
            create_input_paragraph(&form.email, "Email", focus == RegistrationField::Email, false),
            next_row(),
        );
        if verify {
            f.render_widget(
                create_button(
                    &self.send_code_label(),
                    focus == RegistrationField::SendCode,
                    self.orchestrator.can_send_code(),
                ),
                next_row(),
            );
            self.render_code_slots(f, next_row());
        }
        f.render_widget(
            create_input_paragraph(&form.username, "Username", focus == RegistrationField::Username, false),
            next_row(),
        );
        f.render_widget(
            create_input_paragraph(&form.password, "Password", focus == RegistrationField::Password, true),
            next_row(),
        );
        f.render_widget(
            create_input_paragraph(
                &form.confirm_password,
                "Confirm password",
                focus == RegistrationField::ConfirmPassword,
                true,
            ),
            next_row(),
        );
        let submit_label = if self.orchestrator.is_submitting() {
            "Registering…"
        } else {
            "Register"
        };
        f.render_widget(
            create_button(
                submit_label,
                focus == RegistrationField::Submit,
                self.orchestrator.can_submit_registration() && !self.orchestrator.is_submitting(),
            ),
            next_row(),
        );

        let notice_area = next_row();
        if let Some(notice) = &self.last_notice {
            f.render_widget(
                Paragraph::new(notice.message.clone())
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(notice_color(notice.level))),
                notice_area,
            );
        }

        f.render_widget(
            create_instructions_paragraph(&[
                shortcuts::TAB_NEXT,
                shortcuts::SEPARATOR,
                shortcuts::ENTER_SUBMIT,
                shortcuts::SEPARATOR,
                shortcuts::ESC_CANCEL,
            ]),
            next_row(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::ManualScheduler;
    use crossterm::event::KeyModifiers;

    fn dialog() -> RegistrationDialog {
        let mut dialog = RegistrationDialog::new(RegistrationConfig::default(), Box::new(ManualScheduler::new()));
        dialog.open();
        dialog
    }

    fn press(dialog: &mut RegistrationDialog, code: KeyCode) -> Action {
        dialog.handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn typing_updates_the_focused_field() {
        let mut dialog = dialog();
        for c in "a@b.co".chars() {
            press(&mut dialog, KeyCode::Char(c));
        }
        press(&mut dialog, KeyCode::Backspace);
        assert_eq!(dialog.orchestrator().form().email, "a@b.c");
    }

    #[test]
    fn pasting_a_full_code_requests_verification() {
        let mut dialog = dialog();
        dialog.orchestrator_mut().apply_settings(crate::api::RegistrationSettings {
            require_email_verification: true,
            ..Default::default()
        });
        press(&mut dialog, KeyCode::Tab);
        press(&mut dialog, KeyCode::Tab);
        assert!(matches!(
            dialog.handle_paste("123456"),
            Action::SubmitVerificationCode(code) if code == "123456"
        ));
    }

    #[test]
    fn code_fields_are_skipped_when_verification_is_off() {
        let mut dialog = dialog();
        press(&mut dialog, KeyCode::Tab);
        assert_eq!(dialog.focus, RegistrationField::Username);
    }

    #[test]
    fn escape_requests_hiding() {
        let mut dialog = dialog();
        assert!(matches!(press(&mut dialog, KeyCode::Esc), Action::HideDialog));
    }
}
