use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Clear, Paragraph},
    Frame,
};

use super::common::{create_dialog_block, create_input_paragraph, create_instructions_paragraph, shortcuts};
use crate::tokens::{TokenDraft, TokenDraftField};
use crate::ui::core::{Action, Component};
use crate::ui::layout::LayoutManager;

#[derive(Default)]
pub struct TokenCreationDialog {
    visible: bool,
    draft: TokenDraft,
    focus: usize,
    error: Option<String>,
}

impl TokenCreationDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn open(&mut self) {
        *self = Self {
            visible: true,
            ..Self::default()
        };
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    fn focused_field(&self) -> TokenDraftField {
        TokenDraftField::ALL[self.focus]
    }
}

impl Component for TokenCreationDialog {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        if !self.visible {
            return Action::None;
        }
        let fields = TokenDraftField::ALL.len();
        match key.code {
            KeyCode::Esc => return Action::HideDialog,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % fields,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + fields - 1) % fields,
            KeyCode::Char(c) => self.draft.field_mut(self.focused_field()).push(c),
            KeyCode::Backspace => {
                self.draft.field_mut(self.focused_field()).pop();
            }
            KeyCode::Enter => {
                return match self.draft.to_request(Utc::now()) {
                    Ok(request) => Action::CreateToken(request),
                    Err(e) => {
                        self.error = Some(e.to_string());
                        Action::None
                    }
                };
            }
            _ => {}
        }
        Action::None
    }

    fn handle_paste(&mut self, text: &str) -> Action {
        if self.visible {
            self.draft.field_mut(self.focused_field()).push_str(text.trim());
        }
        Action::None
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        if !self.visible {
            return;
        }

        let area = LayoutManager::centered_rect_lines(60, 17, rect);
        f.render_widget(Clear, area);
        let block = create_dialog_block("New Management Token", Color::Green);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)]).split(inner);
        let cells = LayoutManager::form_rows(rows[0], TokenDraftField::ALL.len(), 3);
        for (index, field) in TokenDraftField::ALL.iter().enumerate() {
            f.render_widget(
                create_input_paragraph(self.draft.field(*field), field.label(), index == self.focus, false),
                cells[index],
            );
        }

        if let Some(error) = &self.error {
            f.render_widget(
                Paragraph::new(format!("❌ {}", error)).style(Style::default().fg(Color::Red)),
                rows[1],
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
            rows[2],
        );
    }
}
