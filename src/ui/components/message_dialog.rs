//! Small modal dialogs: info, error and delete confirmation.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::Color,
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use super::common::{create_dialog_block, create_instructions_paragraph, shortcuts};
use crate::constants::DIALOG_TITLE_CONFIRM_DELETE;
use crate::ui::core::{Action, Component};
use crate::ui::layout::LayoutManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Info(String),
    Error(String),
    ConfirmDelete { token_id: String, name: String },
}

#[derive(Default)]
pub struct MessageDialog {
    message: Option<Message>,
}

impl MessageDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    pub fn show(&mut self, message: Message) {
        self.message = Some(message);
    }

    pub fn close(&mut self) {
        self.message = None;
    }
}

impl Component for MessageDialog {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        match &self.message {
            None => Action::None,
            Some(Message::ConfirmDelete { token_id, .. }) => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let token_id = token_id.clone();
                    self.close();
                    Action::DeleteToken(token_id)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Action::HideDialog,
                _ => Action::None,
            },
            Some(_) => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => Action::HideDialog,
                _ => Action::None,
            },
        }
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        let Some(message) = &self.message else {
            return;
        };

        let (title, color, text, hints): (&str, Color, String, Vec<_>) = match message {
            Message::Info(text) => ("Info", Color::Cyan, text.clone(), vec![shortcuts::ESC_CLOSE]),
            Message::Error(text) => ("Error", Color::Red, text.clone(), vec![shortcuts::ESC_CLOSE]),
            Message::ConfirmDelete { name, .. } => (
                DIALOG_TITLE_CONFIRM_DELETE,
                Color::Red,
                format!("Delete token '{}'? Clients using it will stop working.", name),
                vec![
                    ("y", Color::Red, " Delete"),
                    shortcuts::SEPARATOR,
                    ("n/Esc", Color::Gray, " Keep"),
                ],
            ),
        };

        let area = LayoutManager::centered_rect_lines(50, 8, rect);
        f.render_widget(Clear, area);
        let block = create_dialog_block(title, color);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            rows[0],
        );
        f.render_widget(create_instructions_paragraph(&hints), rows[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn confirming_deletion_emits_delete_action() {
        let mut dialog = MessageDialog::new();
        dialog.show(Message::ConfirmDelete {
            token_id: "tok-1".to_string(),
            name: "ci".to_string(),
        });
        let action = dialog.handle_key_events(KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE));
        assert!(matches!(action, Action::DeleteToken(id) if id == "tok-1"));
        assert!(!dialog.is_visible());
    }
}
