//! Logs dialog component for displaying application logs

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState},
    Frame,
};

use crate::constants::DIALOG_TITLE_LOGS;
use crate::logger::Logger;
use crate::ui::core::{Action, Component};
use crate::ui::layout::LayoutManager;

pub struct LogsDialog {
    logger: Logger,
    visible: bool,
    list_state: ListState,
}

impl LogsDialog {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            visible: false,
            list_state: ListState::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn open(&mut self) {
        self.visible = true;
        self.list_state.select(Some(0));
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    fn line_style(message: &str) -> Style {
        if message.starts_with("ERROR") || message.contains('❌') || message.contains("failed") {
            Style::default().fg(Color::Red)
        } else if message.starts_with("WARN") {
            Style::default().fg(Color::Yellow)
        } else if message.contains('✅') {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::White)
        }
    }
}

impl Component for LogsDialog {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        if !self.visible {
            return Action::None;
        }
        let current = self.list_state.selected().unwrap_or(0);
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('G') => Action::HideDialog,
            KeyCode::Down | KeyCode::Char('j') => {
                self.list_state.select(Some(current.saturating_add(1)));
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.list_state.select(Some(current.saturating_sub(1)));
                Action::None
            }
            KeyCode::Home => {
                self.list_state.select(Some(0));
                Action::None
            }
            KeyCode::Char('x') => {
                self.logger.clear();
                self.list_state.select(Some(0));
                Action::None
            }
            _ => Action::None,
        }
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        if !self.visible {
            return;
        }

        let area = LayoutManager::centered_rect(80, 80, rect);
        f.render_widget(Clear, area);
        let block = Block::default()
            .title(DIALOG_TITLE_LOGS)
            .borders(Borders::ALL)
            .style(Style::default().bg(Color::Black))
            .border_style(Style::default().fg(Color::Cyan));
        f.render_widget(block, area);
        let inner = area.inner(Margin {
            vertical: 1,
            horizontal: 1,
        });

        let logs = self.logger.get_logs();
        if logs.is_empty() {
            f.render_widget(
                List::new(vec![ListItem::new("No logs yet").style(Style::default().fg(Color::Gray))]),
                inner,
            );
            return;
        }

        // Newest first; keep the selection inside the list
        let last = logs.len() - 1;
        if self.list_state.selected().is_some_and(|i| i > last) {
            self.list_state.select(Some(last));
        }

        let items: Vec<ListItem> = logs
            .into_iter()
            .map(|entry| {
                let (timestamp, message) = match entry.find("] ") {
                    Some(end) if entry.starts_with('[') => (entry[1..end].to_string(), entry[end + 2..].to_string()),
                    _ => (String::new(), entry),
                };
                let style = Self::line_style(&message);
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", timestamp), Style::default().fg(Color::DarkGray)),
                    Span::styled(message, style),
                ]))
            })
            .collect();

        let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray));
        f.render_stateful_widget(list, inner, &mut self.list_state);
    }
}
