//! Main screen: the management tokens visible to the current credentials.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::api::{ManagementToken, TokenList, TokenQuota, TokenScope};
use crate::ui::core::{Action, Component, DialogType};

pub struct TokenListComponent {
    pub tokens: Vec<ManagementToken>,
    pub selected_index: usize,
    pub list_state: ListState,
    pub scope: TokenScope,
    pub total: u64,
    pub quota: Option<TokenQuota>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for TokenListComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenListComponent {
    pub fn new() -> Self {
        Self {
            tokens: Vec::new(),
            selected_index: 0,
            list_state: ListState::default(),
            scope: TokenScope::Me,
            total: 0,
            quota: None,
            loading: false,
            error: None,
        }
    }

    pub fn get_selected_token(&self) -> Option<&ManagementToken> {
        self.tokens.get(self.selected_index)
    }

    fn set_tokens(&mut self, list: TokenList) {
        self.tokens = list.items;
        self.total = list.total;
        self.quota = list.quota;
        self.loading = false;
        self.error = None;
        self.clamp_selection();
    }

    fn replace_token(&mut self, token: ManagementToken) {
        if let Some(existing) = self.tokens.iter_mut().find(|t| t.id == token.id) {
            *existing = token;
        } else {
            self.tokens.insert(0, token);
            self.total += 1;
        }
    }

    fn remove_token(&mut self, token_id: &str) {
        let before = self.tokens.len();
        self.tokens.retain(|t| t.id != token_id);
        if self.tokens.len() < before {
            self.total = self.total.saturating_sub(1);
        }
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        if self.tokens.is_empty() {
            self.selected_index = 0;
            self.list_state.select(None);
        } else {
            self.selected_index = self.selected_index.min(self.tokens.len() - 1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn title(&self) -> String {
        let scope = match self.scope {
            TokenScope::Me => "My tokens",
            TokenScope::Admin => "All tokens (admin)",
        };
        match self.quota {
            Some(quota) => format!(
                " {} · {} of {} used, {} left ",
                scope,
                quota.used,
                quota.max,
                quota.remaining()
            ),
            None => format!(" {} · {} total ", scope, self.total),
        }
    }

    fn create_token_item(token: &ManagementToken, now: DateTime<Utc>) -> ListItem<'static> {
        let (icon, icon_color) = if token.is_expired(now) {
            ("⌛", Color::Red)
        } else if token.is_active {
            ("●", Color::Green)
        } else {
            ("○", Color::DarkGray)
        };

        let expiry = match token.expires_at {
            Some(at) if at <= now => "expired".to_string(),
            Some(at) => format!("expires {}", at.format("%Y-%m-%d")),
            None => "no expiry".to_string(),
        };
        let last_used = token
            .last_used_at
            .map(|at| format!("used {}", at.format("%Y-%m-%d %H:%M")))
            .unwrap_or_else(|| "never used".to_string());
        let ips = match &token.allowed_ips {
            Some(ips) if !ips.is_empty() => format!(" · {} IP rule(s)", ips.len()),
            _ => String::new(),
        };

        ListItem::new(Line::from(vec![
            Span::styled(format!("{} ", icon), Style::default().fg(icon_color)),
            Span::styled(
                token.name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", token.masked()), Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("  {} · {} · {} calls{}", expiry, last_used, token.usage_count, ips),
                Style::default().fg(Color::Gray),
            ),
        ]))
    }
}

impl Component for TokenListComponent {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => Action::PreviousToken,
            KeyCode::Down | KeyCode::Char('j') => Action::NextToken,
            KeyCode::Char('t') | KeyCode::Char('r') => Action::RefreshTokens,
            KeyCode::Char('a') => {
                let scope = match self.scope {
                    TokenScope::Me => TokenScope::Admin,
                    TokenScope::Admin => TokenScope::Me,
                };
                Action::SwitchTokenScope(scope)
            }
            KeyCode::Char('c') => Action::ShowDialog(DialogType::TokenCreation),
            KeyCode::Char(' ') | KeyCode::Enter => self
                .get_selected_token()
                .map(|token| Action::ToggleToken(token.id.clone()))
                .unwrap_or(Action::None),
            KeyCode::Char('d') => self
                .get_selected_token()
                .map(|token| {
                    Action::ShowDialog(DialogType::DeleteConfirmation {
                        token_id: token.id.clone(),
                        name: token.name.clone(),
                    })
                })
                .unwrap_or(Action::None),
            KeyCode::Char('R') => self
                .get_selected_token()
                .map(|token| Action::RegenerateToken(token.id.clone()))
                .unwrap_or(Action::None),
            _ => Action::None,
        }
    }

    fn update(&mut self, action: Action) -> Action {
        match action {
            Action::NextToken => {
                if !self.tokens.is_empty() {
                    self.selected_index = (self.selected_index + 1) % self.tokens.len();
                    self.list_state.select(Some(self.selected_index));
                }
                Action::None
            }
            Action::PreviousToken => {
                if !self.tokens.is_empty() {
                    self.selected_index = if self.selected_index == 0 {
                        self.tokens.len() - 1
                    } else {
                        self.selected_index - 1
                    };
                    self.list_state.select(Some(self.selected_index));
                }
                Action::None
            }
            Action::SwitchTokenScope(scope) => {
                self.scope = scope;
                self.tokens.clear();
                self.quota = None;
                self.total = 0;
                self.clamp_selection();
                Action::RefreshTokens
            }
            Action::RefreshTokens => {
                self.loading = true;
                Action::RefreshTokens
            }
            Action::TokensLoaded(list) => {
                self.set_tokens(list);
                Action::None
            }
            Action::TokensFailed(message) => {
                self.loading = false;
                self.error = Some(message.clone());
                Action::TokensFailed(message)
            }
            Action::TokenToggled(token) => {
                self.replace_token(token.clone());
                Action::TokenToggled(token)
            }
            Action::TokenCreated(issued) => {
                self.replace_token(issued.data.clone());
                Action::TokenCreated(issued)
            }
            Action::TokenRegenerated(issued) => {
                self.replace_token(issued.data.clone());
                Action::TokenRegenerated(issued)
            }
            Action::TokenDeleted(token_id) => {
                self.remove_token(&token_id);
                Action::TokenDeleted(token_id)
            }
            other => other,
        }
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        let block = Block::default().borders(Borders::ALL).title(self.title());

        if self.tokens.is_empty() {
            let message = if self.loading {
                "⟳ Loading management tokens...".to_string()
            } else if let Some(error) = &self.error {
                format!("{} (press 't' to retry)", error)
            } else {
                "No management tokens. Press 'c' to create one or 'n' to register an account.".to_string()
            };
            let empty_list = List::new(vec![ListItem::new(message)]).block(block);
            f.render_widget(empty_list, rect);
            return;
        }

        let now = Utc::now();
        let items: Vec<ListItem> = self
            .tokens
            .iter()
            .map(|token| Self::create_token_item(token, now))
            .collect();
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, rect, &mut self.list_state);
    }
}
