//! Provider endpoint dialog: pick a provider, browse its endpoints, edit one.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::common::{
    create_dialog_block, create_input_paragraph, create_instructions_paragraph, create_selection_paragraph,
    shortcuts,
};
use crate::api::ProviderEndpoint;
use crate::constants::{DIALOG_TITLE_ENDPOINT_CREATE, DIALOG_TITLE_ENDPOINT_EDIT};
use crate::endpoints::{EndpointField, EndpointForm};
use crate::ui::core::{Action, Component};
use crate::ui::layout::LayoutManager;

enum Stage {
    ProviderPrompt { input: String },
    List { provider_id: String, loading: bool },
    Form { form: Box<EndpointForm>, error: Option<String>, saving: bool },
}

pub struct EndpointDialog {
    visible: bool,
    stage: Stage,
    endpoints: Vec<ProviderEndpoint>,
    list_state: ListState,
}

impl Default for EndpointDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointDialog {
    pub fn new() -> Self {
        Self {
            visible: false,
            stage: Stage::ProviderPrompt { input: String::new() },
            endpoints: Vec::new(),
            list_state: ListState::default(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn open(&mut self) {
        self.visible = true;
        self.stage = Stage::ProviderPrompt { input: String::new() };
        self.endpoints.clear();
        self.list_state.select(None);
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    fn provider_id(&self) -> Option<&str> {
        match &self.stage {
            Stage::List { provider_id, .. } => Some(provider_id),
            _ => None,
        }
    }

    fn selected(&self) -> Option<&ProviderEndpoint> {
        self.list_state.selected().and_then(|i| self.endpoints.get(i))
    }

    fn move_selection(&mut self, forward: bool) {
        if self.endpoints.is_empty() {
            return;
        }
        let len = self.endpoints.len();
        let current = self.list_state.selected().unwrap_or(0);
        let next = if forward { (current + 1) % len } else { (current + len - 1) % len };
        self.list_state.select(Some(next));
    }

    fn back_to_list(&mut self) {
        let provider_id = match &self.stage {
            Stage::Form { form, .. } => match form.target() {
                crate::endpoints::EndpointTarget::Create { provider_id } => Some(provider_id.clone()),
                crate::endpoints::EndpointTarget::Edit { .. } => self
                    .selected()
                    .map(|endpoint| endpoint.provider_id.clone()),
            },
            _ => None,
        };
        if let Some(provider_id) = provider_id {
            self.stage = Stage::List {
                provider_id,
                loading: false,
            };
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Action {
        let Stage::ProviderPrompt { input } = &mut self.stage else {
            return Action::None;
        };
        match key.code {
            KeyCode::Esc => Action::HideDialog,
            KeyCode::Char(c) => {
                input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                input.pop();
                Action::None
            }
            KeyCode::Enter if !input.trim().is_empty() => {
                let provider_id = input.trim().to_string();
                self.stage = Stage::List {
                    provider_id: provider_id.clone(),
                    loading: true,
                };
                Action::LoadEndpoints(provider_id)
            }
            _ => Action::None,
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::HideDialog,
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(true);
                Action::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(false);
                Action::None
            }
            KeyCode::Char('n') => {
                if let Some(provider_id) = self.provider_id() {
                    self.stage = Stage::Form {
                        form: Box::new(EndpointForm::new(provider_id)),
                        error: None,
                        saving: false,
                    };
                }
                Action::None
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(endpoint) = self.selected() {
                    self.stage = Stage::Form {
                        form: Box::new(EndpointForm::edit(endpoint)),
                        error: None,
                        saving: false,
                    };
                }
                Action::None
            }
            KeyCode::Char('r') => self
                .provider_id()
                .map(|id| Action::LoadEndpoints(id.to_string()))
                .unwrap_or(Action::None),
            KeyCode::Char('p') => {
                self.stage = Stage::ProviderPrompt { input: String::new() };
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc {
            self.back_to_list();
            return Action::None;
        }

        let Stage::Form { form, error, saving } = &mut self.stage else {
            return Action::None;
        };
        if *saving {
            return Action::None;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Left => form.cycle_choice(false),
            KeyCode::Right => form.cycle_choice(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.insert_char(c),
            KeyCode::Enter => {
                return match form.submission() {
                    Ok(submission) => {
                        *error = None;
                        *saving = true;
                        Action::SaveEndpoint(submission)
                    }
                    Err(e) => {
                        *error = Some(e.to_string());
                        Action::None
                    }
                };
            }
            _ => {}
        }
        Action::None
    }

    fn render_prompt(&self, f: &mut Frame, area: Rect, input: &str) {
        let rows = Layout::vertical([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)]).split(area);
        f.render_widget(create_input_paragraph(input, "Provider ID", true, false), rows[0]);
        f.render_widget(
            create_instructions_paragraph(&[
                ("Enter", Color::Green, " Load endpoints"),
                shortcuts::SEPARATOR,
                shortcuts::ESC_CLOSE,
            ]),
            rows[2],
        );
    }

    fn render_list(&mut self, f: &mut Frame, area: Rect, loading: bool) {
        let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).split(area);

        if loading {
            f.render_widget(Paragraph::new("⟳ Loading endpoints...").style(Style::default().fg(Color::Yellow)), rows[0]);
        } else if self.endpoints.is_empty() {
            f.render_widget(
                Paragraph::new("No endpoints for this provider. Press 'n' to add one.")
                    .style(Style::default().fg(Color::Gray)),
                rows[0],
            );
        } else {
            let items: Vec<ListItem> = self
                .endpoints
                .iter()
                .map(|endpoint| {
                    let config = &endpoint.config;
                    let status = if config.is_active {
                        Span::styled("● ", Style::default().fg(Color::Green))
                    } else {
                        Span::styled("○ ", Style::default().fg(Color::DarkGray))
                    };
                    ListItem::new(Line::from(vec![
                        status,
                        Span::styled(
                            format!("{:<11}", config.api_format.as_str()),
                            Style::default().fg(Color::Cyan),
                        ),
                        Span::raw(format!(" {}{}", config.base_url, config.custom_path.as_deref().unwrap_or(""))),
                        Span::styled(
                            format!("  {}s · {} retries", config.timeout, config.max_retries),
                            Style::default().fg(Color::Gray),
                        ),
                    ]))
                })
                .collect();
            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );
            f.render_stateful_widget(list, rows[0], &mut self.list_state);
        }

        f.render_widget(
            create_instructions_paragraph(&[
                ("n", Color::Green, " New"),
                shortcuts::SEPARATOR,
                ("Enter", Color::Cyan, " Edit"),
                shortcuts::SEPARATOR,
                ("r", Color::Yellow, " Reload"),
                shortcuts::SEPARATOR,
                ("p", Color::Yellow, " Provider"),
                shortcuts::SEPARATOR,
                shortcuts::ESC_CLOSE,
            ]),
            rows[1],
        );
    }

    fn render_form(f: &mut Frame, area: Rect, form: &EndpointForm, error: Option<&str>, saving: bool) {
        let rows = Layout::vertical([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)]).split(area);
        let columns = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[0]);
        let half = EndpointField::ALL.len().div_ceil(2);

        for (column, fields) in EndpointField::ALL.chunks(half).enumerate() {
            let cells = LayoutManager::form_rows(columns[column], fields.len(), 3);
            for (cell, field) in cells.iter().zip(fields) {
                let focused = form.focused() == *field;
                let widget = match field {
                    EndpointField::ApiFormat => {
                        create_selection_paragraph(form.api_format.to_string(), field.label(), focused)
                    }
                    EndpointField::IsActive => create_selection_paragraph(yes_no(form.is_active), field.label(), focused),
                    EndpointField::ProxyEnabled => {
                        create_selection_paragraph(yes_no(form.proxy_enabled), field.label(), focused)
                    }
                    other => create_input_paragraph(
                        form.text(*other).unwrap_or_default(),
                        other.label(),
                        focused,
                        *other == EndpointField::ProxyPassword,
                    ),
                };
                f.render_widget(widget, *cell);
            }
        }

        let status = if saving {
            Paragraph::new("⟳ Saving...").style(Style::default().fg(Color::Yellow))
        } else if let Some(error) = error {
            Paragraph::new(format!("❌ {}", error)).style(Style::default().fg(Color::Red))
        } else {
            Paragraph::new("")
        };
        f.render_widget(status, rows[1]);

        let mut hints = vec![shortcuts::TAB_NEXT, shortcuts::SEPARATOR];
        if form.focused().is_choice() {
            hints.extend([shortcuts::SPACE_CHANGE, shortcuts::SEPARATOR]);
        }
        hints.extend([shortcuts::ENTER_SUBMIT, shortcuts::SEPARATOR, ("Esc", Color::Red, " Back")]);
        f.render_widget(create_instructions_paragraph(&hints), rows[2]);
    }
}

fn yes_no(value: bool) -> String {
    let label = if value { "Yes" } else { "No" };
    label.to_string()
}

impl Component for EndpointDialog {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        if !self.visible {
            return Action::None;
        }
        match self.stage {
            Stage::ProviderPrompt { .. } => self.handle_prompt_key(key),
            Stage::List { .. } => self.handle_list_key(key),
            Stage::Form { .. } => self.handle_form_key(key),
        }
    }

    fn handle_paste(&mut self, text: &str) -> Action {
        match &mut self.stage {
            Stage::ProviderPrompt { input } => input.push_str(text.trim()),
            Stage::Form { form, .. } => text.trim().chars().for_each(|c| form.insert_char(c)),
            Stage::List { .. } => {}
        }
        Action::None
    }

    fn update(&mut self, action: Action) -> Action {
        match action {
            Action::EndpointsLoaded { provider_id, endpoints } => {
                if self.provider_id() == Some(provider_id.as_str()) {
                    self.endpoints = endpoints;
                    self.list_state
                        .select(if self.endpoints.is_empty() { None } else { Some(0) });
                    self.stage = Stage::List {
                        provider_id,
                        loading: false,
                    };
                }
                Action::None
            }
            Action::EndpointSaved(endpoint) => {
                match self.endpoints.iter().position(|e| e.id == endpoint.id) {
                    Some(index) => {
                        self.endpoints[index] = endpoint.clone();
                        self.list_state.select(Some(index));
                    }
                    None => {
                        self.endpoints.push(endpoint.clone());
                        self.list_state.select(Some(self.endpoints.len() - 1));
                    }
                }
                self.stage = Stage::List {
                    provider_id: endpoint.provider_id.clone(),
                    loading: false,
                };
                // Let the app show the toast too
                Action::EndpointSaved(endpoint)
            }
            Action::EndpointFailed(message) => {
                match &mut self.stage {
                    Stage::Form { error, saving, .. } => {
                        *saving = false;
                        *error = Some(message.clone());
                    }
                    Stage::List { loading, .. } => *loading = false,
                    Stage::ProviderPrompt { .. } => {}
                }
                Action::EndpointFailed(message)
            }
            other => other,
        }
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        if !self.visible {
            return;
        }

        let area = LayoutManager::centered_rect(80, 80, rect);
        f.render_widget(Clear, area);

        let title = match &self.stage {
            Stage::ProviderPrompt { .. } => "Provider Endpoints".to_string(),
            Stage::List { provider_id, .. } => format!("Endpoints · {}", provider_id),
            Stage::Form { form, .. } if form.is_edit() => DIALOG_TITLE_ENDPOINT_EDIT.to_string(),
            Stage::Form { .. } => DIALOG_TITLE_ENDPOINT_CREATE.to_string(),
        };
        let block = create_dialog_block(&title, Color::Magenta);
        let inner = block.inner(area);
        f.render_widget(block, area);

        match &self.stage {
            Stage::ProviderPrompt { input } => {
                let input = input.clone();
                self.render_prompt(f, inner, &input);
            }
            Stage::List { loading, .. } => {
                let loading = *loading;
                self.render_list(f, inner, loading);
            }
            Stage::Form { form, error, saving } => Self::render_form(f, inner, form, error.as_deref(), *saving),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(dialog: &mut EndpointDialog, code: KeyCode) -> Action {
        dialog.handle_key_events(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn entering_a_provider_requests_its_endpoints() {
        let mut dialog = EndpointDialog::new();
        dialog.open();
        for c in "prov-1".chars() {
            press(&mut dialog, KeyCode::Char(c));
        }
        assert!(matches!(
            press(&mut dialog, KeyCode::Enter),
            Action::LoadEndpoints(id) if id == "prov-1"
        ));
    }

    #[test]
    fn invalid_form_stays_open_with_error() {
        let mut dialog = EndpointDialog::new();
        dialog.open();
        dialog.stage = Stage::List {
            provider_id: "prov-1".to_string(),
            loading: false,
        };
        press(&mut dialog, KeyCode::Char('n'));
        assert!(matches!(press(&mut dialog, KeyCode::Enter), Action::None));
        match &dialog.stage {
            Stage::Form { error, .. } => assert_eq!(error.as_deref(), Some("Base URL is required")),
            _ => panic!("expected the form stage"),
        }
    }
}
