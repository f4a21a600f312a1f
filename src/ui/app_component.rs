use std::time::{Duration, Instant};

use crate::api::{ApiClient, ApiError, AuthApi, EndpointApi, ManagementTokenApi, TokenFilters, TokenScope};
use crate::config::Config;
use crate::constants::{
    ERROR_ENDPOINTS_LOAD_FAILED, ERROR_ENDPOINT_SAVE_FAILED, ERROR_NO_ACCESS_TOKEN, ERROR_TOKENS_LOAD_FAILED,
    ERROR_TOKEN_ACTION_FAILED, NOTICE_TTL_SECS, SUCCESS_ENDPOINT_CREATED, SUCCESS_ENDPOINT_UPDATED,
    SUCCESS_TOKEN_CREATED, SUCCESS_TOKEN_DELETED, SUCCESS_TOKEN_DISABLED, SUCCESS_TOKEN_ENABLED,
    SUCCESS_TOKEN_REGENERATED,
};
use crate::endpoints::EndpointSubmission;
use crate::logger::Logger;
use crate::registration::{Notice, NoticeLevel, PendingRequest, RegistrationEvent, TokioScheduler};
use crate::ui::components::{
    EndpointDialog, LogsDialog, Message, MessageDialog, RegistrationDialog, StatusBar, TokenCreationDialog,
    TokenListComponent,
};
use crate::ui::core::{
    actions::{Action, DialogType},
    event_handler::EventType,
    task_manager::TaskManager,
    Component,
};
use crate::ui::layout::LayoutManager;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use tokio::sync::mpsc;

/// Follow-up actions are re-dispatched at most this many times per input.
const MAX_DISPATCH_DEPTH: usize = 4;

pub struct AppComponent {
    // Component composition
    token_list: TokenListComponent,
    registration: RegistrationDialog,
    endpoints: EndpointDialog,
    token_creation: TokenCreationDialog,
    messages: MessageDialog,
    logs: LogsDialog,
    status_bar: StatusBar,

    // Services
    api: ApiClient,
    task_manager: TaskManager,
    background_action_rx: mpsc::UnboundedReceiver<Action>,
    logger: Logger,

    endpoint_save_creates: bool,
    should_quit: bool,
}

impl AppComponent {
    pub fn new(config: &Config, api: ApiClient, logger: Logger) -> Self {
        let (task_manager, background_action_rx) = TaskManager::new();
        let scheduler = TokioScheduler::new(task_manager.action_sender(), Action::CooldownTick);

        Self {
            token_list: TokenListComponent::new(),
            registration: RegistrationDialog::new(config.registration.clone(), Box::new(scheduler)),
            endpoints: EndpointDialog::new(),
            token_creation: TokenCreationDialog::new(),
            messages: MessageDialog::new(),
            logs: LogsDialog::new(logger.clone()),
            status_bar: StatusBar::new(Duration::from_secs(NOTICE_TTL_SECS)),
            api,
            task_manager,
            background_action_rx,
            logger,
            endpoint_save_creates: false,
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Check if any background operations are running
    pub fn is_busy(&self) -> bool {
        self.task_manager.task_count() > 0
    }

    /// Load the token list on startup when credentials are available
    pub fn start(&mut self) {
        self.logger.log(format!("AppComponent: using backend {}", self.api.base_url()));
        if self.api.has_access_token() {
            self.dispatch(Action::RefreshTokens);
        } else {
            self.notify(Notice::new(NoticeLevel::Warning, ERROR_NO_ACCESS_TOKEN));
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.logger.log(format!("Notice: {}", notice.message));
        self.status_bar.show(notice);
    }

    fn any_dialog_visible(&self) -> bool {
        self.messages.is_visible()
            || self.token_creation.is_visible()
            || self.logs.is_visible()
            || self.endpoints.is_visible()
            || self.registration.is_visible()
    }

    fn handle_global_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('q') => {
                self.logger.log("Global key: 'q' - quitting application".to_string());
                Action::Quit
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.logger.log("Global key: Ctrl+C - quitting application".to_string());
                Action::Quit
            }
            KeyCode::Char('n') => {
                self.logger.log("Global key: 'n' - opening registration dialog".to_string());
                Action::ShowDialog(DialogType::Registration)
            }
            KeyCode::Char('e') => {
                self.logger.log("Global key: 'e' - opening endpoint dialog".to_string());
                Action::ShowDialog(DialogType::Endpoints)
            }
            KeyCode::Char('G') => {
                self.logger.log("Global key: 'G' - opening logs dialog".to_string());
                Action::ShowDialog(DialogType::Logs)
            }
            _ => Action::None,
        }
    }

    /// Route a key to the topmost visible dialog, or to the main screen.
    fn route_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }
        if self.messages.is_visible() {
            self.messages.handle_key_events(key)
        } else if self.token_creation.is_visible() {
            self.token_creation.handle_key_events(key)
        } else if self.logs.is_visible() {
            self.logs.handle_key_events(key)
        } else if self.endpoints.is_visible() {
            self.endpoints.handle_key_events(key)
        } else if self.registration.is_visible() {
            self.registration.handle_key_events(key)
        } else {
            let action = self.token_list.handle_key_events(key);
            if matches!(action, Action::None) {
                self.handle_global_key(key)
            } else {
                action
            }
        }
    }

    fn route_paste(&mut self, text: &str) -> Action {
        if self.token_creation.is_visible() {
            self.token_creation.handle_paste(text)
        } else if self.endpoints.is_visible() {
            self.endpoints.handle_paste(text)
        } else if self.registration.is_visible() {
            self.registration.handle_paste(text)
        } else {
            Action::None
        }
    }

    /// Process an event through the component hierarchy
    pub fn handle_event(&mut self, event_type: EventType) {
        let action = match event_type {
            EventType::Key(key) => self.route_key(key),
            EventType::Paste(text) => self.route_paste(&text),
            EventType::Resize(_, _) | EventType::Tick | EventType::Other => Action::None,
        };
        self.dispatch(action);
    }

    /// Run an action through the components, then the app level, following up
    /// on whatever comes back.
    pub fn dispatch(&mut self, action: Action) {
        let mut action = action;
        for _ in 0..MAX_DISPATCH_DEPTH {
            if matches!(action, Action::None) {
                break;
            }
            let processed = self.update(action);
            action = self.handle_app_action(processed);
            self.drain_registration_events();
        }
    }

    fn drain_registration_events(&mut self) {
        for event in self.registration.drain_events() {
            match event {
                RegistrationEvent::Notice(notice) => self.notify(notice),
                RegistrationEvent::Registered(response) => {
                    let who = response
                        .username
                        .or(response.email)
                        .unwrap_or_else(|| "new user".to_string());
                    self.logger.log(format!("Registered account {}", who));
                }
                RegistrationEvent::CodeCleared => {
                    self.logger.log("Verification code rejected, entry cleared".to_string());
                }
                RegistrationEvent::Closed => {
                    self.logger.log("Registration dialog closed".to_string());
                }
            }
        }
    }

    /// Drain actions produced by background tasks and timers
    pub fn process_background_actions(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();

        while let Ok(action) = self.background_action_rx.try_recv() {
            if !matches!(action, Action::CooldownTick(_)) {
                self.logger.log(format!("Background: received {}", action_name(&action)));
            }
            actions.push(action);
        }

        let finished = self.task_manager.cleanup_finished_tasks();
        for task in &finished {
            self.logger.log(format!(
                "Background: '{}' finished in {}ms",
                task.description,
                task.elapsed().as_millis()
            ));
        }

        actions
    }

    /// Periodic housekeeping. Returns whether anything visible changed.
    pub fn on_tick(&mut self) -> bool {
        self.status_bar.expire(Instant::now())
    }

    fn open_dialog(&mut self, dialog: DialogType) {
        match dialog {
            DialogType::Registration => {
                self.registration.open();
                let api = self.api.clone();
                self.task_manager.spawn_request(
                    "Load registration settings",
                    async move { api.registration_settings().await },
                    Action::RegistrationSettingsLoaded,
                );
            }
            DialogType::Endpoints => {
                if !self.api.has_access_token() {
                    self.notify(Notice::new(NoticeLevel::Warning, ERROR_NO_ACCESS_TOKEN));
                }
                self.endpoints.open();
            }
            DialogType::TokenCreation => self.token_creation.open(),
            DialogType::DeleteConfirmation { token_id, name } => {
                self.messages.show(Message::ConfirmDelete { token_id, name })
            }
            DialogType::Error(message) => self.messages.show(Message::Error(message)),
            DialogType::Info(message) => self.messages.show(Message::Info(message)),
            DialogType::Logs => self.logs.open(),
        }
    }

    fn hide_top_dialog(&mut self) {
        if self.messages.is_visible() {
            self.messages.close();
        } else if self.token_creation.is_visible() {
            self.token_creation.close();
        } else if self.logs.is_visible() {
            self.logs.close();
        } else if self.endpoints.is_visible() {
            self.endpoints.close();
        } else if self.registration.is_visible() {
            self.registration.close();
        }
    }

    fn token_scope(&self) -> TokenScope {
        self.token_list.scope
    }

    /// Handle app-level actions that require business logic
    pub fn handle_app_action(&mut self, action: Action) -> Action {
        match action {
            Action::Quit => {
                self.should_quit = true;
                Action::None
            }
            Action::ShowDialog(dialog) => {
                self.open_dialog(dialog);
                Action::None
            }
            Action::HideDialog => {
                self.hide_top_dialog();
                Action::None
            }
            Action::Notify(notice) => {
                self.notify(notice);
                Action::None
            }

            // Management tokens
            Action::RefreshTokens => {
                if !self.api.has_access_token() {
                    return Action::TokensFailed(ERROR_NO_ACCESS_TOKEN.to_string());
                }
                let api = self.api.clone();
                let scope = self.token_scope();
                self.task_manager.spawn_request(
                    "Load management tokens",
                    async move { api.list_tokens(scope, &TokenFilters::default()).await },
                    |result| match result {
                        Ok(list) => Action::TokensLoaded(list),
                        Err(e) => Action::TokensFailed(e.user_message(ERROR_TOKENS_LOAD_FAILED)),
                    },
                );
                Action::None
            }
            Action::TokensFailed(message) => {
                self.notify(Notice::error(message));
                Action::None
            }
            Action::CreateToken(request) => {
                let api = self.api.clone();
                let scope = self.token_scope();
                self.task_manager.spawn_request(
                    "Create management token",
                    async move { api.create_token(scope, &request).await },
                    |result| match result {
                        Ok(issued) => Action::TokenCreated(issued),
                        Err(e) => Action::TokenActionFailed(e.user_message(ERROR_TOKEN_ACTION_FAILED)),
                    },
                );
                Action::None
            }
            Action::TokenCreated(issued) => {
                self.token_creation.close();
                self.notify(Notice::success(format!("{} '{}'", SUCCESS_TOKEN_CREATED, issued.data.name)));
                self.messages.show(Message::Info(format!(
                    "{}:\n\n{}\n\nIt will not be shown again.",
                    SUCCESS_TOKEN_CREATED, issued.token
                )));
                Action::None
            }
            Action::ToggleToken(token_id) => {
                let api = self.api.clone();
                let scope = self.token_scope();
                self.task_manager.spawn_request(
                    "Toggle management token",
                    async move { api.toggle_token(scope, &token_id).await },
                    |result| match result {
                        Ok(token) => Action::TokenToggled(token),
                        Err(e) => Action::TokenActionFailed(e.user_message(ERROR_TOKEN_ACTION_FAILED)),
                    },
                );
                Action::None
            }
            Action::TokenToggled(token) => {
                let message = if token.is_active {
                    SUCCESS_TOKEN_ENABLED
                } else {
                    SUCCESS_TOKEN_DISABLED
                };
                self.notify(Notice::success(format!("{}: {}", message, token.name)));
                Action::None
            }
            Action::DeleteToken(token_id) => {
                let api = self.api.clone();
                let scope = self.token_scope();
                self.task_manager.spawn_request(
                    "Delete management token",
                    async move {
                        api.delete_token(scope, &token_id).await?;
                        Ok::<_, ApiError>(token_id)
                    },
                    |result| match result {
                        Ok(token_id) => Action::TokenDeleted(token_id),
                        Err(e) => Action::TokenActionFailed(e.user_message(ERROR_TOKEN_ACTION_FAILED)),
                    },
                );
                Action::None
            }
            Action::TokenDeleted(_) => {
                self.notify(Notice::success(SUCCESS_TOKEN_DELETED));
                Action::None
            }
            Action::RegenerateToken(token_id) => {
                let api = self.api.clone();
                let scope = self.token_scope();
                self.task_manager.spawn_request(
                    "Regenerate management token",
                    async move { api.regenerate_token(scope, &token_id).await },
                    |result| match result {
                        Ok(issued) => Action::TokenRegenerated(issued),
                        Err(e) => Action::TokenActionFailed(e.user_message(ERROR_TOKEN_ACTION_FAILED)),
                    },
                );
                Action::None
            }
            Action::TokenRegenerated(issued) => {
                self.messages.show(Message::Info(format!(
                    "{}:\n\n{}\n\nIt will not be shown again.",
                    SUCCESS_TOKEN_REGENERATED, issued.token
                )));
                Action::None
            }
            Action::TokenActionFailed(message) => {
                self.notify(Notice::error(message));
                Action::None
            }

            // Registration
            Action::RegistrationSettingsLoaded(result) => {
                match result {
                    Ok(settings) => {
                        self.logger.log(format!(
                            "Registration settings: enabled={}, verification={}",
                            settings.enable_registration, settings.require_email_verification
                        ));
                        self.registration.orchestrator_mut().apply_settings(settings);
                    }
                    Err(e) => {
                        // Keep the defaults; the server still enforces its own policy
                        self.logger.log(format!("Could not load registration settings: {}", e));
                    }
                }
                Action::None
            }
            Action::SendVerificationCode => {
                if let Ok(PendingRequest { session, request }) =
                    self.registration.orchestrator_mut().begin_send_code()
                {
                    let api = self.api.clone();
                    self.task_manager.spawn_request(
                        "Send verification code",
                        async move { api.send_verification_code(&request).await },
                        move |result| Action::VerificationCodeSent(session, result),
                    );
                }
                Action::None
            }
            Action::VerificationCodeSent(session, result) => {
                // Failures are already surfaced as notices, stale results are dropped
                let _ = self.registration.orchestrator_mut().finish_send_code(session, result);
                Action::None
            }
            Action::SubmitVerificationCode(code) => {
                if let Ok(PendingRequest { session, request }) =
                    self.registration.orchestrator_mut().begin_submit_code(&code)
                {
                    let api = self.api.clone();
                    self.task_manager.spawn_request(
                        "Verify email",
                        async move { api.verify_email(&request).await },
                        move |result| Action::VerificationCodeChecked(session, result),
                    );
                }
                Action::None
            }
            Action::VerificationCodeChecked(session, result) => {
                let _ = self.registration.orchestrator_mut().finish_submit_code(session, result);
                Action::None
            }
            Action::SubmitRegistration => {
                if let Ok(PendingRequest { session, request }) =
                    self.registration.orchestrator_mut().begin_submit_registration()
                {
                    let api = self.api.clone();
                    self.task_manager.spawn_request(
                        "Register account",
                        async move { api.register(&request).await },
                        move |result| Action::RegistrationCompleted(session, result),
                    );
                }
                Action::None
            }
            Action::RegistrationCompleted(session, result) => {
                let _ = self
                    .registration
                    .orchestrator_mut()
                    .finish_submit_registration(session, result);
                Action::None
            }
            Action::CooldownTick(timer_id) => {
                self.registration.orchestrator_mut().on_cooldown_tick(timer_id);
                Action::None
            }

            // Provider endpoints
            Action::LoadEndpoints(provider_id) => {
                let api = self.api.clone();
                self.task_manager.spawn_request(
                    "Load provider endpoints",
                    {
                        let provider_id = provider_id.clone();
                        async move { api.list_endpoints(&provider_id).await }
                    },
                    move |result| match result {
                        Ok(endpoints) => Action::EndpointsLoaded { provider_id, endpoints },
                        Err(e) => Action::EndpointFailed(e.user_message(ERROR_ENDPOINTS_LOAD_FAILED)),
                    },
                );
                Action::None
            }
            Action::SaveEndpoint(submission) => {
                self.endpoint_save_creates = matches!(submission, EndpointSubmission::Create { .. });
                let api = self.api.clone();
                self.task_manager.spawn_request(
                    "Save provider endpoint",
                    async move {
                        match submission {
                            EndpointSubmission::Create { provider_id, config } => {
                                api.create_endpoint(&provider_id, &config).await
                            }
                            EndpointSubmission::Update { endpoint_id, config } => {
                                api.update_endpoint(&endpoint_id, &config).await
                            }
                        }
                    },
                    |result| match result {
                        Ok(endpoint) => Action::EndpointSaved(endpoint),
                        Err(e) => Action::EndpointFailed(e.user_message(ERROR_ENDPOINT_SAVE_FAILED)),
                    },
                );
                Action::None
            }
            Action::EndpointSaved(endpoint) => {
                let message = if self.endpoint_save_creates {
                    SUCCESS_ENDPOINT_CREATED
                } else {
                    SUCCESS_ENDPOINT_UPDATED
                };
                self.logger.log(format!("Endpoint {} saved", endpoint.id));
                self.notify(Notice::success(message));
                Action::None
            }
            Action::EndpointFailed(message) => {
                self.notify(Notice::error(message));
                Action::None
            }

            other => other,
        }
    }
}

/// Short label for logging; avoids dumping payloads that may carry secrets.
fn action_name(action: &Action) -> &'static str {
    match action {
        Action::TokensLoaded(_) => "TokensLoaded",
        Action::TokensFailed(_) => "TokensFailed",
        Action::TokenCreated(_) => "TokenCreated",
        Action::TokenToggled(_) => "TokenToggled",
        Action::TokenDeleted(_) => "TokenDeleted",
        Action::TokenRegenerated(_) => "TokenRegenerated",
        Action::TokenActionFailed(_) => "TokenActionFailed",
        Action::RegistrationSettingsLoaded(_) => "RegistrationSettingsLoaded",
        Action::VerificationCodeSent(..) => "VerificationCodeSent",
        Action::VerificationCodeChecked(..) => "VerificationCodeChecked",
        Action::RegistrationCompleted(..) => "RegistrationCompleted",
        Action::EndpointsLoaded { .. } => "EndpointsLoaded",
        Action::EndpointSaved(_) => "EndpointSaved",
        Action::EndpointFailed(_) => "EndpointFailed",
        _ => "action",
    }
}

impl Component for AppComponent {
    fn handle_key_events(&mut self, key: KeyEvent) -> Action {
        self.route_key(key)
    }

    fn update(&mut self, action: Action) -> Action {
        // Process through component hierarchy
        let action = self.endpoints.update(action);
        self.token_list.update(action)
    }

    fn render(&mut self, f: &mut Frame, rect: Rect) {
        let (content, status) = LayoutManager::main_layout(rect);
        self.token_list.render(f, content);
        let busy = self.is_busy() && !self.any_dialog_visible();
        self.status_bar.render(f, status, busy);

        // Dialogs stack in the same order keys are routed
        self.registration.render(f, content);
        self.endpoints.render(f, content);
        self.logs.render(f, content);
        self.token_creation.render(f, content);
        self.messages.render(f, content);
    }
}
