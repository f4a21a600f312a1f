use crate::api::{
    ApiError, IssuedToken, ManagementToken, ProviderEndpoint, RegisterResponse, RegistrationSettings,
    SendCodeResponse, TokenList, TokenScope, VerifyEmailResponse,
};
use crate::endpoints::EndpointSubmission;
use crate::registration::{Notice, SessionId, TimerId};

#[derive(Debug, Clone)]
pub enum Action {
    // Navigation
    NextToken,
    PreviousToken,

    // Management tokens
    RefreshTokens,
    SwitchTokenScope(TokenScope),
    TokensLoaded(TokenList),
    TokensFailed(String),
    CreateToken(crate::api::CreateTokenRequest),
    TokenCreated(IssuedToken),
    ToggleToken(String),
    TokenToggled(ManagementToken),
    DeleteToken(String),
    TokenDeleted(String),
    RegenerateToken(String),
    TokenRegenerated(IssuedToken),
    TokenActionFailed(String),

    // Registration
    RegistrationSettingsLoaded(Result<RegistrationSettings, ApiError>),
    SendVerificationCode,
    VerificationCodeSent(SessionId, Result<SendCodeResponse, ApiError>),
    SubmitVerificationCode(String),
    VerificationCodeChecked(SessionId, Result<VerifyEmailResponse, ApiError>),
    SubmitRegistration,
    RegistrationCompleted(SessionId, Result<RegisterResponse, ApiError>),
    CooldownTick(TimerId),

    // Provider endpoints
    LoadEndpoints(String),
    EndpointsLoaded {
        provider_id: String,
        endpoints: Vec<ProviderEndpoint>,
    },
    SaveEndpoint(EndpointSubmission),
    EndpointSaved(ProviderEndpoint),
    EndpointFailed(String),

    // UI operations
    ShowDialog(DialogType),
    HideDialog,
    Notify(Notice),

    // App control
    Quit,
    None,
}

#[derive(Debug, Clone)]
pub enum DialogType {
    Registration,
    Endpoints,
    TokenCreation,
    DeleteConfirmation { token_id: String, name: String },
    Error(String),
    Info(String),
    Logs,
}
