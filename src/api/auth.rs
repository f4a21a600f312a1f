//! Public authentication endpoints used by the registration dialog.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};

const REGISTRATION_SETTINGS_PATH: &str = "/api/auth/registration-settings";
const SEND_CODE_PATH: &str = "/api/auth/send-verification-code";
const VERIFY_EMAIL_PATH: &str = "/api/auth/verify-email";
const REGISTER_PATH: &str = "/api/auth/register";

/// Server default for `verification_code_expire_minutes`.
pub const DEFAULT_CODE_EXPIRE_MINUTES: u32 = 30;

fn default_expire_minutes() -> u32 {
    DEFAULT_CODE_EXPIRE_MINUTES
}

fn default_true() -> bool {
    true
}

/// Public registration policy published by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSettings {
    #[serde(default = "default_true")]
    pub enable_registration: bool,
    #[serde(default)]
    pub require_email_verification: bool,
    #[serde(default = "default_expire_minutes")]
    pub verification_code_expire_minutes: u32,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            enable_registration: true,
            require_email_verification: false,
            verification_code_expire_minutes: DEFAULT_CODE_EXPIRE_MINUTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendCodeResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub expire_minutes: Option<u32>,
}

impl SendCodeResponse {
    /// Fold a `success: false` answer into the error path.
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::rejected(self.message))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyEmailResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl VerifyEmailResponse {
    pub fn into_result(self) -> Result<Self, ApiError> {
        if self.success {
            Ok(self)
        } else {
            Err(ApiError::rejected(self.message))
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

// Passwords must never reach the logs.
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Account endpoints reachable without credentials.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn registration_settings(&self) -> Result<RegistrationSettings, ApiError>;
    async fn send_verification_code(&self, request: &SendCodeRequest) -> Result<SendCodeResponse, ApiError>;
    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<VerifyEmailResponse, ApiError>;
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError>;
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn registration_settings(&self) -> Result<RegistrationSettings, ApiError> {
        self.get_json(REGISTRATION_SETTINGS_PATH, &[]).await
    }

    async fn send_verification_code(&self, request: &SendCodeRequest) -> Result<SendCodeResponse, ApiError> {
        log::info!("Requesting verification code for {}", request.email);
        self.send_json(Method::POST, SEND_CODE_PATH, request).await
    }

    async fn verify_email(&self, request: &VerifyEmailRequest) -> Result<VerifyEmailResponse, ApiError> {
        self.send_json(Method::POST, VERIFY_EMAIL_PATH, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        log::info!("Registering account {} ({})", request.username, request.email);
        self.send_json(Method::POST, REGISTER_PATH, request).await
    }
}
