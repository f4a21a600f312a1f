//! Constants used throughout the application
//!
//! This module centralizes magic strings, UI text, and other constant values
//! to improve maintainability and consistency.

// Defaults
pub const DEFAULT_BASE_URL: &str = "http://localhost:8084";
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "ACCOUNTDESK_ACCESS_TOKEN";

// Configuration limits
pub const REQUEST_TIMEOUT_MAX_SECS: u64 = 120;
pub const CODE_LENGTH_MIN: usize = 4;
pub const CODE_LENGTH_MAX: usize = 10;
pub const RESEND_COOLDOWN_MAX_SECS: u32 = 600;

// Registration messages
pub const SUCCESS_CODE_SENT: &str = "Verification code sent";
pub const SUCCESS_EMAIL_VERIFIED: &str = "Email verified";
pub const SUCCESS_REGISTERED: &str = "Registration successful";
pub const ERROR_SEND_CODE_FAILED: &str = "Failed to send verification code";
pub const ERROR_VERIFY_FAILED: &str = "Verification failed, please check the code";
pub const ERROR_REGISTER_FAILED: &str = "Registration failed, please try again later";
pub const INFO_REGISTRATION_DISABLED: &str = "Registration is currently disabled";

// Endpoint messages
pub const SUCCESS_ENDPOINT_CREATED: &str = "✅ Endpoint created";
pub const SUCCESS_ENDPOINT_UPDATED: &str = "✅ Endpoint updated";
pub const ERROR_ENDPOINT_SAVE_FAILED: &str = "❌ Failed to save endpoint";
pub const ERROR_ENDPOINTS_LOAD_FAILED: &str = "❌ Failed to load endpoints";

// Management token messages
pub const SUCCESS_TOKEN_CREATED: &str = "✅ Token created, copy it now";
pub const SUCCESS_TOKEN_DELETED: &str = "✅ Token deleted";
pub const SUCCESS_TOKEN_ENABLED: &str = "✅ Token enabled";
pub const SUCCESS_TOKEN_DISABLED: &str = "✅ Token disabled";
pub const SUCCESS_TOKEN_REGENERATED: &str = "✅ Token regenerated, copy it now";
pub const ERROR_TOKENS_LOAD_FAILED: &str = "❌ Failed to load management tokens";
pub const ERROR_TOKEN_ACTION_FAILED: &str = "❌ Token operation failed";
pub const ERROR_NO_ACCESS_TOKEN: &str = "❌ No access token set, management features are unavailable";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
pub const DIALOG_TITLE_LOGS: &str = "🔍 Logs - Press 'Esc', 'G' or 'q' to close";
pub const DIALOG_TITLE_REGISTRATION: &str = "Create Account";
pub const DIALOG_TITLE_ENDPOINT_CREATE: &str = "New Endpoint";
pub const DIALOG_TITLE_ENDPOINT_EDIT: &str = "Edit Endpoint";
pub const DIALOG_TITLE_CONFIRM_DELETE: &str = "Delete Token";

/// Default notice after a code went out, when the server sends no message
pub fn code_sent_message(expire_minutes: u32) -> String {
    format!("{SUCCESS_CODE_SENT}, valid for {expire_minutes} minutes")
}

/// Seconds a toast stays on the status bar
pub const NOTICE_TTL_SECS: u64 = 4;
