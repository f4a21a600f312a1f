//! Provider endpoint configuration (admin API).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};

/// Wire format spoken by an upstream endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiFormat {
    #[default]
    Claude,
    ClaudeCli,
    Openai,
    OpenaiCli,
    Gemini,
    GeminiCli,
}

impl ApiFormat {
    pub const ALL: [ApiFormat; 6] = [
        ApiFormat::Claude,
        ApiFormat::ClaudeCli,
        ApiFormat::Openai,
        ApiFormat::OpenaiCli,
        ApiFormat::Gemini,
        ApiFormat::GeminiCli,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiFormat::Claude => "CLAUDE",
            ApiFormat::ClaudeCli => "CLAUDE_CLI",
            ApiFormat::Openai => "OPENAI",
            ApiFormat::OpenaiCli => "OPENAI_CLI",
            ApiFormat::Gemini => "GEMINI",
            ApiFormat::GeminiCli => "GEMINI_CLI",
        }
    }

    /// Next format in display order, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Previous format in display order, wrapping around.
    pub fn previous(self) -> Self {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for ApiFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outbound proxy for an endpoint.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Payload for creating or updating an endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub api_format: ApiFormat,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_path: Option<String>,
    /// Request timeout in seconds.
    pub timeout: u32,
    pub max_retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
    /// Requests per minute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u32>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

/// Endpoint record returned by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub id: String,
    pub provider_id: String,
    #[serde(flatten)]
    pub config: EndpointConfig,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait EndpointApi: Send + Sync {
    async fn list_endpoints(&self, provider_id: &str) -> Result<Vec<ProviderEndpoint>, ApiError>;
    async fn create_endpoint(&self, provider_id: &str, config: &EndpointConfig) -> Result<ProviderEndpoint, ApiError>;
    async fn update_endpoint(&self, endpoint_id: &str, config: &EndpointConfig) -> Result<ProviderEndpoint, ApiError>;
}

fn provider_endpoints_path(provider_id: &str) -> String {
    format!("/api/admin/endpoints/providers/{provider_id}/endpoints")
}

fn endpoint_path(endpoint_id: &str) -> String {
    format!("/api/admin/endpoints/{endpoint_id}")
}

#[async_trait]
impl EndpointApi for ApiClient {
    async fn list_endpoints(&self, provider_id: &str) -> Result<Vec<ProviderEndpoint>, ApiError> {
        self.get_json(&provider_endpoints_path(provider_id), &[]).await
    }

    async fn create_endpoint(&self, provider_id: &str, config: &EndpointConfig) -> Result<ProviderEndpoint, ApiError> {
        log::info!("Creating {} endpoint for provider {provider_id}", config.api_format);
        self.send_json(Method::POST, &provider_endpoints_path(provider_id), config)
            .await
    }

    async fn update_endpoint(&self, endpoint_id: &str, config: &EndpointConfig) -> Result<ProviderEndpoint, ApiError> {
        log::info!("Updating endpoint {endpoint_id}");
        self.send_json(Method::PUT, &endpoint_path(endpoint_id), config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_format_uses_upper_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&ApiFormat::OpenaiCli).unwrap(), "\"OPENAI_CLI\"");
        let parsed: ApiFormat = serde_json::from_str("\"GEMINI\"").unwrap();
        assert_eq!(parsed, ApiFormat::Gemini);
    }

    #[test]
    fn api_format_cycles_in_both_directions() {
        assert_eq!(ApiFormat::GeminiCli.next(), ApiFormat::Claude);
        assert_eq!(ApiFormat::Claude.previous(), ApiFormat::GeminiCli);
        assert_eq!(ApiFormat::Claude.next().previous(), ApiFormat::Claude);
    }

    #[test]
    fn optional_fields_are_omitted_from_payload() {
        let config = EndpointConfig {
            api_format: ApiFormat::Claude,
            base_url: "https://api.anthropic.com".to_string(),
            custom_path: None,
            timeout: 300,
            max_retries: 2,
            max_concurrent: None,
            rate_limit: None,
            is_active: true,
            proxy: None,
        };
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("custom_path").is_none());
        assert!(value.get("proxy").is_none());
        assert_eq!(value["api_format"], "CLAUDE");
    }

    #[test]
    fn endpoint_record_flattens_config() {
        let body = r#"{
            "id": "ep-1",
            "provider_id": "prov-1",
            "api_format": "OPENAI",
            "base_url": "https://api.openai.com",
            "timeout": 120,
            "max_retries": 3,
            "is_active": false,
            "created_at": "2026-01-07T11:20:12Z"
        }"#;
        let endpoint: ProviderEndpoint = serde_json::from_str(body).unwrap();
        assert_eq!(endpoint.config.api_format, ApiFormat::Openai);
        assert_eq!(endpoint.config.max_retries, 3);
        assert!(!endpoint.config.is_active);
        assert!(endpoint.created_at.is_some());
    }
}
