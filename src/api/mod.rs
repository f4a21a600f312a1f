//! Thin JSON-over-HTTP wrappers around the backend API.
//!
//! [`ApiClient`] owns the transport concerns (base URL, timeout, bearer
//! token, error mapping). Each feature area exposes an `async_trait` so the
//! interaction models can be driven by a fake in tests:
//!
//! * [`auth`] - registration settings, verification codes, registration
//! * [`endpoints`] - provider endpoint configuration
//! * [`management_tokens`] - management token administration

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::ApiConfig;

pub mod auth;
pub mod endpoints;
pub mod error;
pub mod management_tokens;

pub use auth::{
    AuthApi, RegisterRequest, RegisterResponse, RegistrationSettings, SendCodeRequest, SendCodeResponse,
    VerifyEmailRequest, VerifyEmailResponse,
};
pub use endpoints::{ApiFormat, EndpointApi, EndpointConfig, ProviderEndpoint, ProxyConfig};
pub use error::{extract_detail, ApiError};
pub use management_tokens::{
    CreateTokenRequest, IssuedToken, ManagementToken, ManagementTokenApi, TokenFilters, TokenList, TokenQuota,
    TokenScope, UpdateTokenRequest,
};

/// HTTP client bound to one backend.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ApiClient {
    /// Create a client without credentials (enough for the public auth endpoints).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("accountdesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to initialize HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            access_token: None,
        })
    }

    /// Create a client from configuration, picking up the access token from
    /// the configured environment variable when it is set.
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Self::new(config.base_url.clone(), Duration::from_secs(config.timeout_secs))?;
        Ok(match config.access_token() {
            Some(token) => client.with_access_token(token),
            None => client,
        })
    }

    /// Attach a bearer token used for the self-service and admin endpoints.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Builds a URL from the configured base URL and the provided path.
    pub fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    pub(crate) async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = serde_json::to_vec(body)
            .map_err(|err| ApiError::Serialization(format!("Failed to encode request: {err}")))?;
        let response = self
            .request(method, path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(map_request_error)?;
        handle_json_response(response).await
    }

    /// Sends a request without a body and parses a JSON response.
    pub(crate) async fn send_bodyless<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, ApiError> {
        let response = self.request(method, path).send().await.map_err(map_request_error)?;
        handle_json_response(response).await
    }

    /// Sends a request without a body and ignores the response body.
    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        let response = self.request(method, path).send().await.map_err(map_request_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(http_error(response).await)
        }
    }
}

/// Builds a URL from an explicit base URL and the provided path.
pub fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into `ApiError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        ApiError::Network(format!("Unable to reach the server: {err}"))
    }
}

async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

async fn http_error(response: Response) -> ApiError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    log::warn!("API request failed with status {status}");
    ApiError::Http {
        status,
        message: extract_detail(&body).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_url_joins_without_duplicate_slashes() {
        assert_eq!(
            build_url_with_base("https://api.example.com/", "/api/auth/register"),
            "https://api.example.com/api/auth/register"
        );
        assert_eq!(
            build_url_with_base(" https://api.example.com ", "api/auth/register"),
            "https://api.example.com/api/auth/register"
        );
        assert_eq!(build_url_with_base("", "/api/auth/register"), "/api/auth/register");
    }

    #[test]
    fn client_attaches_token_from_builder() {
        let client = ApiClient::new("http://localhost:8084", Duration::from_secs(5)).unwrap();
        assert!(!client.has_access_token());
        let client = client.with_access_token("mt_secret");
        assert!(client.has_access_token());
        assert_eq!(client.url("/api/me"), "http://localhost:8084/api/me");
    }
}
