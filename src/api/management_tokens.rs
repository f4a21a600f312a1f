//! Management token administration.
//!
//! The same resource is exposed twice: under `/api/me` for a user's own
//! tokens and under `/api/admin` for operators. [`TokenScope`] selects the
//! prefix. Plaintext tokens are only ever returned by `create` and
//! `regenerate`; everything else carries the non-secret `token_prefix`.

use std::net::IpAddr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};

pub const MAX_TOKEN_NAME_CHARS: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenScope {
    #[default]
    Me,
    Admin,
}

impl TokenScope {
    pub fn base_path(self) -> &'static str {
        match self {
            TokenScope::Me => "/api/me/management-tokens",
            TokenScope::Admin => "/api/admin/management-tokens",
        }
    }

    fn item_path(self, token_id: &str) -> String {
        format!("{}/{}", self.base_path(), token_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementToken {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub token_prefix: Option<String>,
    #[serde(default)]
    pub allowed_ips: Option<Vec<String>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used_ip: Option<String>,
    #[serde(default)]
    pub usage_count: u64,
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ManagementToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Masked form shown in lists, e.g. `mt_ab12…`.
    pub fn masked(&self) -> String {
        match &self.token_prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix}…"),
            _ => "…".to_string(),
        }
    }
}

/// Per-user token allowance reported alongside a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenQuota {
    pub used: u32,
    pub max: u32,
}

impl TokenQuota {
    pub fn remaining(&self) -> u32 {
        self.max.saturating_sub(self.used)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub items: Vec<ManagementToken>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub quota: Option<TokenQuota>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenFilters {
    pub skip: u32,
    pub limit: u32,
    pub is_active: Option<bool>,
    /// Only honoured by the admin scope.
    pub user_id: Option<String>,
}

impl Default for TokenFilters {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 50,
            is_active: None,
            user_id: None,
        }
    }
}

impl TokenFilters {
    fn to_query(&self, scope: TokenScope) -> Vec<(&'static str, String)> {
        let mut query = vec![("skip", self.skip.to_string()), ("limit", self.limit.to_string())];
        if let Some(is_active) = self.is_active {
            query.push(("is_active", is_active.to_string()));
        }
        if scope == TokenScope::Admin {
            if let Some(user_id) = &self.user_id {
                query.push(("user_id", user_id.clone()));
            }
        }
        query
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTokenRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// A token together with its plaintext secret, returned once.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub data: ManagementToken,
    #[serde(default)]
    pub message: Option<String>,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("token", &"<redacted>")
            .field("data", &self.data)
            .field("message", &self.message)
            .finish()
    }
}

/// Local validation failures for token payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenValidationError {
    #[error("Token name is required")]
    EmptyName,

    #[error("Token name must be at most {} characters", MAX_TOKEN_NAME_CHARS)]
    NameTooLong,

    #[error("IP allow-list cannot be empty; omit it to allow any address")]
    EmptyIpList,

    #[error("Invalid IP address or CIDR: {0}")]
    InvalidIp(String),

    #[error("Expiry must be in the future")]
    ExpiryInPast,
}

/// Validate an allow-list entry: a bare IPv4/IPv6 address or a CIDR block.
pub fn validate_ip_entry(entry: &str) -> Result<(), TokenValidationError> {
    let invalid = || TokenValidationError::InvalidIp(entry.to_string());
    let (address, prefix) = match entry.split_once('/') {
        Some((address, prefix)) => (address, Some(prefix)),
        None => (entry, None),
    };

    let ip: IpAddr = address.trim().parse().map_err(|_| invalid())?;
    if let Some(prefix) = prefix {
        let bits: u8 = prefix.trim().parse().map_err(|_| invalid())?;
        let max_bits = if ip.is_ipv4() { 32 } else { 128 };
        if bits > max_bits {
            return Err(invalid());
        }
    }
    Ok(())
}

pub fn validate_ip_list(ips: &[String]) -> Result<(), TokenValidationError> {
    if ips.is_empty() {
        return Err(TokenValidationError::EmptyIpList);
    }
    ips.iter().try_for_each(|ip| validate_ip_entry(ip))
}

fn validate_name(name: &str) -> Result<(), TokenValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TokenValidationError::EmptyName);
    }
    if name.chars().count() > MAX_TOKEN_NAME_CHARS {
        return Err(TokenValidationError::NameTooLong);
    }
    Ok(())
}

impl CreateTokenRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
        validate_name(&self.name)?;
        if let Some(ips) = &self.allowed_ips {
            validate_ip_list(ips)?;
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(TokenValidationError::ExpiryInPast);
        }
        Ok(())
    }
}

impl UpdateTokenRequest {
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(ips) = &self.allowed_ips {
            validate_ip_list(ips)?;
        }
        if self.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(TokenValidationError::ExpiryInPast);
        }
        Ok(())
    }
}

#[async_trait]
pub trait ManagementTokenApi: Send + Sync {
    async fn list_tokens(&self, scope: TokenScope, filters: &TokenFilters) -> Result<TokenList, ApiError>;
    async fn create_token(&self, scope: TokenScope, request: &CreateTokenRequest) -> Result<IssuedToken, ApiError>;
    async fn get_token(&self, scope: TokenScope, token_id: &str) -> Result<ManagementToken, ApiError>;
    async fn update_token(
        &self,
        scope: TokenScope,
        token_id: &str,
        request: &UpdateTokenRequest,
    ) -> Result<ManagementToken, ApiError>;
    async fn delete_token(&self, scope: TokenScope, token_id: &str) -> Result<(), ApiError>;
    async fn toggle_token(&self, scope: TokenScope, token_id: &str) -> Result<ManagementToken, ApiError>;
    async fn regenerate_token(&self, scope: TokenScope, token_id: &str) -> Result<IssuedToken, ApiError>;
}

#[async_trait]
impl ManagementTokenApi for ApiClient {
    async fn list_tokens(&self, scope: TokenScope, filters: &TokenFilters) -> Result<TokenList, ApiError> {
        self.get_json(scope.base_path(), &filters.to_query(scope)).await
    }

    async fn create_token(&self, scope: TokenScope, request: &CreateTokenRequest) -> Result<IssuedToken, ApiError> {
        log::info!("Creating management token '{}'", request.name);
        self.send_json(Method::POST, scope.base_path(), request).await
    }

    async fn get_token(&self, scope: TokenScope, token_id: &str) -> Result<ManagementToken, ApiError> {
        self.get_json(&scope.item_path(token_id), &[]).await
    }

    async fn update_token(
        &self,
        scope: TokenScope,
        token_id: &str,
        request: &UpdateTokenRequest,
    ) -> Result<ManagementToken, ApiError> {
        self.send_json(Method::PUT, &scope.item_path(token_id), request).await
    }

    async fn delete_token(&self, scope: TokenScope, token_id: &str) -> Result<(), ApiError> {
        log::info!("Deleting management token {token_id}");
        self.send_empty(Method::DELETE, &scope.item_path(token_id)).await
    }

    async fn toggle_token(&self, scope: TokenScope, token_id: &str) -> Result<ManagementToken, ApiError> {
        self.send_bodyless(Method::PATCH, &format!("{}/status", scope.item_path(token_id)))
            .await
    }

    async fn regenerate_token(&self, scope: TokenScope, token_id: &str) -> Result<IssuedToken, ApiError> {
        log::info!("Regenerating management token {token_id}");
        self.send_bodyless(Method::POST, &format!("{}/regenerate", scope.item_path(token_id)))
            .await
    }
}
