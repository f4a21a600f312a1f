//! Headless form behind the endpoint configuration dialog.
//!
//! Numeric fields are kept as text while editing and parsed on submit, so a
//! half-typed value never has to be representable.

use crate::api::{ApiFormat, EndpointConfig, ProviderEndpoint, ProxyConfig};

pub const DEFAULT_ENDPOINT_TIMEOUT_SECS: u32 = 300;
pub const MAX_ENDPOINT_TIMEOUT_SECS: u32 = 600;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointFormError {
    #[error("Base URL is required")]
    BaseUrlRequired,

    #[error("Base URL must be an http or https URL")]
    InvalidBaseUrl,

    #[error("Custom path must start with '/'")]
    InvalidCustomPath,

    #[error("{field} must be a whole number")]
    NotANumber { field: &'static str },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: u32,
        max: u32,
    },

    #[error("Proxy URL is required when the proxy is enabled")]
    ProxyUrlRequired,

    #[error("Proxy URL must use http, https or socks5")]
    InvalidProxyUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointField {
    ApiFormat,
    BaseUrl,
    CustomPath,
    Timeout,
    MaxRetries,
    MaxConcurrent,
    RateLimit,
    IsActive,
    ProxyEnabled,
    ProxyUrl,
    ProxyUsername,
    ProxyPassword,
}

impl EndpointField {
    pub const ALL: [EndpointField; 12] = [
        EndpointField::ApiFormat,
        EndpointField::BaseUrl,
        EndpointField::CustomPath,
        EndpointField::Timeout,
        EndpointField::MaxRetries,
        EndpointField::MaxConcurrent,
        EndpointField::RateLimit,
        EndpointField::IsActive,
        EndpointField::ProxyEnabled,
        EndpointField::ProxyUrl,
        EndpointField::ProxyUsername,
        EndpointField::ProxyPassword,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EndpointField::ApiFormat => "API format",
            EndpointField::BaseUrl => "Base URL",
            EndpointField::CustomPath => "Custom path",
            EndpointField::Timeout => "Timeout (s)",
            EndpointField::MaxRetries => "Max retries",
            EndpointField::MaxConcurrent => "Max concurrent",
            EndpointField::RateLimit => "Rate limit (rpm)",
            EndpointField::IsActive => "Active",
            EndpointField::ProxyEnabled => "Proxy enabled",
            EndpointField::ProxyUrl => "Proxy URL",
            EndpointField::ProxyUsername => "Proxy username",
            EndpointField::ProxyPassword => "Proxy password",
        }
    }

    /// Fields changed with space / arrows instead of typing.
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            EndpointField::ApiFormat | EndpointField::IsActive | EndpointField::ProxyEnabled
        )
    }

    fn position(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Which request the form will produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointTarget {
    Create { provider_id: String },
    Edit { endpoint_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointSubmission {
    Create { provider_id: String, config: EndpointConfig },
    Update { endpoint_id: String, config: EndpointConfig },
}

#[derive(Clone, PartialEq, Eq)]
pub struct EndpointForm {
    target: EndpointTarget,
    focused: EndpointField,
    pub api_format: ApiFormat,
    pub base_url: String,
    pub custom_path: String,
    pub timeout: String,
    pub max_retries: String,
    pub max_concurrent: String,
    pub rate_limit: String,
    pub is_active: bool,
    pub proxy_enabled: bool,
    pub proxy_url: String,
    pub proxy_username: String,
    pub proxy_password: String,
}

impl std::fmt::Debug for EndpointForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointForm")
            .field("target", &self.target)
            .field("api_format", &self.api_format)
            .field("base_url", &self.base_url)
            .field("proxy_enabled", &self.proxy_enabled)
            .finish_non_exhaustive()
    }
}

impl EndpointForm {
    /// Blank form for a new endpoint under `provider_id`.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            target: EndpointTarget::Create {
                provider_id: provider_id.into(),
            },
            focused: EndpointField::ApiFormat,
            api_format: ApiFormat::default(),
            base_url: String::new(),
            custom_path: String::new(),
            timeout: DEFAULT_ENDPOINT_TIMEOUT_SECS.to_string(),
            max_retries: DEFAULT_MAX_RETRIES.to_string(),
            max_concurrent: String::new(),
            rate_limit: String::new(),
            is_active: true,
            proxy_enabled: false,
            proxy_url: String::new(),
            proxy_username: String::new(),
            proxy_password: String::new(),
        }
    }

    /// Form seeded from an existing record.
    pub fn edit(endpoint: &ProviderEndpoint) -> Self {
        let config = &endpoint.config;
        let proxy = config.proxy.as_ref();
        Self {
            target: EndpointTarget::Edit {
                endpoint_id: endpoint.id.clone(),
            },
            focused: EndpointField::ApiFormat,
            api_format: config.api_format,
            base_url: config.base_url.clone(),
            custom_path: config.custom_path.clone().unwrap_or_default(),
            timeout: config.timeout.to_string(),
            max_retries: config.max_retries.to_string(),
            max_concurrent: config.max_concurrent.map(|n| n.to_string()).unwrap_or_default(),
            rate_limit: config.rate_limit.map(|n| n.to_string()).unwrap_or_default(),
            is_active: config.is_active,
            proxy_enabled: proxy.map(|p| p.enabled).unwrap_or(false),
            proxy_url: proxy.map(|p| p.url.clone()).unwrap_or_default(),
            proxy_username: proxy.and_then(|p| p.username.clone()).unwrap_or_default(),
            proxy_password: proxy.and_then(|p| p.password.clone()).unwrap_or_default(),
        }
    }

    pub fn target(&self) -> &EndpointTarget {
        &self.target
    }

    pub fn is_edit(&self) -> bool {
        matches!(self.target, EndpointTarget::Edit { .. })
    }

    pub fn focused(&self) -> EndpointField {
        self.focused
    }

    pub fn focus_next(&mut self) {
        let index = self.focused.position();
        self.focused = EndpointField::ALL[(index + 1) % EndpointField::ALL.len()];
    }

    pub fn focus_previous(&mut self) {
        let len = EndpointField::ALL.len();
        let index = self.focused.position();
        self.focused = EndpointField::ALL[(index + len - 1) % len];
    }

    /// Text buffer behind a field, `None` for choice fields.
    pub fn text(&self, field: EndpointField) -> Option<&str> {
        let value = match field {
            EndpointField::BaseUrl => &self.base_url,
            EndpointField::CustomPath => &self.custom_path,
            EndpointField::Timeout => &self.timeout,
            EndpointField::MaxRetries => &self.max_retries,
            EndpointField::MaxConcurrent => &self.max_concurrent,
            EndpointField::RateLimit => &self.rate_limit,
            EndpointField::ProxyUrl => &self.proxy_url,
            EndpointField::ProxyUsername => &self.proxy_username,
            EndpointField::ProxyPassword => &self.proxy_password,
            EndpointField::ApiFormat | EndpointField::IsActive | EndpointField::ProxyEnabled => return None,
        };
        Some(value)
    }

    fn text_mut(&mut self, field: EndpointField) -> Option<&mut String> {
        match field {
            EndpointField::BaseUrl => Some(&mut self.base_url),
            EndpointField::CustomPath => Some(&mut self.custom_path),
            EndpointField::Timeout => Some(&mut self.timeout),
            EndpointField::MaxRetries => Some(&mut self.max_retries),
            EndpointField::MaxConcurrent => Some(&mut self.max_concurrent),
            EndpointField::RateLimit => Some(&mut self.rate_limit),
            EndpointField::ProxyUrl => Some(&mut self.proxy_url),
            EndpointField::ProxyUsername => Some(&mut self.proxy_username),
            EndpointField::ProxyPassword => Some(&mut self.proxy_password),
            EndpointField::ApiFormat | EndpointField::IsActive | EndpointField::ProxyEnabled => None,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        let field = self.focused;
        if let Some(buffer) = self.text_mut(field) {
            buffer.push(c);
        } else if c == ' ' {
            self.cycle_choice(true);
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focused;
        if let Some(buffer) = self.text_mut(field) {
            buffer.pop();
        }
    }

    /// Flip a toggle or step the API format. No-op on text fields.
    pub fn cycle_choice(&mut self, forward: bool) {
        match self.focused {
            EndpointField::ApiFormat => {
                self.api_format = if forward {
                    self.api_format.next()
                } else {
                    self.api_format.previous()
                };
            }
            EndpointField::IsActive => self.is_active = !self.is_active,
            EndpointField::ProxyEnabled => self.proxy_enabled = !self.proxy_enabled,
            _ => {}
        }
    }

    /// Parse and check every field, producing the payload.
    pub fn to_config(&self) -> Result<EndpointConfig, EndpointFormError> {
        let base_url = self.base_url.trim();
        if base_url.is_empty() {
            return Err(EndpointFormError::BaseUrlRequired);
        }
        if !has_scheme(base_url, &["http", "https"]) {
            return Err(EndpointFormError::InvalidBaseUrl);
        }

        let custom_path = self.custom_path.trim();
        let custom_path = if custom_path.is_empty() {
            None
        } else if custom_path.starts_with('/') {
            Some(custom_path.to_string())
        } else {
            return Err(EndpointFormError::InvalidCustomPath);
        };

        let timeout = parse_in_range(&self.timeout, "Timeout", 1, MAX_ENDPOINT_TIMEOUT_SECS)?
            .unwrap_or(DEFAULT_ENDPOINT_TIMEOUT_SECS);
        let max_retries =
            parse_in_range(&self.max_retries, "Max retries", 0, MAX_RETRIES_LIMIT)?.unwrap_or(DEFAULT_MAX_RETRIES);
        let max_concurrent = parse_in_range(&self.max_concurrent, "Max concurrent", 1, u32::MAX)?;
        let rate_limit = parse_in_range(&self.rate_limit, "Rate limit", 1, u32::MAX)?;

        Ok(EndpointConfig {
            api_format: self.api_format,
            base_url: base_url.trim_end_matches('/').to_string(),
            custom_path,
            timeout,
            max_retries,
            max_concurrent,
            rate_limit,
            is_active: self.is_active,
            proxy: self.proxy()?,
        })
    }

    fn proxy(&self) -> Result<Option<ProxyConfig>, EndpointFormError> {
        let url = self.proxy_url.trim();
        if url.is_empty() {
            return if self.proxy_enabled {
                Err(EndpointFormError::ProxyUrlRequired)
            } else {
                Ok(None)
            };
        }
        if !has_scheme(url, &["http", "https", "socks5"]) {
            return Err(EndpointFormError::InvalidProxyUrl);
        }

        Ok(Some(ProxyConfig {
            url: url.to_string(),
            username: non_empty(&self.proxy_username),
            password: non_empty(&self.proxy_password),
            enabled: self.proxy_enabled,
        }))
    }

    pub fn submission(&self) -> Result<EndpointSubmission, EndpointFormError> {
        let config = self.to_config()?;
        Ok(match &self.target {
            EndpointTarget::Create { provider_id } => EndpointSubmission::Create {
                provider_id: provider_id.clone(),
                config,
            },
            EndpointTarget::Edit { endpoint_id } => EndpointSubmission::Update {
                endpoint_id: endpoint_id.clone(),
                config,
            },
        })
    }
}

fn has_scheme(raw: &str, schemes: &[&str]) -> bool {
    match url::Url::parse(raw) {
        Ok(url) => schemes.contains(&url.scheme()) && url.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

fn parse_in_range(raw: &str, field: &'static str, min: u32, max: u32) -> Result<Option<u32>, EndpointFormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: u32 = raw.parse().map_err(|_| EndpointFormError::NotANumber { field })?;
    if value < min || value > max {
        return Err(EndpointFormError::OutOfRange { field, min, max });
    }
    Ok(Some(value))
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
