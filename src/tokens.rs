//! Draft of a new management token, as typed into the creation dialog.

use chrono::{DateTime, NaiveDate, Utc};

use crate::api::management_tokens::TokenValidationError;
use crate::api::CreateTokenRequest;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenDraftError {
    #[error(transparent)]
    Invalid(#[from] TokenValidationError),

    #[error("Expiry must be a date like 2026-12-31")]
    InvalidExpiry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDraftField {
    Name,
    Description,
    AllowedIps,
    ExpiresOn,
}

impl TokenDraftField {
    pub const ALL: [TokenDraftField; 4] = [
        TokenDraftField::Name,
        TokenDraftField::Description,
        TokenDraftField::AllowedIps,
        TokenDraftField::ExpiresOn,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TokenDraftField::Name => "Name",
            TokenDraftField::Description => "Description",
            TokenDraftField::AllowedIps => "Allowed IPs (comma separated, blank = any)",
            TokenDraftField::ExpiresOn => "Expires on (YYYY-MM-DD, blank = never)",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenDraft {
    pub name: String,
    pub description: String,
    pub allowed_ips: String,
    pub expires_on: String,
}

impl TokenDraft {
    pub fn field_mut(&mut self, field: TokenDraftField) -> &mut String {
        match field {
            TokenDraftField::Name => &mut self.name,
            TokenDraftField::Description => &mut self.description,
            TokenDraftField::AllowedIps => &mut self.allowed_ips,
            TokenDraftField::ExpiresOn => &mut self.expires_on,
        }
    }

    pub fn field(&self, field: TokenDraftField) -> &str {
        match field {
            TokenDraftField::Name => &self.name,
            TokenDraftField::Description => &self.description,
            TokenDraftField::AllowedIps => &self.allowed_ips,
            TokenDraftField::ExpiresOn => &self.expires_on,
        }
    }

    /// Build and validate the request. A date expires at the end of that day, UTC.
    pub fn to_request(&self, now: DateTime<Utc>) -> Result<CreateTokenRequest, TokenDraftError> {
        let allowed_ips: Vec<String> = self
            .allowed_ips
            .split([',', ' ', '\n'])
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect();

        let expires_at = match self.expires_on.trim() {
            "" => None,
            raw => {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| TokenDraftError::InvalidExpiry)?;
                let end_of_day = date.and_hms_opt(23, 59, 59).ok_or(TokenDraftError::InvalidExpiry)?;
                Some(end_of_day.and_utc())
            }
        };

        let description = self.description.trim();
        let request = CreateTokenRequest {
            name: self.name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            allowed_ips: (!allowed_ips.is_empty()).then_some(allowed_ips),
            expires_at,
        };
        request.validate(now)?;
        Ok(request)
    }
}
