use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// The signed-in account as returned by `GET /api/auth/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A shortened link owned by the signed-in user.
///
/// Only ever replaced whole; there is no field-level edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrl {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub original_url: String,
    pub short_code: String,
    #[serde(default)]
    pub clicks: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Clicks recorded on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClicksOnDate {
    pub date: String,
    pub clicks: u64,
}

/// Count aggregated per category value, computed by the server.
///
/// Device rows name their category `device`, browser rows `browser`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakdown {
    #[serde(alias = "device", alias = "browser")]
    pub category: String,
    pub count: u64,
}

/// The most recently fetched analytics for a single link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub url: ShortUrl,
    pub clicks_over_time: Vec<ClicksOnDate>,
    pub device_breakdown: Vec<Breakdown>,
    pub browser_breakdown: Vec<Breakdown>,
}

// ── Request bodies ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `POST /api/url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlInput {
    pub original_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
}

impl CreateUrlInput {
    /// Build from raw form values. Surrounding whitespace is trimmed and a
    /// blank alias means "let the server pick a code".
    pub fn new(
        original_url: impl Into<String>,
        custom_alias: Option<String>,
        expiration_date: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            original_url: original_url.into().trim().to_owned(),
            custom_alias: custom_alias
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            expiration_date,
        }
    }

    /// Reject input the server would refuse anyway, before any request is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.original_url.is_empty() {
            return Err(ApiError::validation("URL must not be empty."));
        }
        if !self.original_url.starts_with("http://") && !self.original_url.starts_with("https://")
        {
            return Err(ApiError::validation(
                "URL must start with http:// or https://",
            ));
        }
        if let Some(alias) = &self.custom_alias {
            if !alias
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(ApiError::validation(
                    "Custom alias may only contain letters, numbers, hyphens, and underscores.",
                ));
            }
        }
        Ok(())
    }
}
