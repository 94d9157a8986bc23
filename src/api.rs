use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    config::ClientConfig,
    error::{ApiError, Result},
    models::{AnalyticsSnapshot, CreateUrlInput, LoginRequest, ShortUrl, TokenResponse, User},
};

/// The shortener backend as seen by the state machines.
///
/// Every authenticated call takes the current bearer token explicitly; a
/// `None` token is sent without an `Authorization` header and left for the
/// server to reject.
#[async_trait]
pub trait ShortenerApi: Send + Sync {
    /// `GET /api/auth/user`
    async fn current_user(&self, token: Option<&str>) -> Result<User>;

    /// `POST /api/auth/login`
    async fn login(&self, email: &str, password: &str) -> Result<String>;

    /// `GET /api/url`
    async fn list_urls(&self, token: Option<&str>) -> Result<Vec<ShortUrl>>;

    /// `POST /api/url`
    async fn create_url(&self, token: Option<&str>, input: &CreateUrlInput) -> Result<ShortUrl>;

    /// `DELETE /api/url/:id`
    async fn delete_url(&self, token: Option<&str>, id: &str) -> Result<()>;

    /// `GET /api/url/:id/analytics`
    async fn url_analytics(&self, token: Option<&str>, id: &str) -> Result<AnalyticsSnapshot>;
}

// ── Error body shape ───────────────────────────────────────────────────────

/// Error bodies carry a human-readable message under one of these keys.
#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

// ── HTTP implementation ────────────────────────────────────────────────────

/// [`ShortenerApi`] over HTTP/JSON.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    /// Send the request and turn any non-success status into an [`ApiError`].
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::debug!("API request failed: {}", e);
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        // A body that is not JSON just means "no message"
        let message = response
            .json::<ErrorBody>()
            .await
            .unwrap_or_default()
            .into_message();
        tracing::debug!(%status, ?message, "API returned an error status");
        Err(ApiError::from_status(status, message))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ShortenerApi for HttpApi {
    async fn current_user(&self, token: Option<&str>) -> Result<User> {
        let request = self.authorized(self.client.get(self.url("/api/auth/user")), token);
        self.send_json(request).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<String> {
        let request = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&LoginRequest { email, password });
        let body: TokenResponse = self.send_json(request).await?;
        Ok(body.token)
    }

    async fn list_urls(&self, token: Option<&str>) -> Result<Vec<ShortUrl>> {
        let request = self.authorized(self.client.get(self.url("/api/url")), token);
        self.send_json(request).await
    }

    async fn create_url(&self, token: Option<&str>, input: &CreateUrlInput) -> Result<ShortUrl> {
        let request = self.authorized(self.client.post(self.url("/api/url")).json(input), token);
        self.send_json(request).await
    }

    async fn delete_url(&self, token: Option<&str>, id: &str) -> Result<()> {
        let request = self.authorized(
            self.client.delete(self.url(&format!("/api/url/{id}"))),
            token,
        );
        // The acknowledgement body is not used
        self.send(request).await?;
        Ok(())
    }

    async fn url_analytics(&self, token: Option<&str>, id: &str) -> Result<AnalyticsSnapshot> {
        let request = self.authorized(
            self.client.get(self.url(&format!("/api/url/{id}/analytics"))),
            token,
        );
        self.send_json(request).await
    }
}
