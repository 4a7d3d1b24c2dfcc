//! HTTP client for the Constellation API.
//!
//! ARCHITECTURE
//! ============
//! Every request goes through [`ApiClient::request`], which reads the stored
//! credential, fills in default headers, and normalizes failures into
//! [`ApiError`]. Callers never build headers or parse error bodies themselves.
//!
//! The session store talks to the backend through the [`AuthApi`] trait so it
//! can be exercised without a server.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, http_error};
use super::types::{AuthResponse, HealthResponse, LoginRequest, ProfileResponse, RegisterRequest};
use crate::config::ClientConfig;
use crate::token_store::TokenStore;

const JSON_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// AUTH SEAM
// =============================================================================

/// Backend auth endpoints consumed by the session store.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`.
    async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ApiError>;

    /// `POST /auth/register`.
    async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError>;

    /// `GET /auth/me` with the stored credential.
    async fn me(&self) -> Result<ProfileResponse, ApiError>;
}

// =============================================================================
// REQUEST OPTIONS
// =============================================================================

/// Per-call overrides. Headers set here win over the client defaults.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { method: Method::GET, headers: HeaderMap::new(), body: None }
    }
}

impl RequestOptions {
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// A `method` request carrying `body` serialized as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(method: Method, body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(Self { method, headers: HeaderMap::new(), body: Some(bytes) })
    }

    #[must_use]
    pub fn with_header(mut self, name: reqwest::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Merge client defaults into caller headers without overriding either
/// `Content-Type` or `Authorization` if the caller already set them.
pub(crate) fn build_headers(caller: &HeaderMap, token: Option<&str>) -> Result<HeaderMap, ApiError> {
    let mut headers = caller.clone();
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    }
    if let Some(token) = token {
        if !headers.contains_key(AUTHORIZATION) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::InvalidHeader(format!("authorization: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
    }
    Ok(headers)
}

pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path.starts_with('/') { format!("{base}{path}") } else { format!("{base}/{path}") }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// Build a client against `config.api_base_url` reading credentials from `tokens`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.api_base_url.clone(), tokens })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a request to `path` and decode the success body as `T`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] for non-2xx responses.
    /// - [`ApiError::Network`] when no response arrives.
    /// - [`ApiError::Decode`] when a 2xx body is not valid JSON for `T`.
    pub async fn request<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T, ApiError> {
        let token = self.tokens.get();
        let headers = build_headers(&options.headers, token.as_deref())?;
        let url = join_url(&self.base_url, path);
        tracing::debug!(method = %options.method, %path, authenticated = token.is_some(), "api request");

        let mut request = self.http.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            let content_type = match response.headers().get(CONTENT_TYPE).map(HeaderValue::to_str) {
                Some(Ok(value)) => value.to_owned(),
                _ => String::new(),
            };
            let status_text = status.canonical_reason().unwrap_or_default();
            let body = response.text().await.unwrap_or_default();
            let err = http_error(status.as_u16(), status_text, &content_type, &body);
            tracing::debug!(%path, status = status.as_u16(), error = %err, "api request rejected");
            return Err(err);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// `GET /healthz`.
    ///
    /// # Errors
    ///
    /// Returns any [`ApiError`] from the underlying request.
    pub async fn health(&self) -> Result<HealthResponse, ApiError> {
        self.request("/healthz", RequestOptions::get()).await
    }
}

#[async_trait::async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, payload: &LoginRequest) -> Result<AuthResponse, ApiError> {
        self.request("/auth/login", RequestOptions::json(Method::POST, payload)?)
            .await
    }

    async fn register(&self, payload: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        self.request("/auth/register", RequestOptions::json(Method::POST, payload)?)
            .await
    }

    async fn me(&self) -> Result<ProfileResponse, ApiError> {
        self.request("/auth/me", RequestOptions::get()).await
    }
}
