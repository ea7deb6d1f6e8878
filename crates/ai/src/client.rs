//! REST client for the banner backend.
//!
//! Wraps the AI endpoints (text optimization, product image generation),
//! banner export and template listing using [`reqwest`].

use std::time::Duration;

use banner_core::ai::{AiImageRequest, AiImageResponse, AiService, AiTextRequest, AiTextResponse};
use banner_core::config::BannerConfig;
use banner_core::error::CoreError;
use banner_core::export::{ExportRequest, ExportResult, ExportService};
use serde::Deserialize;

use crate::config::AiClientConfig;

/// HTTP client for one backend deployment.
#[derive(Debug, Clone)]
pub struct BannerApiClient {
    client: reqwest::Client,
    api_url: String,
}

/// Response returned by `POST /templates`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTemplateResponse {
    pub id: String,
    pub success: bool,
}

/// Errors from the backend REST layer.
#[derive(Debug, thiserror::Error)]
pub enum AiClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("API error ({status}): {body}")]
    Api {
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<AiClientError> for CoreError {
    fn from(err: AiClientError) -> Self {
        match err {
            AiClientError::Config(msg) => CoreError::Internal(msg),
            other => CoreError::Service(other.to_string()),
        }
    }
}

impl BannerApiClient {
    /// Create a client for `api_url` (e.g. `http://localhost:3000/api`).
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
        }
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    /// Create a client with the configured base URL and request timeout.
    pub fn from_config(config: &AiClientConfig) -> Result<Self, AiClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.api_base_url.clone()))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// `POST /ai/optimize-text`.
    pub async fn optimize_text(&self, request: &AiTextRequest) -> Result<AiTextResponse, AiClientError> {
        let response = self
            .client
            .post(format!("{}/ai/optimize-text", self.api_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `POST /ai/generate-image`.
    pub async fn generate_image(&self, request: &AiImageRequest) -> Result<AiImageResponse, AiClientError> {
        let response = self
            .client
            .post(format!("{}/ai/generate-image", self.api_url))
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `POST /banners/{id}/export?format=...` with the render tree as body.
    pub async fn export_banner(&self, request: &ExportRequest) -> Result<ExportResult, AiClientError> {
        let response = self
            .client
            .post(format!("{}/banners/{}/export", self.api_url, request.banner_id))
            .query(&[("format", request.format.as_str())])
            .json(&request.tree)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `GET /templates`.
    pub async fn list_templates(&self) -> Result<Vec<BannerConfig>, AiClientError> {
        let response = self
            .client
            .get(format!("{}/templates", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// `POST /templates`.
    pub async fn create_template(&self, config: &BannerConfig) -> Result<CreateTemplateResponse, AiClientError> {
        let response = self
            .client
            .post(format!("{}/templates", self.api_url))
            .json(config)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Pass 2xx responses through; anything else becomes
    /// [`AiClientError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, AiClientError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(status = status.as_u16(), %body, "Backend request failed");
            return Err(AiClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, AiClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

// ---------------------------------------------------------------------------
// Service impls
// ---------------------------------------------------------------------------

impl AiService for BannerApiClient {
    async fn optimize_text(&self, request: &AiTextRequest) -> Result<AiTextResponse, CoreError> {
        request.validate_request()?;
        Ok(BannerApiClient::optimize_text(self, request).await?)
    }

    async fn generate_image(&self, request: &AiImageRequest) -> Result<AiImageResponse, CoreError> {
        request.validate_request()?;
        Ok(BannerApiClient::generate_image(self, request).await?)
    }
}

impl ExportService for BannerApiClient {
    async fn export(&self, request: &ExportRequest) -> Result<ExportResult, CoreError> {
        if request.banner_id.is_empty() {
            return Err(CoreError::Validation(
                "Banner must be saved before it can be exported".to_string(),
            ));
        }
        Ok(self.export_banner(request).await?)
    }
}
