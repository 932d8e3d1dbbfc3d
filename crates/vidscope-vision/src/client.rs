//! Vision-inference HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use vidscope_models::ImagePayload;

use crate::error::{VisionError, VisionResult};
use crate::types::{GenerateRequest, GenerateResponse, InlineData, Part};

/// External vision-inference service.
///
/// Replies are free text; callers parse them leniently.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send one image with a prompt.
    async fn analyze_image(&self, prompt: &str, image: &ImagePayload) -> VisionResult<String>;

    /// Send a text-only prompt.
    async fn generate_text(&self, prompt: &str) -> VisionResult<String>;
}

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Model name, e.g. `gemini-2.0-flash`
    pub model: String,
    /// Service base URL
    pub base_url: String,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl VisionConfig {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    /// Config with defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(VisionError::MissingApiKey)?;

        Ok(Self {
            api_key,
            model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string()),
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string()),
            timeout: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
        })
    }
}

/// Gemini `generateContent` client.
pub struct GeminiVisionClient {
    http: Client,
    config: VisionConfig,
}

impl GeminiVisionClient {
    /// Create a new client.
    pub fn new(config: VisionConfig) -> VisionResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(VisionError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> VisionResult<Self> {
        Self::new(VisionConfig::from_env()?)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn generate(&self, request: &GenerateRequest) -> VisionResult<String> {
        let url = self.endpoint();
        debug!("Sending inference request to {}", url);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::RequestFailed(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response.json().await?;
        body.text().ok_or(VisionError::EmptyResponse)
    }
}

#[async_trait]
impl VisionModel for GeminiVisionClient {
    async fn analyze_image(&self, prompt: &str, image: &ImagePayload) -> VisionResult<String> {
        let request = GenerateRequest::from_parts(vec![
            Part::Text {
                text: prompt.to_string(),
            },
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.base64.clone(),
                },
            },
        ]);
        self.generate(&request).await
    }

    async fn generate_text(&self, prompt: &str) -> VisionResult<String> {
        let request = GenerateRequest::from_parts(vec![Part::Text {
            text: prompt.to_string(),
        }]);
        self.generate(&request).await
    }
}
