//! Live adapter for the Gemini image generation API.

use std::time::Duration;

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ImageError;
use crate::model::resolve_model;
use crate::ports::image_generator::{GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest};
use crate::retry::{retry_transient, RetryPolicy};

/// Default API root; `/models/{id}:generateContent` is appended.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Live Gemini image generator that calls the Google AI API.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiGenerator {
    /// Create a generator whose every HTTP call is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ImageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_API_BASE.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Send requests to `base_url` instead of the public endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the default retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn call_once(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<GeneratedImage, ImageError> {
        let response = self
            .client
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            return Err(ImageError::Api { status: status.as_u16(), message: response_text });
        }

        let parsed: GeminiResponse = serde_json::from_str(&response_text)
            .map_err(|e| ImageError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        extract_image(parsed)
    }
}

impl ImageGenerator for GeminiGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let model_id =
                resolve_model(&request.model).map_err(ImageError::UnknownModel)?;
            let url = format!("{}/models/{model_id}:generateContent", self.base_url);
            let body = serde_json::json!({
                "contents": [{
                    "parts": [{"text": request.prompt}]
                }]
            });

            tracing::info!(model = model_id, prompt_len = request.prompt.len(), "requesting image");
            let image = retry_transient(&self.retry, |_| self.call_once(&url, &body)).await?;
            tracing::info!(
                model = model_id,
                bytes = image.data.len(),
                mime_type = %image.mime_type,
                "image received"
            );
            Ok(image)
        })
    }
}

/// Decode the first inline image of the first candidate.
fn extract_image(response: GeminiResponse) -> Result<GeneratedImage, ImageError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();
    let part_count = parts.len();

    let mut refusal = None;
    for part in parts {
        if let Some(inline) = part.inline_data {
            let data = base64::engine::general_purpose::STANDARD
                .decode(&inline.data)
                .map_err(|e| ImageError::MalformedResponse(format!("Failed to decode base64: {e}")))?;
            return Ok(GeneratedImage { data, mime_type: inline.mime_type });
        }
        if refusal.is_none() {
            refusal = part.text;
        }
    }

    if let Some(text) = refusal {
        let excerpt: String = text.chars().take(200).collect();
        tracing::warn!(reply = %excerpt, "model answered without an image");
    }
    Err(ImageError::NoImageData { parts: part_count })
}

// --- Gemini API response types, shared with the text adapter ---

#[derive(Deserialize)]
pub(super) struct GeminiResponse {
    #[serde(default)]
    pub(super) candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
pub(super) struct GeminiCandidate {
    pub(super) content: Option<GeminiContent>,
}

#[derive(Deserialize)]
pub(super) struct GeminiContent {
    #[serde(default)]
    pub(super) parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct GeminiPart {
    pub(super) text: Option<String>,
    inline_data: Option<GeminiInlineData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}
