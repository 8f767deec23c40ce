//! Live adapter that asks a Gemini text model to analyze and rewrite prompts.

use std::time::Duration;

use reqwest::Client;

use super::gemini::{GeminiResponse, GEMINI_API_BASE};
use crate::classifier::Domain;
use crate::error::ImageError;
use crate::ports::prompt_analyzer::{AnalyzeFuture, PromptAnalysis, PromptAnalyzer};
use crate::retry::{retry_transient, RetryPolicy};

/// Text model used when none is configured.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

const INSTRUCTIONS: &str = r#"You write prompts for image generation models.

Read the image request below and answer with a JSON object only:
{
  "domain": "photography" | "diagrams" | "art" | "products",
  "style": "<subcategory>",
  "confidence": <number between 0.0 and 1.0>,
  "enhanced_prompt": "<the request rewritten with 100-200 words of professional detail>",
  "reasoning": "<one sentence on the domain and style you picked>"
}

Styles per domain:
- photography: portrait, landscape, product, macro, architectural
- diagrams: architecture, flowchart, wireframe, sequence, technical
- art: painting, digital_art, 3d_render, abstract, impressionist, cubist
- products: ecommerce, lifestyle, editorial, advertising

Photography gets camera body, lens, aperture, ISO and lighting. Diagrams get a
reference style such as AWS icons, BPMN or UML plus layout and color coding.
Art gets technique, palette and mood. Products get lighting, background, angle
and styling.

Request: "#;

/// Prompt analyzer backed by a Gemini text model.
pub struct GeminiPromptAnalyzer {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    retry: RetryPolicy,
}

impl GeminiPromptAnalyzer {
    /// Create an analyzer whose every HTTP call is bounded by `timeout`.
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
            model: DEFAULT_TEXT_MODEL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Send requests to `base_url` instead of the public endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use `model` instead of the default text model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
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
        prompt: &str,
    ) -> Result<PromptAnalysis, ImageError> {
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
            .map_err(|e| ImageError::Analysis(format!("Failed to parse response: {e}")))?;
        let reply = first_text(parsed)
            .ok_or_else(|| ImageError::Analysis("No text in response".to_string()))?;

        parse_analysis(&reply, prompt)
    }
}

impl PromptAnalyzer for GeminiPromptAnalyzer {
    fn analyze(&self, prompt: &str) -> AnalyzeFuture<'_> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
            let body = serde_json::json!({
                "contents": [{
                    "parts": [{"text": format!("{INSTRUCTIONS}{prompt:?}")}]
                }],
                "generationConfig": {
                    "temperature": 0.3,
                    "topP": 0.9,
                    "topK": 40,
                    "maxOutputTokens": 2048
                }
            });

            tracing::info!(model = %self.model, prompt_len = prompt.len(), "analyzing prompt");
            let analysis =
                retry_transient(&self.retry, |_| self.call_once(&url, &body, &prompt)).await?;
            tracing::info!(
                domain = %analysis.domain,
                style = %analysis.style,
                confidence = analysis.confidence,
                "prompt analyzed"
            );
            Ok(analysis)
        })
    }
}

fn first_text(response: GeminiResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
}

/// Strip a surrounding Markdown code fence, with or without a `json` tag.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.split("```").next().unwrap_or(rest).trim()
}

/// Decode and validate the model's reply for `prompt`.
fn parse_analysis(reply: &str, prompt: &str) -> Result<PromptAnalysis, ImageError> {
    let mut analysis: PromptAnalysis = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| ImageError::Analysis(format!("Reply is not an analysis object: {e}")))?;

    if !Domain::ALL.iter().any(|d| d.as_str() == analysis.domain) {
        return Err(ImageError::Analysis(format!("Invalid domain: {}", analysis.domain)));
    }
    if !(0.0..=1.0).contains(&analysis.confidence) {
        return Err(ImageError::Analysis(format!("Invalid confidence: {}", analysis.confidence)));
    }

    analysis.original_prompt = prompt.to_string();
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TEXT_PATH: &str = "/models/gemini-2.5-flash:generateContent";

    fn analyzer(server: &MockServer) -> GeminiPromptAnalyzer {
        GeminiPromptAnalyzer::new("test-key".into(), Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
            .with_retry(RetryPolicy::new(3, Duration::ZERO))
    }

    fn reply(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    const HEADSET: &str = r#"{
        "domain": "products",
        "style": "ecommerce",
        "confidence": 0.92,
        "enhanced_prompt": "wireless headphones on seamless white, softbox lighting",
        "reasoning": "marketplace listing"
    }"#;

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{}\n```\nthanks"), "{}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn reasoning_is_optional() {
        let reply = r#"{"domain": "art", "style": "cubist", "confidence": 1.0,
                        "enhanced_prompt": "a guitar in facets"}"#;
        let analysis = parse_analysis(reply, "cubist guitar").unwrap();
        assert_eq!(analysis.reasoning, None);
        assert_eq!(analysis.original_prompt, "cubist guitar");
    }

    #[test]
    fn missing_fields_are_rejected() {
        let err = parse_analysis(r#"{"domain": "art", "confidence": 0.5}"#, "x").unwrap_err();
        assert!(matches!(err, ImageError::Analysis(ref m) if m.contains("missing field")));
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let reply = r#"{"domain": "art", "style": "abstract", "confidence": 1.5,
                        "enhanced_prompt": "shapes"}"#;
        let err = parse_analysis(reply, "x").unwrap_err();
        assert!(err.to_string().contains("Invalid confidence: 1.5"));
    }

    #[tokio::test]
    async fn fenced_reply_is_analyzed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TEXT_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(reply(&format!("```json\n{HEADSET}\n```"))),
            )
            .expect(1)
            .mount(&server)
            .await;

        let analysis = analyzer(&server).analyze("headphones for Amazon").await.unwrap();
        assert_eq!(analysis.domain, "products");
        assert_eq!(analysis.style, "ecommerce");
        assert!((analysis.confidence - 0.92).abs() < f64::EPSILON);
        assert_eq!(analysis.original_prompt, "headphones for Amazon");
        assert_eq!(analysis.reasoning.as_deref(), Some("marketplace listing"));
    }

    #[tokio::test]
    async fn request_carries_prompt_and_sampling_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(HEADSET)))
            .mount(&server)
            .await;

        analyzer(&server).analyze("a red kettle").await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(text.ends_with("Request: \"a red kettle\""));
        assert_eq!(body["generationConfig"]["temperature"], 0.3);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[tokio::test]
    async fn unknown_domain_is_retried_then_reported() {
        let server = MockServer::start().await;
        let bad = HEADSET.replace("\"products\"", "\"music\"");
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(&bad)))
            .expect(3)
            .mount(&server)
            .await;

        let err = analyzer(&server).analyze("a song").await.unwrap_err();
        assert!(matches!(err, ImageError::Analysis(ref m) if m == "Invalid domain: music"));
    }

    #[tokio::test]
    async fn recovers_after_prose_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("Sure! Here you go.")))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(HEADSET)))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = analyzer(&server).analyze("headphones").await.unwrap();
        assert_eq!(analysis.domain, "products");
    }

    #[tokio::test]
    async fn server_errors_exhaust_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let err = analyzer(&server).analyze("headphones").await.unwrap_err();
        assert!(matches!(err, ImageError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn configured_model_is_targeted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-pro:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply(HEADSET)))
            .expect(1)
            .mount(&server)
            .await;

        let analyzer = analyzer(&server).with_model("gemini-2.5-pro");
        assert!(analyzer.analyze("headphones").await.is_ok());
    }
}
