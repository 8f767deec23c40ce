//! Endpoint handlers.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::{ApiError, JsonBody};
use super::AppState;
use crate::classifier::{self, Domain};
use crate::enhancer;
use crate::model::{aliases, is_alias};
use crate::params::{validate_response_format, RESPONSE_FORMAT};
use crate::pipeline::{self, Overrides};
use crate::ports::ImageRequest;
use crate::templates::Quality;

/// Body of `POST /generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    prompt: Option<String>,
    quality: Option<String>,
    model: Option<String>,
    format: Option<String>,
}

/// Body of `POST /generate` on success.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    image: String,
    enhanced_prompt: String,
    domain: String,
    subcategory: String,
    model: String,
    metadata: GenerateMetadata,
}

/// Extra facts about a generation.
#[derive(Debug, Serialize)]
pub struct GenerateMetadata {
    original_prompt: String,
    quality: Quality,
    domain_confidence: f64,
    image_size_bytes: usize,
    mime_type: String,
    timestamp: String,
}

/// Body of `POST /classify`.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    prompt: Option<String>,
}

/// Body of `POST /classify` on success.
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    domain: Domain,
    confidence: f64,
    scores: serde_json::Map<String, serde_json::Value>,
    suggested_subcategory: Option<String>,
    available_subcategories: Vec<String>,
}

/// Body of `POST /enhance`.
#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    prompt: Option<String>,
    domain: Option<String>,
    subcategory: Option<String>,
    quality: Option<String>,
}

/// Query string of `POST /enhance`.
#[derive(Debug, Default, Deserialize)]
pub struct EnhanceParams {
    /// `template` (default) or `llm`.
    mode: Option<String>,
}

/// Body of `POST /enhance` on success.
#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    enhanced_prompt: String,
    domain: String,
    subcategory: String,
    quality: Quality,
    original_prompt: String,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
}

const MISSING_PROMPT: &str = "Missing 'prompt' field";

/// The prompt field must be present; an empty prompt is classified as usual.
fn require_prompt(prompt: Option<String>) -> Result<String, ApiError> {
    prompt.ok_or_else(|| ApiError::bad_request(MISSING_PROMPT))
}

/// Generation also needs something to draw.
fn require_nonblank_prompt(prompt: Option<String>) -> Result<String, ApiError> {
    match prompt {
        Some(p) if !p.trim().is_empty() => Ok(p),
        _ => Err(ApiError::bad_request(MISSING_PROMPT)),
    }
}

/// An empty override means "not given".
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_quality(quality: Option<&str>, default: Quality) -> Result<Quality, ApiError> {
    quality.map_or(Ok(default), |q| q.parse().map_err(ApiError::bad_request))
}

/// `POST /generate`: classify, enhance and generate one image.
pub async fn generate(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let prompt = require_nonblank_prompt(body.prompt)?;
    let quality = parse_quality(body.quality.as_deref(), state.default_quality)?;
    let model = body.model.unwrap_or_else(|| state.default_model.clone());
    if !is_alias(&model) {
        let valid = aliases().collect::<Vec<_>>().join("/");
        return Err(ApiError::bad_request(format!("Invalid model: {model}. Must be {valid}")));
    }
    validate_response_format(body.format.as_deref().unwrap_or(RESPONSE_FORMAT))
        .map_err(ApiError::bad_request)?;

    let prepared = pipeline::prepare(&state.templates, &prompt, quality, Overrides::default())?;
    tracing::info!(
        domain = %prepared.enhanced.domain,
        subcategory = %prepared.enhanced.subcategory,
        %quality,
        model = %model,
        "generating"
    );

    let request = ImageRequest { model: model.clone(), prompt: prepared.enhanced.text.clone() };
    let image = state.generator.generate(&request).await?;

    Ok(Json(GenerateResponse {
        image: image.to_data_uri(),
        enhanced_prompt: prepared.enhanced.text,
        domain: prepared.enhanced.domain,
        subcategory: prepared.enhanced.subcategory,
        model,
        metadata: GenerateMetadata {
            original_prompt: prepared.original,
            quality,
            domain_confidence: prepared.classification.confidence,
            image_size_bytes: image.data.len(),
            mime_type: image.mime_type,
            timestamp: Utc::now().to_rfc3339(),
        },
    }))
}

/// `POST /classify`: domain, scores and subcategory suggestion.
pub async fn classify(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ClassifyRequest>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let prompt = require_prompt(body.prompt)?;
    let classification = classifier::classify(&prompt);
    let domain = classification.domain.as_str();

    let scores = classifier::scores(&prompt)
        .iter()
        .map(|(d, n)| (d.as_str().to_string(), n.into()))
        .collect();

    Ok(Json(ClassifyResponse {
        domain: classification.domain,
        confidence: classification.confidence,
        scores,
        suggested_subcategory: enhancer::suggest_subcategory(&state.templates, &prompt, domain),
        available_subcategories: state
            .templates
            .subcategories(domain)
            .into_iter()
            .map(str::to_string)
            .collect(),
    }))
}

/// `POST /enhance`: show the prompt that would be sent to the model.
///
/// With `?mode=llm` the prompt is analyzed and rewritten by the text model
/// instead of the templates.
pub async fn enhance(
    State(state): State<AppState>,
    Query(params): Query<EnhanceParams>,
    JsonBody(body): JsonBody<EnhanceRequest>,
) -> Result<Response, ApiError> {
    let prompt = require_prompt(body.prompt)?;

    match params.mode.as_deref().unwrap_or("template") {
        "template" => {}
        "llm" => {
            let analyzer = state
                .analyzer
                .as_ref()
                .ok_or_else(|| ApiError::unavailable("LLM enhancement is not available"))?;
            let analysis = analyzer.analyze(&prompt).await?;
            return Ok(Json(analysis).into_response());
        }
        other => {
            return Err(ApiError::bad_request(format!(
                "Invalid mode: {other}. Must be template/llm"
            )))
        }
    }

    let quality = parse_quality(body.quality.as_deref(), state.default_quality)?;
    let overrides = Overrides {
        domain: non_empty(body.domain.as_deref()),
        subcategory: non_empty(body.subcategory.as_deref()),
    };

    let prepared = pipeline::prepare(&state.templates, &prompt, quality, overrides)?;

    Ok(Json(EnhanceResponse {
        enhanced_prompt: prepared.enhanced.text,
        domain: prepared.enhanced.domain,
        subcategory: prepared.enhanced.subcategory,
        quality: prepared.enhanced.quality,
        original_prompt: prepared.original,
    })
    .into_response())
}

/// `GET /health`: liveness.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// `GET /`: endpoint overview for humans.
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>nanobanana</title></head>
<body>
<h1>nanobanana</h1>
<p>Prompt-aware image generation.</p>
<ul>
<li><code>POST /generate</code> {"prompt", "quality"?, "model"?, "format"?}</li>
<li><code>POST /classify</code> {"prompt"}</li>
<li><code>POST /enhance</code> {"prompt", "domain"?, "subcategory"?, "quality"?}</li>
<li><code>POST /enhance?mode=llm</code> {"prompt"}</li>
<li><code>GET /health</code></li>
</ul>
</body>
</html>
"#;
