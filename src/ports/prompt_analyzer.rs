//! Prompt analyzer port for text models that rewrite image prompts.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// A text model's reading of an image prompt, with its rewrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    /// One of the four domains.
    pub domain: String,
    /// Subcategory the model picked; free text, not checked against templates.
    pub style: String,
    /// The model's own confidence, within `[0, 1]`.
    pub confidence: f64,
    /// The rewritten prompt to send to the image model.
    pub enhanced_prompt: String,
    /// Why the model chose this domain and style.
    #[serde(default)]
    pub reasoning: Option<String>,
    /// The prompt as the user wrote it.
    #[serde(default)]
    pub original_prompt: String,
}

/// Boxed future type returned by [`PromptAnalyzer::analyze`].
pub type AnalyzeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<PromptAnalysis, ImageError>> + Send + 'a>>;

/// Classifies and rewrites image prompts with a language model.
pub trait PromptAnalyzer: Send + Sync {
    /// Analyze one user prompt.
    fn analyze(&self, prompt: &str) -> AnalyzeFuture<'_>;
}
