//! Classify → suggest subcategory → enhance, shared by the HTTP and CLI
//! surfaces.

use crate::classifier::{self, Classification};
use crate::enhancer::{self, EnhancedPrompt};
use crate::templates::{Quality, TemplateError, TemplateStore};

/// A user prompt ready to be sent to the image model.
#[derive(Debug, Clone)]
pub struct PreparedPrompt {
    /// The prompt as the user wrote it.
    pub original: String,
    /// Classifier output for the original prompt.
    pub classification: Classification,
    /// Template substitution result.
    pub enhanced: EnhancedPrompt,
}

/// Optional overrides for [`prepare`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides<'a> {
    /// Use this domain instead of the classifier's choice.
    pub domain: Option<&'a str>,
    /// Use this subcategory instead of the suggested one.
    pub subcategory: Option<&'a str>,
}

/// Run the synchronous part of a generation request.
///
/// # Errors
///
/// Returns a lookup error when an override names a domain or subcategory
/// that the store does not contain, or the tier is missing.
pub fn prepare(
    store: &TemplateStore,
    prompt: &str,
    quality: Quality,
    overrides: Overrides<'_>,
) -> Result<PreparedPrompt, TemplateError> {
    let classification = classifier::classify(prompt);
    let domain = overrides.domain.unwrap_or(classification.domain.as_str());
    let subcategory = match overrides.subcategory {
        Some(s) => Some(s.to_string()),
        None => enhancer::suggest_subcategory(store, prompt, domain),
    };
    let enhanced = enhancer::enhance(store, prompt, domain, quality, subcategory.as_deref())?;

    tracing::debug!(
        domain = %enhanced.domain,
        subcategory = %enhanced.subcategory,
        confidence = classification.confidence,
        "prepared prompt"
    );

    Ok(PreparedPrompt { original: prompt.to_string(), classification, enhanced })
}
