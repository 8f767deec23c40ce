//! Prompt enhancement by template substitution.

use serde::Serialize;

use crate::templates::{Quality, TemplateError, TemplateStore, PLACEHOLDER};

/// Keywords that steer [`suggest_subcategory`] towards a subcategory.
const SUBCATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("portrait", &["portrait", "headshot", "face", "person", "people"]),
    ("landscape", &["landscape", "scenery", "mountains", "sunset", "nature"]),
    ("product", &["product", "item", "package", "merchandise"]),
    ("macro", &["macro", "close-up", "detail", "extreme"]),
    ("architecture", &["architecture", "system", "infrastructure", "microservices"]),
    ("flowchart", &["flow", "process", "workflow", "steps"]),
    ("wireframe", &["wireframe", "mockup", "ui", "interface", "screen"]),
    ("technical", &["technical", "schematic", "engineering", "blueprint"]),
    ("painting", &["painting", "paint", "impressionist", "oil", "watercolor"]),
    ("digital_art", &["digital", "illustration", "artwork"]),
    ("3d_render", &["3d", "render", "blender", "cinema 4d"]),
    ("abstract", &["abstract", "geometric", "shapes"]),
    ("ecommerce", &["ecommerce", "amazon", "shopify", "store"]),
    ("lifestyle", &["lifestyle", "real-world", "in use"]),
    ("editorial", &["editorial", "magazine", "fashion"]),
    ("advertising", &["advertising", "commercial", "campaign"]),
];

/// A user prompt after template substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnhancedPrompt {
    /// The template with the user's text substituted in.
    pub text: String,
    /// Domain of the template used.
    pub domain: String,
    /// Subcategory of the template used.
    pub subcategory: String,
    /// Quality tier of the template used.
    pub quality: Quality,
}

/// Substitute `input` into the template registered for
/// `(domain, subcategory, quality)`.
///
/// Without a subcategory the domain's first registered subcategory is used.
/// The input is inserted verbatim.
///
/// # Errors
///
/// Returns a lookup error when the domain, subcategory or tier is absent.
pub fn enhance(
    store: &TemplateStore,
    input: &str,
    domain: &str,
    quality: Quality,
    subcategory: Option<&str>,
) -> Result<EnhancedPrompt, TemplateError> {
    let template = store.lookup(domain, subcategory, quality)?;
    Ok(EnhancedPrompt {
        text: template.text.replace(PLACEHOLDER, input),
        domain: template.domain.to_string(),
        subcategory: template.subcategory.to_string(),
        quality,
    })
}

/// Pick the subcategory of `domain` whose keywords best match `input`.
///
/// Falls back to the first registered subcategory when nothing matches;
/// ties go to the earlier subcategory. Returns `None` for unknown domains.
#[must_use]
pub fn suggest_subcategory(store: &TemplateStore, input: &str, domain: &str) -> Option<String> {
    let lowered = input.to_lowercase();
    let subcategories = store.subcategories(domain);
    let first = *subcategories.first()?;

    let (best, hits) = subcategories.iter().fold((first, 0), |best, &name| {
        let hits = SUBCATEGORY_KEYWORDS
            .iter()
            .find(|(sub, _)| *sub == name)
            .map_or(0, |(_, kws)| kws.iter().filter(|kw| lowered.contains(*kw)).count());
        if hits > best.1 {
            (name, hits)
        } else {
            best
        }
    });
    tracing::debug!(domain, subcategory = best, hits, "suggested subcategory");
    Some(best.to_string())
}
