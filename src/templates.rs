//! Read-only template store: domain → subcategory → quality → template.
//!
//! The store is built once at startup and shared by reference. Registration
//! order follows the JSON document, which matters because the first
//! subcategory of a domain is its default.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Token replaced by the user's text in every template.
pub const PLACEHOLDER: &str = "{subject}";

/// Template set compiled into the binary.
const BUILTIN_TEMPLATES: &str = include_str!("../templates/templates.json");

/// How elaborate the added specification text is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// A short style hint.
    Basic,
    /// Typical professional specification.
    #[default]
    Detailed,
    /// Exhaustive equipment and technique detail.
    Expert,
}

impl Quality {
    /// Every tier, from least to most elaborate.
    pub const ALL: [Quality; 3] = [Self::Basic, Self::Detailed, Self::Expert];

    /// Name used in template files and API payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Detailed => "detailed",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.as_str() == s)
            .ok_or_else(|| format!("Invalid quality: {s}. Must be basic/detailed/expert"))
    }
}

/// Errors raised while loading or querying templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template document could not be read or parsed.
    #[error("Failed to load templates: {0}")]
    Load(String),

    /// A template does not contain exactly one placeholder.
    #[error("Template {domain}/{subcategory}/{quality} has {count} '{{subject}}' placeholders, expected 1")]
    Placeholder {
        /// Domain of the offending template.
        domain: String,
        /// Subcategory of the offending template.
        subcategory: String,
        /// Quality tier of the offending template.
        quality: String,
        /// Number of placeholders found.
        count: usize,
    },

    /// The domain is not in the store.
    #[error("Unknown domain: {domain}. Must be one of {available:?}")]
    UnknownDomain {
        /// Requested domain.
        domain: String,
        /// Domains present in the store.
        available: Vec<String>,
    },

    /// The subcategory is not registered for the domain.
    #[error("Unknown subcategory '{subcategory}' for domain '{domain}'. Available: {available:?}")]
    UnknownSubcategory {
        /// Requested domain.
        domain: String,
        /// Requested subcategory.
        subcategory: String,
        /// Subcategories registered for the domain.
        available: Vec<String>,
    },

    /// The subcategory has no template for the quality tier.
    #[error("Unknown quality '{quality}' for {domain}/{subcategory}. Available: {available:?}")]
    UnknownQuality {
        /// Requested domain.
        domain: String,
        /// Requested subcategory.
        subcategory: String,
        /// Requested tier.
        quality: Quality,
        /// Tiers present for the subcategory.
        available: Vec<Quality>,
    },
}

impl TemplateError {
    /// Whether this is a failed lookup, as opposed to a broken template set.
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            Self::UnknownDomain { .. } | Self::UnknownSubcategory { .. } | Self::UnknownQuality { .. }
        )
    }
}

#[derive(Debug)]
struct SubcategoryTemplates {
    name: String,
    tiers: Vec<(Quality, String)>,
}

#[derive(Debug)]
struct DomainTemplates {
    name: String,
    subcategories: Vec<SubcategoryTemplates>,
}

/// A template selected by [`TemplateStore::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemplateRef<'a> {
    /// Domain the template belongs to.
    pub domain: &'a str,
    /// Subcategory the template belongs to (resolved when none was given).
    pub subcategory: &'a str,
    /// Quality tier of the template.
    pub quality: Quality,
    /// Template text, containing [`PLACEHOLDER`] once.
    pub text: &'a str,
}

/// Immutable nested template table.
#[derive(Debug)]
pub struct TemplateStore {
    domains: Vec<DomainTemplates>,
}

impl TemplateStore {
    /// Build the store from the templates compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled document is invalid.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::from_json(BUILTIN_TEMPLATES)
    }

    /// Load a template document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid
    /// template document.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TemplateError::Load(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&contents)
    }

    /// Parse a template document, keeping the document's key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a three-level object of
    /// strings, names an unknown quality tier, or a template does not contain
    /// exactly one placeholder.
    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let root: Map<String, Value> =
            serde_json::from_str(json).map_err(|e| TemplateError::Load(e.to_string()))?;

        let mut domains = Vec::with_capacity(root.len());
        for (domain, subcats) in root {
            let subcats = as_object(&subcats, &domain)?;
            if subcats.is_empty() {
                return Err(TemplateError::Load(format!("domain '{domain}' has no subcategories")));
            }

            let mut subcategories = Vec::with_capacity(subcats.len());
            for (subcategory, tiers) in subcats {
                let tiers = as_object(tiers, &format!("{domain}/{subcategory}"))?;
                let mut parsed = Vec::with_capacity(tiers.len());
                for (tier, text) in tiers {
                    let quality = tier.parse::<Quality>().map_err(TemplateError::Load)?;
                    let text = text.as_str().ok_or_else(|| {
                        TemplateError::Load(format!("{domain}/{subcategory}/{tier} is not a string"))
                    })?;
                    let count = text.matches(PLACEHOLDER).count();
                    if count != 1 {
                        return Err(TemplateError::Placeholder {
                            domain: domain.clone(),
                            subcategory: subcategory.clone(),
                            quality: tier.clone(),
                            count,
                        });
                    }
                    parsed.push((quality, text.to_string()));
                }
                subcategories.push(SubcategoryTemplates { name: subcategory.clone(), tiers: parsed });
            }
            domains.push(DomainTemplates { name: domain, subcategories });
        }

        Ok(Self { domains })
    }

    /// Domain names in registration order.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|d| d.name.as_str())
    }

    /// Subcategory names of `domain` in registration order, empty when the
    /// domain is unknown.
    #[must_use]
    pub fn subcategories(&self, domain: &str) -> Vec<&str> {
        self.domain(domain)
            .map(|d| d.subcategories.iter().map(|s| s.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Find the template for `(domain, subcategory, quality)`.
    ///
    /// When `subcategory` is `None` the first registered subcategory of the
    /// domain is used.
    ///
    /// # Errors
    ///
    /// Returns a lookup error naming the missing key and the available ones.
    pub fn lookup(
        &self,
        domain: &str,
        subcategory: Option<&str>,
        quality: Quality,
    ) -> Result<TemplateRef<'_>, TemplateError> {
        let entry = self.domain(domain).ok_or_else(|| TemplateError::UnknownDomain {
            domain: domain.to_string(),
            available: self.domains().map(str::to_string).collect(),
        })?;

        let subcat = match subcategory {
            None => entry.subcategories.first(),
            Some(name) => entry.subcategories.iter().find(|s| s.name == name),
        }
        .ok_or_else(|| TemplateError::UnknownSubcategory {
            domain: domain.to_string(),
            subcategory: subcategory.unwrap_or_default().to_string(),
            available: entry.subcategories.iter().map(|s| s.name.clone()).collect(),
        })?;

        let text = subcat
            .tiers
            .iter()
            .find(|(q, _)| *q == quality)
            .map(|(_, text)| text.as_str())
            .ok_or_else(|| TemplateError::UnknownQuality {
                domain: domain.to_string(),
                subcategory: subcat.name.clone(),
                quality,
                available: subcat.tiers.iter().map(|(q, _)| *q).collect(),
            })?;

        Ok(TemplateRef { domain: &entry.name, subcategory: &subcat.name, quality, text })
    }

    /// Every `(domain, subcategory, quality)` triple present in the store.
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, Quality)> {
        self.domains.iter().flat_map(|d| {
            d.subcategories.iter().flat_map(move |s| {
                s.tiers.iter().map(move |(q, _)| (d.name.as_str(), s.name.as_str(), *q))
            })
        })
    }

    fn domain(&self, name: &str) -> Option<&DomainTemplates> {
        self.domains.iter().find(|d| d.name == name)
    }
}

fn as_object<'a>(value: &'a Value, at: &str) -> Result<&'a Map<String, Value>, TemplateError> {
    value.as_object().ok_or_else(|| TemplateError::Load(format!("'{at}' must be an object")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Domain;

    const SMALL: &str = r#"{
        "photography": {
            "landscape": { "basic": "{subject}, wide" },
            "portrait": { "basic": "{subject}, close", "expert": "{subject}, studio" }
        }
    }"#;

    #[test]
    fn builtin_covers_every_domain_and_tier() {
        let store = TemplateStore::builtin().unwrap();
        for domain in Domain::ALL {
            let subcats = store.subcategories(domain.as_str());
            assert!(!subcats.is_empty(), "{domain}");
            for subcat in subcats {
                for quality in Quality::ALL {
                    assert!(store.lookup(domain.as_str(), Some(subcat), quality).is_ok());
                }
            }
        }
    }

    #[test]
    fn builtin_photography_starts_with_portrait() {
        let store = TemplateStore::builtin().unwrap();
        assert_eq!(store.subcategories("photography")[0], "portrait");
    }

    #[test]
    fn registration_order_is_document_order() {
        let store = TemplateStore::from_json(SMALL).unwrap();
        assert_eq!(store.subcategories("photography"), vec!["landscape", "portrait"]);
        let t = store.lookup("photography", None, Quality::Basic).unwrap();
        assert_eq!(t.subcategory, "landscape");
        assert_eq!(t.text, "{subject}, wide");
    }

    #[test]
    fn unknown_domain_is_a_lookup_error() {
        let store = TemplateStore::from_json(SMALL).unwrap();
        let err = store.lookup("music", None, Quality::Basic).unwrap_err();
        assert!(err.is_lookup());
        assert!(matches!(err, TemplateError::UnknownDomain { .. }));
    }

    #[test]
    fn unknown_subcategory_is_a_lookup_error() {
        let store = TemplateStore::from_json(SMALL).unwrap();
        let err = store.lookup("photography", Some("macro"), Quality::Basic).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownSubcategory { ref available, .. } if available.len() == 2));
    }

    #[test]
    fn missing_tier_is_a_lookup_error() {
        let store = TemplateStore::from_json(SMALL).unwrap();
        let err = store.lookup("photography", Some("landscape"), Quality::Expert).unwrap_err();
        assert!(matches!(err, TemplateError::UnknownQuality { quality: Quality::Expert, .. }));
    }

    #[test]
    fn every_listed_triple_resolves() {
        let store = TemplateStore::from_json(SMALL).unwrap();
        let triples: Vec<_> = store.triples().collect();
        assert_eq!(triples.len(), 3);
        for (d, s, q) in triples {
            assert!(store.lookup(d, Some(s), q).is_ok());
        }
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let err = TemplateStore::from_json(r#"{"art": {"abstract": {"basic": "shapes"}}}"#).unwrap_err();
        assert!(matches!(err, TemplateError::Placeholder { count: 0, .. }));
    }

    #[test]
    fn rejects_template_with_two_placeholders() {
        let json = r#"{"art": {"abstract": {"basic": "{subject} and {subject}"}}}"#;
        let err = TemplateStore::from_json(json).unwrap_err();
        assert!(matches!(err, TemplateError::Placeholder { count: 2, .. }));
    }

    #[test]
    fn rejects_unknown_tier_name() {
        let json = r#"{"art": {"abstract": {"ultra": "{subject}"}}}"#;
        assert!(matches!(TemplateStore::from_json(json), Err(TemplateError::Load(_))));
    }

    #[test]
    fn rejects_malformed_document() {
        assert!(TemplateStore::from_json("not json").is_err());
        assert!(TemplateStore::from_json(r#"{"art": "flat"}"#).is_err());
        assert!(TemplateStore::from_json(r#"{"art": {}}"#).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = std::env::temp_dir().join("nanobanana_templates_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("templates.json");
        std::fs::write(&path, SMALL).unwrap();

        let store = TemplateStore::load(&path).unwrap();
        assert_eq!(store.domains().collect::<Vec<_>>(), vec!["photography"]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn quality_parsing() {
        assert_eq!("expert".parse::<Quality>().unwrap(), Quality::Expert);
        assert_eq!(Quality::default(), Quality::Detailed);
        let err = "ultra".parse::<Quality>().unwrap_err();
        assert!(err.contains("basic/detailed/expert"));
    }
}
