//! Keyword-based prompt domain classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The image domains a prompt can be classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Real-world photographs: portraits, landscapes, macro.
    Photography,
    /// Technical diagrams, charts and wireframes.
    Diagrams,
    /// Paintings, illustrations and digital art.
    Art,
    /// E-commerce and advertising product shots.
    Products,
}

impl Domain {
    /// Every domain, in tie-breaking order.
    pub const ALL: [Domain; 4] = [Self::Photography, Self::Diagrams, Self::Art, Self::Products];

    /// Domain returned when nothing in the prompt matches.
    pub const DEFAULT: Domain = Self::Photography;

    /// Name used in template files and API payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photography => "photography",
            Self::Diagrams => "diagrams",
            Self::Art => "art",
            Self::Products => "products",
        }
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Self::Photography => &[
                "photo", "photograph", "portrait", "headshot", "selfie", "picture", "shot",
                "camera", "lens", "lighting", "bokeh", "focus", "exposure", "iso", "aperture",
                "landscape", "cityscape", "sunset", "golden hour", "canon", "nikon", "sony",
                "phase one",
            ],
            Self::Diagrams => &[
                "diagram", "chart", "graph", "flowchart", "wireframe", "architecture",
                "schematic", "blueprint", "layout", "infographic", "visualization", "flow",
                "process", "uml", "erd", "sequence", "component", "network", "aws", "gcp",
                "azure", "microservices", "infrastructure",
            ],
            Self::Art => &[
                "art", "artwork", "painting", "drawing", "illustration", "sketch", "watercolor",
                "oil painting", "acrylic", "impressionist", "abstract", "surreal", "realistic",
                "digital art", "concept art", "character design", "style of", "inspired by",
                "artistic", "creative",
            ],
            Self::Products => &[
                "product", "e-commerce", "catalog", "merchandise", "item", "package", "packaging",
                "unboxing", "advertising", "commercial", "marketing", "promotional",
                "studio shot", "white background", "lifestyle", "amazon", "shopify", "store",
                "retail",
            ],
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| format!("Unknown domain '{s}'. Valid: photography, diagrams, art, products"))
    }
}

/// Result of classifying a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    /// Winning domain.
    pub domain: Domain,
    /// Share of all keyword matches that went to `domain`, or 0.5 when
    /// nothing matched.
    pub confidence: f64,
}

/// Keyword match counts per domain, in [`Domain::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScores([(Domain, usize); 4]);

impl DomainScores {
    /// Match count for one domain.
    #[must_use]
    pub fn get(&self, domain: Domain) -> usize {
        self.0.iter().find(|(d, _)| *d == domain).map_or(0, |&(_, n)| n)
    }

    /// Sum of matches over every domain.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().map(|&(_, n)| n).sum()
    }

    /// Iterate `(domain, count)` pairs in tie-breaking order.
    pub fn iter(&self) -> impl Iterator<Item = (Domain, usize)> + '_ {
        self.0.iter().copied()
    }

    /// Highest-scoring domain; the earliest one wins ties.
    fn best(&self) -> (Domain, usize) {
        self.iter().fold((Domain::DEFAULT, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }
}

/// Count keyword matches of `text` for every domain.
///
/// Matching is by case-insensitive substring, so "art" also counts inside
/// "smart".
#[must_use]
pub fn scores(text: &str) -> DomainScores {
    let lowered = text.to_lowercase();
    DomainScores(Domain::ALL.map(|domain| {
        let hits = domain.keywords().iter().filter(|kw| lowered.contains(*kw)).count();
        (domain, hits)
    }))
}

/// Classify `text` into the domain with the most keyword matches.
#[must_use]
pub fn classify(text: &str) -> Classification {
    let scores = scores(text);
    let total = scores.total();
    if total == 0 {
        return Classification { domain: Domain::DEFAULT, confidence: 0.5 };
    }
    let (domain, hits) = scores.best();
    #[allow(clippy::cast_precision_loss)]
    let confidence = hits as f64 / total as f64;
    Classification { domain, confidence }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_architecture_is_a_diagram() {
        let c = classify("AWS architecture diagram");
        assert_eq!(c.domain, Domain::Diagrams);
        assert!(c.confidence > 0.0);
        assert_eq!(scores("AWS architecture diagram").get(Domain::Diagrams), 3);
    }

    #[test]
    fn empty_prompt_uses_default() {
        let c = classify("");
        assert_eq!(c.domain, Domain::Photography);
        assert!((c.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn no_keywords_uses_default() {
        for text in ["xyz", "a bowl of soup", "1234"] {
            let c = classify(text);
            assert_eq!(c.domain, Domain::DEFAULT, "{text}");
            assert!((c.confidence - 0.5).abs() < f64::EPSILON, "{text}");
        }
    }

    #[test]
    fn headshot_is_photography() {
        assert_eq!(classify("headshot of a CEO").domain, Domain::Photography);
    }

    #[test]
    fn impressionist_painting_is_art() {
        let c = classify("impressionist painting of a sunset");
        assert_eq!(c.domain, Domain::Art);
        // two art keywords against one photography keyword
        assert!((c.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn matching_ignores_case() {
        assert_eq!(scores("CANON LENS").get(Domain::Photography), 2);
        assert_eq!(scores("uml").get(Domain::Diagrams), scores("UML").get(Domain::Diagrams));
    }

    #[test]
    fn ties_go_to_earliest_domain() {
        // "photo" (photography) vs "graph" (diagrams): one each
        let c = classify("photo graph");
        assert_eq!(scores("photo graph").get(Domain::Photography), 1);
        assert_eq!(scores("photo graph").get(Domain::Diagrams), 1);
        assert_eq!(c.domain, Domain::Photography);
        assert!((c.confidence - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        let prompts = [
            "",
            "product photography for e-commerce",
            "AWS microservices architecture diagram with network flow",
            "digital art illustration in the style of Monet, artistic and creative",
            "smart start",
        ];
        for text in prompts {
            let c = classify(text);
            assert!((0.0..=1.0).contains(&c.confidence), "{text}: {}", c.confidence);
            assert!(Domain::ALL.contains(&c.domain));
        }
    }

    #[test]
    fn domain_round_trips_through_str() {
        for d in Domain::ALL {
            assert_eq!(d.as_str().parse::<Domain>().unwrap(), d);
        }
        assert!("music".parse::<Domain>().is_err());
    }
}
