//! Model name resolution.

/// Short names accepted by the service and CLI, with the model they select.
const ALIASES: &[(&str, &str)] = &[
    ("flash", "gemini-2.5-flash-image"),
    ("pro", "gemini-3-pro-image-preview"),
];

/// Short model names, in the order they are documented.
#[must_use]
pub fn aliases() -> impl Iterator<Item = &'static str> {
    ALIASES.iter().map(|&(alias, _)| alias)
}

/// Resolve a short name or full identifier to a supported model identifier.
///
/// # Errors
///
/// Returns the unrecognized name when it is neither an alias nor one of the
/// supported model identifiers.
pub fn resolve_model(name: &str) -> Result<&'static str, String> {
    ALIASES
        .iter()
        .find(|&&(alias, full)| name == alias || name == full)
        .map(|&(_, full)| full)
        .ok_or_else(|| name.to_string())
}

/// Whether `name` is one of the short aliases (`flash`, `pro`).
#[must_use]
pub fn is_alias(name: &str) -> bool {
    ALIASES.iter().any(|&(alias, _)| alias == name)
}
