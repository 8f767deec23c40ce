//! Unified error type for nanobanana.

use thiserror::Error;

use crate::templates::TemplateError;

/// Errors that can occur while preparing prompts or generating images.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the API.
        message: String,
    },

    /// Connection failure, timeout or other transport-level problem.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A well-formed response that carried no inline image data.
    #[error("No image data in response: {parts} part(s) returned, none with inlineData")]
    NoImageData {
        /// Number of parts in the first candidate.
        parts: usize,
    },

    /// The response body could not be interpreted.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The model name does not map to a supported backend model.
    #[error("Unknown model '{0}'. Expected 'flash', 'pro' or a full Gemini image model id")]
    UnknownModel(String),

    /// Template load or lookup failure.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Image format conversion error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// A replayed interaction recorded an error, or the cassette had no match.
    #[error("Replay error: {0}")]
    Replay(String),

    /// The text model answered, but not with a usable prompt analysis.
    #[error("Prompt analysis rejected: {0}")]
    Analysis(String),

    /// A background task ended without producing a result.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Some prompts of a batch did not produce an image.
    #[error("{failed} of {total} generations failed")]
    BatchIncomplete {
        /// Number of failed prompts.
        failed: usize,
        /// Number of submitted prompts.
        total: usize,
    },

    /// No API key configured.
    #[error("No API key for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The provider name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },
}

impl ImageError {
    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures qualify, and so does an unusable prompt analysis
    /// since the text model may answer differently next time. Image
    /// content-shape errors are answers to the request and configuration
    /// errors are deterministic.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api { .. } | Self::Network(_) | Self::Analysis(_))
    }

    /// Whether the error was caused by the caller's input rather than by the
    /// service or the remote API.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::UnknownModel(_))
            || matches!(self, Self::Template(e) if e.is_lookup())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_are_transient() {
        let err = ImageError::Api { status: 503, message: "overloaded".into() };
        assert!(err.is_transient());
    }

    #[test]
    fn content_errors_are_not_transient() {
        assert!(!ImageError::NoImageData { parts: 1 }.is_transient());
        assert!(!ImageError::MalformedResponse("bad".into()).is_transient());
    }

    #[test]
    fn rejected_analysis_is_transient() {
        assert!(ImageError::Analysis("Invalid domain: music".into()).is_transient());
        assert!(!ImageError::Internal("task panicked".into()).is_transient());
    }

    #[test]
    fn config_errors_are_not_transient() {
        assert!(!ImageError::UnknownModel("dall-e".into()).is_transient());
        let missing =
            ImageError::MissingApiKey { provider: "Gemini".into(), env_var: "GOOGLE_API_KEY".into() };
        assert!(!missing.is_transient());
    }

    #[test]
    fn lookup_failures_are_client_errors() {
        let err = ImageError::from(TemplateError::UnknownDomain {
            domain: "music".into(),
            available: vec!["photography".into()],
        });
        assert!(err.is_client_error());
        assert!(ImageError::UnknownModel("x".into()).is_client_error());
        assert!(!ImageError::NoImageData { parts: 0 }.is_client_error());
    }

    #[test]
    fn no_image_message_mentions_part_count() {
        let msg = ImageError::NoImageData { parts: 2 }.to_string();
        assert!(msg.contains("2 part(s)"));
    }
}
