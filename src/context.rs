//! Service context that bundles the port trait objects and shared state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::adapters::live::gemini::GeminiGenerator;
use crate::adapters::live::gemini_text::GeminiPromptAnalyzer;
use crate::adapters::recording::image_generator::RecordingImageGenerator;
use crate::adapters::replaying::image_generator::ReplayingImageGenerator;
use crate::cassette::config::load_cassette;
use crate::cassette::recorder::CassetteRecorder;
use crate::config::{Config, API_KEY_ENV};
use crate::error::ImageError;
use crate::ports::{ImageGenerator, PromptAnalyzer};
use crate::templates::TemplateStore;

/// Bundles the image generator port with the template store.
pub struct ServiceContext {
    /// Image generator port.
    pub generator: Arc<dyn ImageGenerator>,
    /// Loaded templates.
    pub templates: Arc<TemplateStore>,
    /// Text model for LLM enhancement; absent when replaying.
    pub analyzer: Option<Arc<dyn PromptAnalyzer>>,
}

/// Handle to a recording session; save it once the work is done.
pub struct RecordingSession {
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingSession {
    /// Write everything recorded so far to the cassette file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be written.
    pub fn save(&self) -> Result<PathBuf, String> {
        let recorder = self.recorder.lock().map_err(|e| format!("Recorder lock poisoned: {e}"))?;
        tracing::debug!(interactions = recorder.interaction_count(), "saving cassette");
        recorder.save().map_err(|e| format!("Failed to write cassette: {e}"))
    }
}

/// How the generator port is backed, chosen from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Call the API.
    Live,
    /// Call the API and record every interaction.
    Recording,
    /// Answer from the given cassette.
    Replaying(PathBuf),
}

impl Mode {
    /// `NANOBANANA_REPLAY=<cassette>` replays; `NANOBANANA_REC=1` records.
    #[must_use]
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("NANOBANANA_REPLAY") {
            return Self::Replaying(PathBuf::from(path));
        }
        if std::env::var("NANOBANANA_REC").is_ok_and(|v| v == "true" || v == "1") {
            return Self::Recording;
        }
        Self::Live
    }
}

impl ServiceContext {
    /// Build a context for `mode`, returning the recording session if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the templates cannot be loaded, the API key is
    /// missing in live or recording mode, or the cassette cannot be read.
    pub fn for_mode(
        mode: &Mode,
        config: &Config,
    ) -> Result<(Self, Option<RecordingSession>), ImageError> {
        match mode {
            Mode::Live => Ok((Self::live(config)?, None)),
            Mode::Recording => {
                let (ctx, session) = Self::recording(config)?;
                Ok((ctx, Some(session)))
            }
            Mode::Replaying(path) => Ok((Self::replaying(path, config)?, None)),
        }
    }

    /// Create a live context calling the Gemini API.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is not configured or the templates
    /// cannot be loaded.
    pub fn live(config: &Config) -> Result<Self, ImageError> {
        let templates = load_templates(config)?;
        let key = config.google_key().ok_or_else(|| ImageError::MissingApiKey {
            provider: "Google AI".into(),
            env_var: API_KEY_ENV.into(),
        })?;
        let generation = &config.generation;
        let analyzer = GeminiPromptAnalyzer::new(key.clone(), generation.timeout())?
            .with_base_url(&generation.base_url)
            .with_model(&generation.text_model)
            .with_retry(generation.retry_policy());
        let generator = GeminiGenerator::new(key, generation.timeout())?
            .with_base_url(&generation.base_url)
            .with_retry(generation.retry_policy());
        Ok(Self {
            generator: Arc::new(generator),
            templates,
            analyzer: Some(Arc::new(analyzer)),
        })
    }

    /// Create a recording context that wraps a live adapter with a recorder.
    ///
    /// Only image generation is recorded; the text model is called live.
    ///
    /// # Errors
    ///
    /// Returns an error if the live context cannot be created.
    pub fn recording(config: &Config) -> Result<(Self, RecordingSession), ImageError> {
        let live_ctx = Self::live(config)?;

        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string();
        let output_dir = PathBuf::from(".nanobanana/cassettes").join(&timestamp);

        let commit = get_commit_hash();
        let path = output_dir.join("image_generator.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(
            path,
            format!("{timestamp}-image_generator"),
            &commit,
        )));

        let recording_gen = RecordingImageGenerator::new(live_ctx.generator, Arc::clone(&recorder));

        let ctx = Self {
            generator: Arc::new(recording_gen),
            templates: live_ctx.templates,
            analyzer: live_ctx.analyzer,
        };
        let session = RecordingSession { recorder };

        Ok((ctx, session))
    }

    /// Create a replaying context from a cassette file. No API key is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file or the templates cannot be loaded.
    pub fn replaying(path: &Path, config: &Config) -> Result<Self, ImageError> {
        let templates = load_templates(config)?;
        let replayer = load_cassette(path)
            .map_err(|e| ImageError::Config(format!("Failed to load cassette: {e}")))?;
        let replayer = Arc::new(Mutex::new(replayer));
        let generator = Arc::new(ReplayingImageGenerator::new(replayer));
        Ok(Self { generator, templates, analyzer: None })
    }

    /// The text model, or an error explaining why there is none.
    ///
    /// # Errors
    ///
    /// Returns a config error when replaying a cassette.
    pub fn require_analyzer(&self) -> Result<Arc<dyn PromptAnalyzer>, ImageError> {
        self.analyzer.clone().ok_or_else(|| {
            ImageError::Config("LLM enhancement is not available when replaying a cassette".into())
        })
    }
}

/// Load the configured template file, or the built-in templates.
///
/// # Errors
///
/// Returns an error if the file is unreadable or fails validation.
pub fn load_templates(config: &Config) -> Result<Arc<TemplateStore>, ImageError> {
    let store = match &config.templates.path {
        Some(path) => TemplateStore::load(path)?,
        None => TemplateStore::builtin()?,
    };
    tracing::debug!(templates = store.triples().count(), "templates loaded");
    Ok(Arc::new(store))
}

/// Get the current git commit hash, or "unknown" if unavailable.
fn get_commit_hash() -> String {
    std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map_or_else(|| "unknown".to_string(), |s| s.trim().to_string())
}
