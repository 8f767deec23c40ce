//! In-process generators for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::image_generator::{GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest};
use super::prompt_analyzer::{AnalyzeFuture, PromptAnalysis, PromptAnalyzer};
use crate::error::ImageError;

/// Returns the same image for every request.
pub struct FixedGenerator {
    pub image: GeneratedImage,
}

impl FixedGenerator {
    pub fn png(data: &[u8]) -> Self {
        Self { image: GeneratedImage { data: data.to_vec(), mime_type: "image/png".into() } }
    }
}

impl ImageGenerator for FixedGenerator {
    fn generate(&self, _request: &ImageRequest) -> GenerateFuture<'_> {
        let image = self.image.clone();
        Box::pin(async move { Ok(image) })
    }
}

/// Fails every request with a content error.
pub struct FailingGenerator;

impl ImageGenerator for FailingGenerator {
    fn generate(&self, _request: &ImageRequest) -> GenerateFuture<'_> {
        Box::pin(async { Err(ImageError::NoImageData { parts: 1 }) })
    }
}

/// Panics on prompts containing "panic", answers the rest like [`FixedGenerator`].
pub struct PanickingGenerator;

impl ImageGenerator for PanickingGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let prompt = request.prompt.clone();
        Box::pin(async move {
            assert!(!prompt.contains("panic"), "generator blew up on {prompt:?}");
            Ok(GeneratedImage { data: prompt.into_bytes(), mime_type: "image/png".into() })
        })
    }
}

/// Sleeps per request and records how many calls overlap.
///
/// The delay for a prompt is looked up by `delay_for`; prompts containing
/// "fail" produce a transport error after their delay.
pub struct InstrumentedGenerator {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    delay_for: fn(&str) -> Duration,
}

impl InstrumentedGenerator {
    pub fn new(delay_for: fn(&str) -> Duration) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            delay_for,
        }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ImageGenerator for InstrumentedGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let prompt = request.prompt.clone();
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep((self.delay_for)(&prompt)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if prompt.contains("fail") {
                Err(ImageError::Api { status: 500, message: format!("boom: {prompt}") })
            } else {
                Ok(GeneratedImage { data: prompt.into_bytes(), mime_type: "image/png".into() })
            }
        })
    }
}

/// Files every prompt under `products/ecommerce`; prompts containing
/// "fail" are rejected.
pub struct FixedAnalyzer;

impl PromptAnalyzer for FixedAnalyzer {
    fn analyze(&self, prompt: &str) -> AnalyzeFuture<'_> {
        let prompt = prompt.to_string();
        Box::pin(async move {
            if prompt.contains("fail") {
                return Err(ImageError::Analysis(format!("Invalid domain for {prompt}")));
            }
            Ok(PromptAnalysis {
                domain: "products".into(),
                style: "ecommerce".into(),
                confidence: 0.9,
                enhanced_prompt: format!("{prompt}, studio packshot on white"),
                reasoning: Some("it is for sale".into()),
                original_prompt: prompt,
            })
        })
    }
}
