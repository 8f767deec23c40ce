//! Concurrent batch generation with a bounded gate.
//!
//! Each prompt runs as its own task. Tasks wait on a FIFO semaphore that is
//! held only for the generation call, and report through a channel so the
//! caller sees results in completion order. A task whose generation call
//! panics still reports, as a failure for its index.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::error::ImageError;
use crate::ports::image_generator::{GeneratedImage, ImageGenerator, ImageRequest};
use crate::ports::prompt_analyzer::{PromptAnalysis, PromptAnalyzer};

/// Outcome of one prompt of a batch.
#[derive(Debug)]
pub enum GenerationResult {
    /// The prompt produced an image.
    Success {
        /// Position of the prompt in the submitted batch.
        index: usize,
        /// The prompt as submitted.
        prompt: String,
        /// The generated image.
        image: GeneratedImage,
        /// Image size in bytes.
        size: usize,
    },
    /// The prompt failed; siblings are unaffected.
    Failure {
        /// Position of the prompt in the submitted batch.
        index: usize,
        /// The prompt as submitted.
        prompt: String,
        /// Why generation failed.
        error: ImageError,
    },
}

impl GenerationResult {
    fn new(index: usize, prompt: String, outcome: Result<GeneratedImage, ImageError>) -> Self {
        match outcome {
            Ok(image) => Self::Success { index, prompt, size: image.data.len(), image },
            Err(error) => Self::Failure { index, prompt, error },
        }
    }

    /// Position of the prompt in the submitted batch.
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Success { index, .. } | Self::Failure { index, .. } => *index,
        }
    }

    /// The prompt as submitted.
    #[must_use]
    pub fn prompt(&self) -> &str {
        match self {
            Self::Success { prompt, .. } | Self::Failure { prompt, .. } => prompt,
        }
    }

    /// Whether the prompt produced an image.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Results of a running batch, yielded as tasks finish.
///
/// The sequence is finite and cannot be restarted. Dropping it does not
/// cancel tasks that are already scheduled.
pub struct BatchResults {
    rx: mpsc::UnboundedReceiver<GenerationResult>,
    total: usize,
}

impl BatchResults {
    /// Next finished result, or `None` once every task has reported.
    pub async fn next(&mut self) -> Option<GenerationResult> {
        self.rx.recv().await
    }

    /// Number of prompts submitted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }
}

/// Runs many independent generation calls under a concurrency limit.
pub struct BatchOrchestrator {
    generator: Arc<dyn ImageGenerator>,
    limit: usize,
}

impl BatchOrchestrator {
    /// Allow at most `limit` concurrent calls to `generator` (at least one).
    #[must_use]
    pub fn new(generator: Arc<dyn ImageGenerator>, limit: usize) -> Self {
        Self { generator, limit: limit.max(1) }
    }

    /// Spawn one task per prompt and return the stream of their results.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run(&self, model: &str, prompts: Vec<String>) -> BatchResults {
        let gate = Arc::new(Semaphore::new(self.limit));
        let (tx, rx) = mpsc::unbounded_channel();
        let total = prompts.len();

        tracing::info!(total, limit = self.limit, model, "starting batch");

        for (index, prompt) in prompts.into_iter().enumerate() {
            let gate = Arc::clone(&gate);
            let generator = Arc::clone(&self.generator);
            let tx = tx.clone();
            let request = ImageRequest { model: model.to_string(), prompt };

            tokio::spawn(async move {
                let outcome = match gate.acquire().await {
                    Ok(_permit) => guarded_generate(generator, request.clone()).await,
                    // The gate is owned by this batch and never closed.
                    Err(e) => Err(ImageError::Internal(format!("concurrency gate: {e}"))),
                };
                if let Err(e) = &outcome {
                    tracing::warn!(index, error = %e, "batch item failed");
                }
                // The receiver may be gone; the task still ran to completion.
                let _ = tx.send(GenerationResult::new(index, request.prompt, outcome));
            });
        }

        BatchResults { rx, total }
    }
}

/// Run one generation in its own task so a panic becomes an error.
async fn guarded_generate(
    generator: Arc<dyn ImageGenerator>,
    request: ImageRequest,
) -> Result<GeneratedImage, ImageError> {
    tokio::spawn(async move { generator.generate(&request).await })
        .await
        .unwrap_or_else(|e| Err(ImageError::Internal(format!("generation task failed: {e}"))))
}

/// Analyze every prompt concurrently; results keep the input order.
///
/// A failed or panicked analysis yields an error in its slot and does not
/// affect the others. Must be called from within a Tokio runtime.
pub async fn analyze_all(
    analyzer: Arc<dyn PromptAnalyzer>,
    prompts: &[String],
) -> Vec<Result<PromptAnalysis, ImageError>> {
    let handles: Vec<_> = prompts
        .iter()
        .map(|prompt| {
            let analyzer = Arc::clone(&analyzer);
            let prompt = prompt.clone();
            tokio::spawn(async move { analyzer.analyze(&prompt).await })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await.unwrap_or_else(|e| {
            Err(ImageError::Internal(format!("analysis task failed: {e}")))
        }));
    }
    results
}
