//! nanobanana - prompt-aware image generation service and CLI.

mod adapters;
mod api;
mod batch;
mod cassette;
mod classifier;
mod cli;
mod config;
mod context;
mod enhancer;
mod error;
mod logging;
mod model;
mod output;
mod params;
mod pipeline;
mod ports;
mod retry;
mod templates;

use std::net::SocketAddr;
use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;

use crate::api::AppState;
use crate::batch::{analyze_all, BatchOrchestrator, GenerationResult};
use crate::cli::{Cli, Command, GenerationOptions};
use crate::config::Config;
use crate::context::{load_templates, Mode, RecordingSession, ServiceContext};
use crate::error::ImageError;
use crate::model::{is_alias, resolve_model};
use crate::output::{batch_filename, resolve_output_path, save_image};
use crate::params::validate_format;
use crate::pipeline::{Overrides, PreparedPrompt};
use crate::ports::ImageRequest;
use crate::templates::{Quality, TemplateStore};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ImageError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(ImageError::Config)?;
    logging::init_logging(&config.logging, cli.verbose);

    match cli.command {
        Command::Serve { host, port } => serve(&config, host, port).await,
        Command::Generate { prompt, prompt_file, subcategory, output, options } => {
            let prompt = cli::resolve_prompt(prompt.as_deref(), prompt_file.as_deref())?;
            generate(&config, &prompt, subcategory.as_deref(), output.as_deref(), &options, cli.verbose)
                .await
        }
        Command::Batch { file, concurrency, output_dir, options } => {
            batch(&config, &file, concurrency, &output_dir, &options).await
        }
        Command::Classify { prompt } => classify(&config, &prompt),
        Command::Enhance { prompt, llm: true, .. } => {
            let (ctx, _session) = ServiceContext::for_mode(&Mode::from_env(), &config)?;
            let analysis = ctx.require_analyzer()?.analyze(&prompt).await?;
            print_json(&analysis)
        }
        Command::Enhance { prompt, domain, subcategory, quality, llm: false } => {
            let quality = resolve_quality(quality.as_deref(), &config)?;
            let overrides =
                Overrides { domain: domain.as_deref(), subcategory: subcategory.as_deref() };
            let store = load_templates(&config)?;
            let prepared = pipeline::prepare(&store, &prompt, quality, overrides)?;
            print_json(&prepared.enhanced)
        }
    }
}

/// Tier from the flag, else from the config file.
fn resolve_quality(flag: Option<&str>, config: &Config) -> Result<Quality, ImageError> {
    flag.unwrap_or(&config.generation.quality).parse().map_err(ImageError::InvalidArgument)
}

/// Check the shared generation flags before any adapter is built.
fn validate_options(
    options: &GenerationOptions,
    config: &Config,
) -> Result<(String, Quality), ImageError> {
    let model = options.model.clone().unwrap_or_else(|| config.generation.model.clone());
    resolve_model(&model).map_err(ImageError::UnknownModel)?;
    let quality = resolve_quality(options.quality.as_deref(), config)?;
    validate_format(&options.format).map_err(ImageError::InvalidArgument)?;
    Ok((model, quality))
}

/// Template enhancement of `prompt`.
fn template_prompt(
    store: &TemplateStore,
    prompt: &str,
    quality: Quality,
    subcategory: Option<&str>,
) -> Result<String, ImageError> {
    let overrides = Overrides { domain: None, subcategory };
    let PreparedPrompt { enhanced, .. } = pipeline::prepare(store, prompt, quality, overrides)?;
    Ok(enhanced.text)
}

/// The text sent to the model for each prompt, in input order.
///
/// With `--llm`, prompts the text model cannot handle fall back to the
/// templates.
async fn model_prompts(
    ctx: &ServiceContext,
    prompts: &[String],
    quality: Quality,
    subcategory: Option<&str>,
    options: &GenerationOptions,
) -> Result<Vec<String>, ImageError> {
    if options.raw {
        return Ok(prompts.to_vec());
    }
    let analyses: Vec<_> = if options.llm {
        analyze_all(ctx.require_analyzer()?, prompts).await.into_iter().map(Some).collect()
    } else {
        std::iter::repeat_with(|| None).take(prompts.len()).collect()
    };

    prompts
        .iter()
        .zip(analyses)
        .map(|(prompt, analysis)| match analysis {
            Some(Ok(analysis)) => Ok(analysis.enhanced_prompt),
            Some(Err(e)) => {
                tracing::warn!(%prompt, error = %e, "LLM enhancement failed, using templates");
                template_prompt(&ctx.templates, prompt, quality, subcategory)
            }
            None => template_prompt(&ctx.templates, prompt, quality, subcategory),
        })
        .collect()
}

fn finish_recording(session: Option<RecordingSession>) {
    if let Some(session) = session {
        match session.save() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => eprintln!("Warning: failed to save cassette: {e}"),
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), ImageError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ImageError::InvalidArgument(format!("Failed to render output: {e}")))?;
    println!("{text}");
    Ok(())
}

async fn serve(config: &Config, host: Option<String>, port: Option<u16>) -> Result<(), ImageError> {
    if !is_alias(&config.generation.model) {
        return Err(ImageError::Config(format!(
            "generation.model must be an alias (flash/pro) to serve, got '{}'",
            config.generation.model
        )));
    }
    let default_quality = resolve_quality(None, config)?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or_else(|| config.port());
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| ImageError::Config(format!("Invalid listen address {host}:{port}: {e}")))?;

    let (ctx, session) = ServiceContext::for_mode(&Mode::from_env(), config)?;
    let state = AppState {
        default_model: config.generation.model.clone(),
        default_quality,
        analyzer: ctx.analyzer,
        ..AppState::new(ctx.templates, ctx.generator)
    };

    let served = api::serve(state, addr).await;
    finish_recording(session);
    served
}

async fn generate(
    config: &Config,
    prompt: &str,
    subcategory: Option<&str>,
    output: Option<&str>,
    options: &GenerationOptions,
    verbose: bool,
) -> Result<(), ImageError> {
    let (model, quality) = validate_options(options, config)?;
    let (ctx, session) = ServiceContext::for_mode(&Mode::from_env(), config)?;

    let mut texts =
        model_prompts(&ctx, &[prompt.to_string()], quality, subcategory, options).await?;
    let text = texts.pop().ok_or_else(|| ImageError::Internal("prompt was not prepared".into()))?;
    if verbose {
        eprintln!("Model: {model}");
        eprintln!("Prompt: {text}");
    }

    let result = ctx.generator.generate(&ImageRequest { model, prompt: text }).await;
    finish_recording(session);
    let image = result?;

    let output_path = resolve_output_path(output, prompt, &options.format);
    save_image(&image.data, &image.mime_type, &options.format, &output_path)?;
    eprintln!("Saved: {}", output_path.display());
    Ok(())
}

async fn batch(
    config: &Config,
    file: &Path,
    concurrency: Option<usize>,
    output_dir: &Path,
    options: &GenerationOptions,
) -> Result<(), ImageError> {
    let prompts = cli::read_batch_prompts(file)?;
    if prompts.is_empty() {
        return Err(ImageError::InvalidArgument(format!("No prompts in {}", file.display())));
    }
    let (model, quality) = validate_options(options, config)?;
    let (ctx, session) = ServiceContext::for_mode(&Mode::from_env(), config)?;

    let texts = model_prompts(&ctx, &prompts, quality, None, options).await?;
    std::fs::create_dir_all(output_dir)?;

    let limit = concurrency.unwrap_or(config.generation.concurrency);
    let orchestrator = BatchOrchestrator::new(Arc::clone(&ctx.generator), limit);
    let mut results = orchestrator.run(&model, texts);
    let total = results.total();

    let mut done = 0;
    let mut failed = 0;
    while let Some(result) = results.next().await {
        done += 1;
        let index = result.index();
        let original = prompts.get(index).map_or("", String::as_str);
        tracing::debug!(index, sent = result.prompt(), ok = result.is_success(), "batch result");

        let outcome = match result {
            GenerationResult::Success { image, size, .. } => {
                let path = output_dir.join(batch_filename(index, original, &options.format));
                save_image(&image.data, &image.mime_type, &options.format, &path)
                    .map(|()| format!("{} ({size} bytes)", path.display()))
            }
            GenerationResult::Failure { error, .. } => Err(error),
        };
        match outcome {
            Ok(saved) => eprintln!("✓ [{done}/{total}] {saved}"),
            Err(e) => {
                failed += 1;
                eprintln!("✗ [{done}/{total}] {original:?}: {e}");
            }
        }
    }

    finish_recording(session);
    eprintln!("Done: {} succeeded, {failed} failed", total - failed);
    if failed > 0 {
        return Err(ImageError::BatchIncomplete { failed, total });
    }
    Ok(())
}

fn classify(config: &Config, prompt: &str) -> Result<(), ImageError> {
    let store = load_templates(config)?;
    let classification = classifier::classify(prompt);
    let domain = classification.domain.as_str();
    let scores: serde_json::Map<String, serde_json::Value> = classifier::scores(prompt)
        .iter()
        .map(|(d, n)| (d.as_str().to_string(), n.into()))
        .collect();

    print_json(&serde_json::json!({
        "domain": classification.domain,
        "confidence": classification.confidence,
        "scores": scores,
        "suggested_subcategory": enhancer::suggest_subcategory(&store, prompt, domain),
        "available_subcategories": store.subcategories(domain),
    }))
}
