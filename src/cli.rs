//! CLI argument parsing with clap.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

/// Prompt-aware image generation with Gemini: classify, enhance, generate, serve.
#[derive(Parser, Debug)]
#[command(name = "nanobanana", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose output (debug logging).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to bind (default from config).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (default from config or `PORT`).
        #[arg(long)]
        port: Option<u16>,
    },

    /// Generate one image and save it to disk.
    Generate {
        /// Text prompt describing the desired image.
        #[arg(conflicts_with = "prompt_file")]
        prompt: Option<String>,

        /// Path to a file containing the prompt text.
        #[arg(short = 'p', long, conflicts_with = "prompt")]
        prompt_file: Option<String>,

        /// Subcategory template to use instead of the suggested one.
        #[arg(long)]
        subcategory: Option<String>,

        /// Output file path (auto-generated if not specified).
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        options: GenerationOptions,
    },

    /// Generate one image per line of a prompt file, concurrently.
    Batch {
        /// File with one prompt per line; blank lines and `#` comments are skipped.
        file: PathBuf,

        /// Maximum number of simultaneous API calls (default from config).
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Directory the images are written to.
        #[arg(short = 'd', long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        options: GenerationOptions,
    },

    /// Show which domain a prompt falls into.
    Classify {
        /// Prompt to classify.
        prompt: String,
    },

    /// Show the prompt that would be sent to the model.
    Enhance {
        /// Prompt to enhance.
        prompt: String,

        /// Domain to use instead of the classified one.
        #[arg(long)]
        domain: Option<String>,

        /// Subcategory to use instead of the suggested one.
        #[arg(long)]
        subcategory: Option<String>,

        /// Template tier: basic, detailed, expert (default from config).
        #[arg(short, long)]
        quality: Option<String>,

        /// Ask the text model to analyze and rewrite the prompt instead.
        #[arg(long, conflicts_with_all = ["domain", "subcategory", "quality"])]
        llm: bool,
    },
}

/// Flags shared by the commands that call the API.
#[derive(Args, Debug)]
pub struct GenerationOptions {
    /// Model alias (`flash`, `pro`) or full model id (default from config).
    #[arg(short, long)]
    pub model: Option<String>,

    /// Template tier: basic, detailed, expert (default from config).
    #[arg(short, long)]
    pub quality: Option<String>,

    /// Send the prompt verbatim, skipping classification and templates.
    #[arg(long)]
    pub raw: bool,

    /// Let the text model rewrite the prompt; templates are the fallback.
    #[arg(long, conflicts_with = "raw")]
    pub llm: bool,

    /// Output format: png, jpeg, webp.
    #[arg(short, long, default_value = "png")]
    pub format: String,
}

/// Resolve a prompt from either a positional argument or a file.
///
/// # Errors
///
/// Returns an error if neither is provided, or if the file cannot be read.
pub fn resolve_prompt(
    prompt: Option<&str>,
    prompt_file: Option<&str>,
) -> Result<String, std::io::Error> {
    if let Some(text) = prompt {
        Ok(text.to_string())
    } else if let Some(path) = prompt_file {
        Ok(std::fs::read_to_string(path)?.trim().to_string())
    } else {
        Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Provide a prompt string or use -p/--prompt-file",
        ))
    }
}

/// Read the prompts of a batch file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_batch_prompts(path: &Path) -> Result<Vec<String>, std::io::Error> {
    Ok(parse_batch_prompts(&std::fs::read_to_string(path)?))
}

/// One prompt per line; surrounding whitespace, blank lines and `#` lines dropped.
#[must_use]
pub fn parse_batch_prompts(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
