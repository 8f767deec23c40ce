//! CLI argument parsing and offline command tests: no network I/O.
//!
//! Invalid arguments must be rejected before any cassette or live adapter is
//! consulted. `classify` and template `enhance` never need an API key.

use assert_cmd::Command;
use predicates::prelude::*;

/// Binary with an isolated, nonexistent config file and no key or replay mode.
fn cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nanobanana");
    cmd.args(["--config", "/nonexistent/nanobanana/config.toml"])
        .env_remove("GOOGLE_API_KEY")
        .env_remove("NANOBANANA_REPLAY")
        .env_remove("NANOBANANA_REC")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn classify_prints_domain_json() {
    cmd()
        .args(["classify", "AWS architecture diagram"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""domain": "diagrams""#))
        .stdout(predicate::str::contains(r#""suggested_subcategory": "architecture""#));
}

#[test]
fn classify_without_keywords_defaults_to_photography() {
    cmd()
        .args(["classify", "zzz"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""domain": "photography""#))
        .stdout(predicate::str::contains(r#""confidence": 0.5"#));
}

#[test]
fn enhance_substitutes_subject() {
    cmd()
        .args([
            "enhance",
            "CEO",
            "--domain",
            "photography",
            "--subcategory",
            "portrait",
            "-q",
            "expert",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("CEO, award-winning professional corporate portrait"))
        .stdout(predicate::str::contains(r#""quality": "expert""#));
}

#[test]
fn enhance_unknown_domain_fails() {
    cmd()
        .args(["enhance", "a cat", "--domain", "music"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown domain: music"));
}

#[test]
fn missing_prompt_exits_with_error() {
    cmd()
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Provide a prompt string"));
}

#[test]
fn invalid_model_exits_with_error() {
    cmd()
        .args(["generate", "--model", "dall-e-3", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown model 'dall-e-3'"));
}

#[test]
fn invalid_format_exits_with_error() {
    cmd()
        .args(["generate", "--format", "gif", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported format"));
}

#[test]
fn invalid_quality_exits_with_error() {
    cmd()
        .args(["generate", "--quality", "ultra", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid quality: ultra"));
}

#[test]
fn live_generate_without_key_fails() {
    cmd()
        .args(["generate", "a cat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key").and(predicate::str::contains("GOOGLE_API_KEY")));
}

#[test]
fn batch_of_only_comments_fails() {
    let path = std::env::temp_dir().join("nanobanana_cli_empty_batch.txt");
    std::fs::write(&path, "# nothing here\n\n").unwrap();

    cmd()
        .args(["batch", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No prompts in"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn llm_enhance_without_key_fails() {
    cmd()
        .args(["enhance", "a red kettle", "--llm"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key"));
}
