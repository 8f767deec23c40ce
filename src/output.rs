//! File naming, image saving, and format conversion.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ImageError;
use crate::params::{format_extension, format_for_mime};

/// Generate an output filename from a prompt and format.
///
/// Sanitizes the first 50 characters of the prompt to kebab-case,
/// appends a unix timestamp, and adds the appropriate file extension.
#[must_use]
pub fn auto_filename(prompt: &str, format: &str) -> String {
    let sanitized = sanitize_for_filename(prompt, 50);
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let ext = format_extension(format);
    format!("{sanitized}-{timestamp}.{ext}")
}

/// Sanitize a string for use in a filename.
///
/// Converts to lowercase, replaces non-alphanumeric chars with hyphens,
/// collapses consecutive hyphens, and trims to max length.
#[must_use]
pub fn sanitize_for_filename(input: &str, max_len: usize) -> String {
    let mut result = String::with_capacity(max_len);
    let mut last_was_hyphen = true; // Prevents leading hyphen

    for ch in input.chars().take(max_len * 2) {
        if result.len() >= max_len {
            break;
        }
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            result.push('-');
            last_was_hyphen = true;
        }
    }

    // Trim trailing hyphen
    while result.ends_with('-') {
        result.pop();
    }

    if result.is_empty() {
        "image".to_string()
    } else {
        result
    }
}

/// Name of the file written for the prompt at `index` of a batch.
///
/// Numbered from one and zero-padded so a directory listing follows the
/// input order: `03_a-red-fox.png`.
#[must_use]
pub fn batch_filename(index: usize, prompt: &str, format: &str) -> String {
    let slug = sanitize_for_filename(prompt, 40);
    format!("{:02}_{slug}.{}", index + 1, format_extension(format))
}

/// Save raw image bytes to a file, converting format if necessary.
///
/// # Errors
///
/// Returns an error if the file cannot be written or format conversion fails.
pub fn save_image(
    data: &[u8],
    source_mime: &str,
    target_format: &str,
    output_path: &Path,
) -> Result<(), ImageError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let needs_conversion = !mime_matches_format(source_mime, target_format);
    tracing::debug!(
        path = %output_path.display(),
        source_mime,
        target_format,
        needs_conversion,
        "saving image"
    );

    if needs_conversion {
        convert_and_save(data, target_format, output_path)
    } else {
        std::fs::write(output_path, data).map_err(ImageError::Io)
    }
}

/// Check if a MIME type matches the requested output format.
fn mime_matches_format(mime: &str, format: &str) -> bool {
    format_for_mime(mime) == Some(format)
}

/// Convert image bytes to the target format and save.
fn convert_and_save(
    data: &[u8],
    target_format: &str,
    output_path: &Path,
) -> Result<(), ImageError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ImageError::ImageConversion(format!("Failed to decode image: {e}")))?;

    let image_format = match target_format {
        "jpeg" => image::ImageFormat::Jpeg,
        "png" => image::ImageFormat::Png,
        "webp" => image::ImageFormat::WebP,
        other => {
            return Err(ImageError::ImageConversion(format!("Unsupported format: {other}")));
        }
    };

    img.save_with_format(output_path, image_format)
        .map_err(|e| ImageError::ImageConversion(format!("Failed to save as {target_format}: {e}")))
}

/// Resolve the output path: use explicit path or auto-generate.
#[must_use]
pub fn resolve_output_path(explicit: Option<&str>, prompt: &str, format: &str) -> PathBuf {
    match explicit {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(auto_filename(prompt, format)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_kebab() {
        assert_eq!(sanitize_for_filename("AWS Architecture Diagram", 50), "aws-architecture-diagram");
        assert_eq!(
            sanitize_for_filename("  CEO headshot, studio lighting!!  ", 50),
            "ceo-headshot-studio-lighting"
        );
    }

    #[test]
    fn slugs_respect_max_len_and_never_end_in_hyphen() {
        let slug = sanitize_for_filename("watercolor of a fox in the snow", 12);
        assert!(slug.len() <= 12);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn prompts_without_ascii_fall_back_to_image() {
        assert_eq!(sanitize_for_filename("", 50), "image");
        assert_eq!(sanitize_for_filename("??? ¡¿", 50), "image");
    }

    #[test]
    fn auto_names_carry_slug_and_extension() {
        let name = auto_filename("a red fox", "webp");
        assert!(name.starts_with("a-red-fox-"));
        assert_eq!(Path::new(&name).extension().unwrap(), "webp");
        assert_eq!(Path::new(&auto_filename("x", "jpeg")).extension().unwrap(), "jpg");
    }

    #[test]
    fn explicit_output_path_wins() {
        assert_eq!(
            resolve_output_path(Some("out/fox.png"), "ignored", "jpeg"),
            PathBuf::from("out/fox.png")
        );
        let auto = resolve_output_path(None, "a red fox", "png");
        assert!(auto.to_str().unwrap().starts_with("a-red-fox-"));
    }

    #[test]
    fn batch_names_are_numbered_from_one() {
        assert_eq!(batch_filename(0, "A red fox!", "png"), "01_a-red-fox.png");
        assert_eq!(batch_filename(11, "", "jpeg"), "12_image.jpg");
    }

    #[test]
    fn save_without_conversion_writes_bytes() {
        let dir = std::env::temp_dir().join("nanobanana_output_save_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested/raw.png");

        save_image(b"not really a png", "image/png", "png", &path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"not really a png");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_converts_png_to_jpeg() {
        let png = {
            let img = image::DynamicImage::new_rgb8(2, 2);
            let mut buf = std::io::Cursor::new(Vec::new());
            img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
            buf.into_inner()
        };
        let dir = std::env::temp_dir().join("nanobanana_output_convert_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("converted.jpg");

        save_image(&png, "image/png", "jpeg", &path).unwrap();
        let written = std::fs::read(&path).unwrap();
        assert_eq!(&written[..2], &[0xFF, 0xD8]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn undecodable_bytes_fail_conversion() {
        let path = std::env::temp_dir().join("nanobanana_output_garbage.webp");
        let err = save_image(b"garbage", "image/png", "webp", &path).unwrap_err();
        assert!(matches!(err, ImageError::ImageConversion(_)));
    }

    #[test]
    fn mime_matches() {
        assert!(mime_matches_format("image/jpeg", "jpeg"));
        assert!(mime_matches_format("image/png", "png"));
        assert!(mime_matches_format("image/webp", "webp"));
        assert!(!mime_matches_format("image/jpeg", "png"));
        assert!(!mime_matches_format("image/png", "jpeg"));
    }
}
