//! Validation of user-supplied output parameters.

/// Output formats accepted for images written to disk.
pub const FILE_FORMATS: [&str; 3] = ["png", "jpeg", "webp"];

/// The only inline encoding the HTTP service returns.
pub const RESPONSE_FORMAT: &str = "base64";

/// Validate the output format parameter.
///
/// # Errors
///
/// Returns an error if the format is not recognized.
pub fn validate_format(format: &str) -> Result<(), String> {
    if FILE_FORMATS.contains(&format) {
        Ok(())
    } else {
        Err(format!("Unsupported format '{format}'. Valid: png, jpeg, webp"))
    }
}

/// Validate the response format of an HTTP generation request.
///
/// # Errors
///
/// Returns an error for anything but `base64`.
pub fn validate_response_format(format: &str) -> Result<(), String> {
    if format == RESPONSE_FORMAT {
        Ok(())
    } else {
        Err(format!("Invalid format: {format}. Only '{RESPONSE_FORMAT}' is supported"))
    }
}

/// Get the file extension for an output format.
#[must_use]
pub fn format_extension(format: &str) -> &'static str {
    match format {
        "png" => "png",
        "webp" => "webp",
        // jpeg and any unknown format default to jpg
        _ => "jpg",
    }
}

/// Map a MIME type returned by the API to an output format, if known.
#[must_use]
pub fn format_for_mime(mime: &str) -> Option<&'static str> {
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpeg"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}
