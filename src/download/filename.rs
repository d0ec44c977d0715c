//! Artifact filename derivation from download URLs.

use url::Url;

use super::error::DownloadError;

/// Returns the percent-decoded last path segment of `url`.
///
/// The result is used verbatim as the local filename and as the unique
/// `filename` key of the provenance table, so anything that could escape the
/// platform directory is rejected rather than rewritten.
///
/// # Errors
///
/// Returns [`DownloadError::InvalidFilename`] for URLs ending in `/`, for
/// `.`/`..`, and for names that contain path separators or control characters.
pub fn artifact_filename(url: &Url) -> Result<String, DownloadError> {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let decoded = urlencoding::decode(last)
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| last.to_string());

    if is_safe_filename(&decoded) {
        Ok(decoded)
    } else {
        Err(DownloadError::invalid_filename(url.as_str()))
    }
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.chars().any(|c| matches!(c, '/' | '\\') || c.is_control())
}
