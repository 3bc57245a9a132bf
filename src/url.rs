//! URL extraction from pasted text.

use std::sync::LazyLock;

use regex::Regex;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).expect("valid regex"));

static YOUTUBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:[a-z0-9-]+\.)*(?:youtube\.com|youtu\.be|youtube-nocookie\.com)(?:[/:?#]|$)")
        .expect("valid regex")
});

/// Returns the first `http(s)://` URL found in `input`.
///
/// Users often paste a link together with surrounding text (share sheets add a
/// title line), so the whole input is scanned.
#[must_use]
pub fn extract_url(input: &str) -> Option<String> {
    URL_RE
        .find(input.trim())
        .map(|m| m.as_str().trim_end_matches([',', '.', ';', ')']).to_string())
}

/// Returns the URL to hand to the engine.
///
/// Prefers an `http(s)://` link found in `input`; otherwise the trimmed input
/// is passed through as is, since yt-dlp also accepts schemeless links and
/// bare video IDs. Returns `None` only for blank input.
#[must_use]
pub fn resolve_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(extract_url(trimmed).unwrap_or_else(|| trimmed.to_string()))
}

/// Returns true if `url` points at a YouTube host.
#[must_use]
pub fn is_youtube_url(url: &str) -> bool {
    YOUTUBE_RE.is_match(&url.to_ascii_lowercase())
}
