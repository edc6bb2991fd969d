//! Utility functions for common operations.

use crate::error::FetchError;
use url::Url;

/// Turns a chapter title into a file stem that stays inside the output directory.
///
/// Path separators and NUL are replaced with `_`; a title that is empty or
/// consists only of dots becomes `_`.
pub fn file_stem(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    if stem.trim_matches('.').is_empty() {
        "_".to_string()
    } else {
        stem
    }
}

/// Resolves a chapter link against the server origin.
///
/// Absolute links are returned unchanged.
pub fn resolve_url(origin: &Url, href: &str) -> Result<Url, FetchError> {
    origin
        .join(href)
        .map_err(|e| FetchError::InvalidUrl(format!("{href}: {e}")))
}
