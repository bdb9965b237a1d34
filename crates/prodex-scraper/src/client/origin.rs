//! Store URL parsing and origin/hostname extraction.

use reqwest::Url;

use crate::error::ScraperError;

/// Parses a user-supplied store URL.
///
/// A missing scheme is assumed to be `https://`, so `"tienda.example.com"` and
/// `"https://tienda.example.com/collections/all"` are both accepted.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidInput`] if the input is blank, does not
/// parse, has a scheme other than HTTP(S), or has no host.
pub fn parse_store_url(input: &str) -> Result<Url, ScraperError> {
    let trimmed = input.trim();
    let invalid = |reason: &str| ScraperError::InvalidInput {
        input: input.to_owned(),
        reason: reason.to_owned(),
    };

    if trimmed.is_empty() {
        return Err(invalid("store URL is empty"));
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|e| ScraperError::InvalidInput {
        input: input.to_owned(),
        reason: format!("not a valid URL: {e}"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("store URL must use http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("store URL has no host"));
    }

    Ok(url)
}

/// Scheme + host (+ port) of a store URL, without a trailing slash.
///
/// Given `https://tienda.example.com/collections/all`, returns
/// `https://tienda.example.com`, so API paths are always joined onto the
/// store root.
#[must_use]
pub fn store_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Hostname of a store URL with a leading `www.` removed.
#[must_use]
pub fn store_hostname(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_owned()
}
