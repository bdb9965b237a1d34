//! Tag normalization.
//!
//! Storefront APIs return tags as a JSON array while admin-style APIs return
//! a single comma-joined string. Both end up as `Vec<String>`.

use serde::{Deserialize, Deserializer};

/// Splits a comma-joined tag string into trimmed, non-empty tags.
#[must_use]
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<String>),
    Joined(String),
}

/// Serde helper accepting either a tag list, a comma-joined string, or `null`.
///
/// ```ignore
/// #[serde(default, deserialize_with = "prodex_core::tags::deserialize")]
/// tags: Vec<String>,
/// ```
///
/// # Errors
///
/// Fails when the value is neither a string, a list of strings, nor `null`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawTags>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawTags::List(tags)) => tags
            .into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .collect(),
        Some(RawTags::Joined(joined)) => split_tags(&joined),
        None => Vec::new(),
    })
}
