//! Continuation parsing for `Link`-header pagination.
//!
//! Cursor-paginated APIs (Shopify Admin) announce the next page through the
//! `Link` response header:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-04/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-04/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```
//!
//! The whole next URL is the continuation: it already carries `limit` and the
//! opaque `page_info` cursor, and must be requested verbatim.

/// Response header the relay uses to re-expose the upstream next-page URL.
pub const NEXT_PAGE_HEADER: &str = "x-next-page-url";

/// Returns the URL of the `rel="next"` link in a `Link` header value.
///
/// Returns `None` when the header is absent, has no `next` relation, or the
/// `next` segment is not of the form `<URL>; rel="next"`.
#[must_use]
pub fn extract_next_link(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    header
        .split(',')
        .map(str::trim)
        .find(|segment| is_next_relation(segment))
        .and_then(extract_angle_bracket_url)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
}

fn is_next_relation(segment: &str) -> bool {
    segment
        .split(';')
        .skip(1)
        .map(str::trim)
        .any(|param| param == r#"rel="next""# || param == "rel=next")
}

/// Extracts the URL between `<` and `>` in a link directive segment.
fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    if start >= end {
        return None;
    }
    Some(&segment[start..end])
}
