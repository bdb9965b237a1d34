//! Text transforms applied to the business-format export.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static BLOCK_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:p|div|li|h[1-6])\s*>|<br\s*/?>").expect("valid regex")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
/// A run of periods that ends a sentence: followed by whitespace or the end
/// of the text. Decimal points (`1.5`) are left alone.
static PERIOD_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\.(?:\s*\.)*(?:\s+|$)").expect("valid regex"));
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+").expect("valid regex"));

/// Capitalizes the first letter of each whitespace-delimited token and
/// lowercases the rest: `"CAMISA de LINO"` → `"Camisa De Lino"`.
#[must_use]
pub fn to_proper_case(text: &str) -> String {
    WORD.replace_all(text, |caps: &Captures<'_>| {
        let mut chars = caps[0].chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    })
    .into_owned()
}

/// Turns description markup into one line of plain sentences.
///
/// Block closers and line breaks become sentence breaks, remaining tags are
/// dropped, a handful of common entities are decoded, whitespace is
/// collapsed, period runs are reduced to a single `". "`, and the result ends
/// with terminal punctuation: `"<p>Hello</p><br>World"` → `"Hello. World."`.
#[must_use]
pub fn clean_html_description(html: &str) -> String {
    let text = BLOCK_BREAK.replace_all(html, ". ");
    let text = TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    let text = WHITESPACE.replace_all(&text, " ");
    let text = PERIOD_RUN.replace_all(&text, ". ");

    let mut cleaned = text
        .trim()
        .trim_start_matches(|c: char| c == '.' || c.is_whitespace())
        .to_owned();
    if !cleaned.is_empty() && !cleaned.ends_with(['.', '!', '?']) {
        cleaned.push('.');
    }
    cleaned
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Drops the query string (CDN cache busters, size hints) from an image URL.
#[must_use]
pub fn clean_image_url(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proper_case_capitalizes_each_token() {
        assert_eq!(to_proper_case("CAMISA de LINO"), "Camisa De Lino");
        assert_eq!(to_proper_case("  taza  ñandú "), "  Taza  Ñandú ");
        assert_eq!(to_proper_case(""), "");
    }

    #[test]
    fn clean_description_paragraph_then_break() {
        assert_eq!(clean_html_description("<p>Hello</p><br>World"), "Hello. World.");
    }

    #[test]
    fn clean_description_handles_lists_and_headings() {
        let html = "<h2>Detalles</h2><ul><li>Algodón</li><li>Hecho en México</li></ul>";
        assert_eq!(
            clean_html_description(html),
            "Detalles. Algodón. Hecho en México."
        );
    }

    #[test]
    fn clean_description_keeps_decimal_points() {
        assert_eq!(
            clean_html_description("<p>Peso 1.5 kg</p>"),
            "Peso 1.5 kg."
        );
    }

    #[test]
    fn clean_description_collapses_whitespace_and_entities() {
        assert_eq!(
            clean_html_description("<div>Uno&nbsp;&amp;\n\n dos</div>"),
            "Uno & dos."
        );
    }

    #[test]
    fn clean_description_keeps_existing_terminal_punctuation() {
        assert_eq!(clean_html_description("¿Listo?"), "¿Listo?");
        assert_eq!(clean_html_description("<br/>Fin."), "Fin.");
    }

    #[test]
    fn clean_description_empty_input() {
        assert_eq!(clean_html_description(""), "");
        assert_eq!(clean_html_description("<p></p>"), "");
    }

    #[test]
    fn clean_description_is_idempotent() {
        let once = clean_html_description("<p>Hola</p><p>Mundo...</p>");
        assert_eq!(clean_html_description(&once), once);
    }

    #[test]
    fn clean_image_url_strips_query() {
        assert_eq!(
            clean_image_url("https://cdn.shopify.com/files/a.jpg?v=123&width=800"),
            "https://cdn.shopify.com/files/a.jpg"
        );
    }

    #[test]
    fn clean_image_url_is_idempotent() {
        let clean = "https://tienda.example.com/31/camisa-lino.jpg";
        assert_eq!(clean_image_url(clean), clean);
        assert_eq!(clean_image_url(clean_image_url(&format!("{clean}?a=1"))), clean);
    }
}
