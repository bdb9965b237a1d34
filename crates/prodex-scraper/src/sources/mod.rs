//! Platform adapters.
//!
//! Every adapter turns one platform's catalog API into a lazy stream of
//! [`CanonicalProduct`] batches. Streams are finite, start over on every
//! [`Source::extract`] call, and end after the first error.

mod prestashop;
mod shopify;
mod tiendanube;
mod vtex;
mod woocommerce;

use std::fmt;
use std::future::Future;

use futures::stream::{self, BoxStream, StreamExt};
use prodex_core::{CanonicalProduct, CanonicalVariant, Platform};

use crate::client::CatalogClient;
use crate::error::ScraperError;

pub use prestashop::PrestaShop;
pub use shopify::{ShopifyAdmin, ShopifyPublic, SHOPIFY_ADMIN_API_VERSION};
pub use tiendanube::TiendaNube;
pub use vtex::Vtex;
pub use woocommerce::WooCommerce;

/// Upper bound on pages requested from a single catalog.
pub const MAX_PAGES: usize = 2000;

/// Store identifier used when nothing better can be derived.
pub const FALLBACK_STORE_IDENTIFIER: &str = "export";

/// Stream of product batches produced by an adapter.
pub type BatchStream<'a> = BoxStream<'a, Result<Vec<CanonicalProduct>, ScraperError>>;

/// A configured catalog source: platform plus the credentials to read it.
#[derive(Debug, Clone)]
pub enum Source {
    ShopifyPublic(ShopifyPublic),
    ShopifyAdmin(ShopifyAdmin),
    PrestaShop(PrestaShop),
    Vtex(Vtex),
    TiendaNube(TiendaNube),
    WooCommerce(WooCommerce),
}

impl Source {
    #[must_use]
    pub fn platform(&self) -> Platform {
        match self {
            Source::ShopifyPublic(_) | Source::ShopifyAdmin(_) => Platform::Shopify,
            Source::PrestaShop(_) => Platform::PrestaShop,
            Source::Vtex(_) => Platform::Vtex,
            Source::TiendaNube(_) => Platform::TiendaNube,
            Source::WooCommerce(_) => Platform::WooCommerce,
        }
    }

    /// Identifier embedded in export filenames.
    #[must_use]
    pub fn store_identifier(&self) -> String {
        let id = match self {
            Source::ShopifyPublic(s) => s.store_identifier(),
            Source::ShopifyAdmin(s) => s.store_identifier(),
            Source::PrestaShop(s) => s.store_identifier(),
            Source::Vtex(s) => s.store_identifier(),
            Source::TiendaNube(s) => s.store_identifier(),
            Source::WooCommerce(s) => s.store_identifier(),
        };
        if id.is_empty() {
            FALLBACK_STORE_IDENTIFIER.to_owned()
        } else {
            id
        }
    }

    /// Starts a fresh extraction.
    pub fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        match self {
            Source::ShopifyPublic(s) => s.extract(client),
            Source::ShopifyAdmin(s) => s.extract(client),
            Source::PrestaShop(s) => s.extract(client),
            Source::Vtex(s) => s.extract(client),
            Source::TiendaNube(s) => s.extract(client),
            Source::WooCommerce(s) => s.extract(client),
        }
    }
}

/// Credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct Secret(String);

impl Secret {
    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// Rejects blank credentials before any request is made.
pub(crate) fn require(field: &str, value: &str) -> Result<String, ScraperError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScraperError::InvalidInput {
            input: field.to_owned(),
            reason: format!("{field} must not be empty"),
        });
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn require_secret(field: &str, value: &str) -> Result<Secret, ScraperError> {
    require(field, value).map(Secret)
}

/// Walks a page-numbered endpoint from page 1 until a page comes back empty.
///
/// `fetch_page` returns the normalized products of one page. An empty page
/// ends the stream without being yielded.
pub(crate) fn numbered_pages<'a, F, Fut>(
    platform: Platform,
    endpoint: String,
    fetch_page: F,
) -> BatchStream<'a>
where
    F: FnMut(u32) -> Fut + Send + 'a,
    Fut: Future<Output = Result<Vec<CanonicalProduct>, ScraperError>> + Send + 'a,
{
    stream::try_unfold((1u32, fetch_page), move |(page, mut fetch_page)| {
        let endpoint = endpoint.clone();
        async move {
            if page as usize > MAX_PAGES {
                return Err(ScraperError::PaginationLimit {
                    url: endpoint,
                    max_pages: MAX_PAGES,
                });
            }

            let batch = fetch_page(page).await?;
            tracing::debug!(%platform, page, count = batch.len(), "fetched catalog page");

            if batch.is_empty() {
                return Ok(None);
            }
            Ok(Some((batch, (page + 1, fetch_page))))
        }
    })
    .boxed()
}

/// Validates every variant of a normalized product.
pub(crate) fn checked(product: CanonicalProduct) -> Result<CanonicalProduct, ScraperError> {
    for variant in &product.variants {
        variant
            .validate()
            .map_err(|e| ScraperError::Normalization {
                product_id: product.id.to_string(),
                reason: e.to_string(),
            })?;
    }
    Ok(product)
}

/// Variant title: the option join, else the platform's own title, else
/// `"Default Title"`.
pub(crate) fn variant_title(options: &[Option<String>], fallback: Option<&str>) -> String {
    CanonicalVariant::options_title(options)
        .or_else(|| {
            fallback
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| prodex_core::DEFAULT_VARIANT_TITLE.to_owned())
}

/// Spreads up to three option values over `option1..option3`.
pub(crate) fn option_slots(
    values: impl IntoIterator<Item = String>,
) -> [Option<String>; 3] {
    let mut slots: [Option<String>; 3] = [None, None, None];
    for (slot, value) in slots.iter_mut().zip(values) {
        let value = value.trim();
        if !value.is_empty() {
            *slot = Some(value.to_owned());
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_rejects_blank_values() {
        let err = require("api key", "  ").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput { ref input, .. } if input == "api key"));
        assert_eq!(require("api key", " abc ").unwrap(), "abc");
    }

    #[test]
    fn secret_debug_is_redacted() {
        let secret = require_secret("token", "shpat_123").unwrap();
        assert_eq!(format!("{secret:?}"), "[redacted]");
        assert_eq!(secret.expose(), "shpat_123");
    }

    #[test]
    fn variant_title_prefers_options_then_fallback() {
        assert_eq!(
            variant_title(&[Some("M".into()), Some("Rojo".into()), None], Some("ignored")),
            "M / Rojo"
        );
        assert_eq!(variant_title(&[None, None, None], Some("Talla única")), "Talla única");
        assert_eq!(variant_title(&[None], None), "Default Title");
    }

    #[test]
    fn option_slots_fill_positionally_and_drop_extras() {
        let slots = option_slots(["S", "Azul", "Algodón", "Extra"].map(String::from));
        assert_eq!(slots[0].as_deref(), Some("S"));
        assert_eq!(slots[2].as_deref(), Some("Algodón"));
    }

    #[test]
    fn option_slots_skip_blank_values() {
        let slots = option_slots(vec![String::new(), "L".to_owned()]);
        assert!(slots[0].is_none());
        assert_eq!(slots[1].as_deref(), Some("L"));
    }
}
