//! Shopify storefront (`products.json`) and Admin REST adapters.

mod normalize;
mod types;

use futures::stream::{self, StreamExt};
use prodex_core::Platform;
use reqwest::Url;

use super::{checked, numbered_pages, require, require_secret, BatchStream, Secret, MAX_PAGES};
use crate::client::{parse_store_url, store_hostname, store_origin, CatalogClient, RequestOptions};
use crate::error::ScraperError;

use normalize::normalize_product;
use types::ShopifyProductsResponse;

/// Admin REST API version used for private-app extraction.
pub const SHOPIFY_ADMIN_API_VERSION: &str = "2024-04";

/// Largest page the products endpoints serve.
const PAGE_LIMIT: u32 = 250;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Public storefront catalog, paged with `?page=N`.
#[derive(Debug, Clone)]
pub struct ShopifyPublic {
    store_url: Url,
}

impl ShopifyPublic {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] if `store_url` is not a usable
    /// store URL.
    pub fn new(store_url: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            store_url: parse_store_url(store_url)?,
        })
    }

    pub(crate) fn store_identifier(&self) -> String {
        store_hostname(&self.store_url)
    }

    /// URL of one storefront page. Any path on the configured URL is dropped.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}/products.json?limit={PAGE_LIMIT}&page={page}",
            store_origin(&self.store_url)
        )
    }

    pub(crate) fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        numbered_pages(Platform::Shopify, self.page_url(1), move |page| {
            self.fetch_page(client, page)
        })
    }

    async fn fetch_page(
        &self,
        client: &CatalogClient,
        page: u32,
    ) -> Result<Vec<prodex_core::CanonicalProduct>, ScraperError> {
        let url = self.page_url(page);
        let fetched = client
            .fetch_json::<ShopifyProductsResponse>(
                &url,
                &RequestOptions::new(),
                &format!("Shopify storefront page {page}"),
            )
            .await?;
        fetched
            .data
            .products
            .into_iter()
            .map(|p| normalize_product(p).and_then(checked))
            .collect()
    }
}

/// Private-app Admin REST catalog, paged by following `Link` cursors.
#[derive(Debug, Clone)]
pub struct ShopifyAdmin {
    store_name: String,
    access_token: Secret,
    base_url: String,
}

impl ShopifyAdmin {
    /// `store` may be the bare store name (`acme`), the `myshopify.com`
    /// domain, or a full admin URL.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] if the store name is malformed
    /// or the access token is blank.
    pub fn new(store: &str, access_token: &str) -> Result<Self, ScraperError> {
        let store_name = normalize_store_name(store)?;
        let access_token = require_secret("access token", access_token)?;
        let base_url = format!("https://{store_name}.myshopify.com");
        Ok(Self {
            store_name,
            access_token,
            base_url,
        })
    }

    /// Points the adapter at a different host; used by tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        base_url.trim_end_matches('/').clone_into(&mut self.base_url);
        self
    }

    pub(crate) fn store_identifier(&self) -> String {
        self.store_name.clone()
    }

    #[must_use]
    pub fn first_page_url(&self) -> String {
        format!(
            "{}/admin/api/{SHOPIFY_ADMIN_API_VERSION}/products.json?limit={PAGE_LIMIT}",
            self.base_url
        )
    }

    pub(crate) fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        let options = RequestOptions::new().header(ACCESS_TOKEN_HEADER, self.access_token.expose());
        let first = self.first_page_url();

        stream::try_unfold(Some((first, 1usize)), move |cursor| {
            let options = options.clone();
            async move {
                let Some((url, page)) = cursor else {
                    return Ok(None);
                };
                if page > MAX_PAGES {
                    return Err(ScraperError::PaginationLimit {
                        url,
                        max_pages: MAX_PAGES,
                    });
                }

                let fetched = client
                    .fetch_json::<ShopifyProductsResponse>(
                        &url,
                        &options,
                        &format!("Shopify Admin page {page}"),
                    )
                    .await?;
                let batch = fetched
                    .data
                    .products
                    .into_iter()
                    .map(|p| normalize_product(p).and_then(checked))
                    .collect::<Result<Vec<_>, _>>()?;
                tracing::debug!(
                    platform = %Platform::Shopify,
                    page,
                    count = batch.len(),
                    has_next = fetched.continuation.is_some(),
                    "fetched admin page"
                );

                let next = fetched.continuation.map(|next| (next, page + 1));
                Ok(Some((batch, next)))
            }
        })
        .boxed()
    }
}

/// Reduces a store reference to its `myshopify.com` subdomain.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidInput`] unless the result is non-empty and
/// made of lowercase letters, digits and hyphens.
pub fn normalize_store_name(raw: &str) -> Result<String, ScraperError> {
    let trimmed = require("store name", raw)?.to_ascii_lowercase();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(&trimmed);
    let host = without_scheme.split('/').next().unwrap_or_default();
    let name = host.strip_suffix(".myshopify.com").unwrap_or(host);

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !valid {
        return Err(ScraperError::InvalidInput {
            input: raw.to_owned(),
            reason: "store name must look like \"my-store\" or \"my-store.myshopify.com\"".to_owned(),
        });
    }
    Ok(name.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_uses_store_root() {
        let source = ShopifyPublic::new("https://tienda.example.com/collections/all").unwrap();
        assert_eq!(
            source.page_url(3),
            "https://tienda.example.com/products.json?limit=250&page=3"
        );
    }

    #[test]
    fn public_store_identifier_drops_www() {
        let source = ShopifyPublic::new("www.tienda.example.com").unwrap();
        assert_eq!(source.store_identifier(), "tienda.example.com");
    }

    #[test]
    fn admin_first_page_url_targets_pinned_api_version() {
        let source = ShopifyAdmin::new("acme", "shpat_1").unwrap();
        assert_eq!(
            source.first_page_url(),
            "https://acme.myshopify.com/admin/api/2024-04/products.json?limit=250"
        );
    }

    #[test]
    fn normalize_store_name_accepts_common_forms() {
        assert_eq!(normalize_store_name("acme-mx").unwrap(), "acme-mx");
        assert_eq!(normalize_store_name("Acme-MX.myshopify.com").unwrap(), "acme-mx");
        assert_eq!(
            normalize_store_name("https://acme.myshopify.com/admin").unwrap(),
            "acme"
        );
    }

    #[test]
    fn normalize_store_name_rejects_other_hosts() {
        assert!(normalize_store_name("tienda.example.com").is_err());
        assert!(normalize_store_name("acme store").is_err());
        assert!(normalize_store_name("").is_err());
    }

    #[test]
    fn admin_rejects_blank_token() {
        let err = ShopifyAdmin::new("acme", " ").unwrap_err();
        assert!(matches!(err, ScraperError::InvalidInput { .. }));
    }
}
