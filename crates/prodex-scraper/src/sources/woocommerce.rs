//! WooCommerce REST adapter (`/wp-json/wc/v3`), authenticated with a
//! consumer key pair in the query string.

use prodex_core::{CanonicalProduct, CanonicalVariant, Platform, SourceId, DEFAULT_VARIANT_TITLE};
use reqwest::Url;
use serde::Deserialize;

use super::{
    checked, numbered_pages, option_slots, require_secret, variant_title, BatchStream, Secret,
    MAX_PAGES,
};
use crate::client::{parse_store_url, store_hostname, store_origin, CatalogClient, RequestOptions};
use crate::error::ScraperError;
use crate::parse_helpers::{lenient_string, opt_lenient_string};

const PER_PAGE: u32 = 100;

const API_PREFIX: &str = "/wp-json/wc/v3";

#[derive(Debug, Clone)]
pub struct WooCommerce {
    store_url: Url,
    consumer_key: Secret,
    consumer_secret: Secret,
}

impl WooCommerce {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] if the store URL is unusable or
    /// either key is blank.
    pub fn new(
        store_url: &str,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            store_url: parse_store_url(store_url)?,
            consumer_key: require_secret("consumer key", consumer_key)?,
            consumer_secret: require_secret("consumer secret", consumer_secret)?,
        })
    }

    pub(crate) fn store_identifier(&self) -> String {
        store_hostname(&self.store_url)
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<String, ScraperError> {
        let base = format!("{}{API_PREFIX}{path}", store_origin(&self.store_url));
        let mut url = Url::parse(&base).map_err(|e| ScraperError::InvalidInput {
            input: base.clone(),
            reason: format!("cannot build API URL: {e}"),
        })?;
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("consumer_key", self.consumer_key.expose())
            .append_pair("consumer_secret", self.consumer_secret.expose());
        Ok(url.into())
    }

    fn page_url(&self, page: u32) -> Result<String, ScraperError> {
        self.endpoint(
            "/products",
            &[("page", page.to_string()), ("per_page", PER_PAGE.to_string())],
        )
    }

    pub(crate) fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        // Only used to label a runaway pagination error, never requested.
        let label = format!("{}{API_PREFIX}/products", store_origin(&self.store_url));
        numbered_pages(Platform::WooCommerce, label, move |page| {
            self.fetch_page(client, page)
        })
    }

    async fn fetch_page(
        &self,
        client: &CatalogClient,
        page: u32,
    ) -> Result<Vec<CanonicalProduct>, ScraperError> {
        let fetched = client
            .fetch_json::<Vec<WcProduct>>(
                &self.page_url(page)?,
                &RequestOptions::new(),
                &format!("WooCommerce page {page}"),
            )
            .await?;

        let mut products = Vec::with_capacity(fetched.data.len());
        for product in fetched.data {
            let variations = if product.variations.is_empty() {
                Vec::new()
            } else {
                self.fetch_variations(client, &product.id).await?
            };
            products.push(checked(normalize_product(product, variations))?);
        }
        Ok(products)
    }

    async fn fetch_variations(
        &self,
        client: &CatalogClient,
        product_id: &SourceId,
    ) -> Result<Vec<WcVariation>, ScraperError> {
        let path = format!("/products/{product_id}/variations");
        let mut variations = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = self.endpoint(
                &path,
                &[("page", page.to_string()), ("per_page", PER_PAGE.to_string())],
            )?;
            let batch = client
                .fetch_json::<Vec<WcVariation>>(
                    &url,
                    &RequestOptions::new(),
                    &format!("WooCommerce variations of product {product_id}, page {page}"),
                )
                .await?
                .data;
            let last_page = batch.len() < PER_PAGE as usize;
            variations.extend(batch);
            if last_page {
                return Ok(variations);
            }
        }

        Err(ScraperError::PaginationLimit {
            url: format!("{}{API_PREFIX}{path}", store_origin(&self.store_url)),
            max_pages: MAX_PAGES,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WcProduct {
    id: SourceId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    date_created: String,
    #[serde(default, deserialize_with = "lenient_string")]
    status: String,
    #[serde(default, deserialize_with = "lenient_string")]
    sku: String,
    #[serde(flatten)]
    pricing: WcPricing,
    #[serde(default, deserialize_with = "lenient_string")]
    stock_status: String,
    #[serde(default)]
    categories: Vec<Named>,
    #[serde(default)]
    tags: Vec<Named>,
    #[serde(default)]
    brands: Vec<Named>,
    #[serde(default)]
    images: Vec<WcImage>,
    #[serde(default)]
    variations: Vec<SourceId>,
}

#[derive(Debug, Deserialize)]
struct WcVariation {
    id: SourceId,
    #[serde(default, deserialize_with = "lenient_string")]
    sku: String,
    #[serde(flatten)]
    pricing: WcPricing,
    #[serde(default, deserialize_with = "lenient_string")]
    stock_status: String,
    #[serde(default)]
    attributes: Vec<WcAttribute>,
}

/// Price fields shared by products and variations; all are strings and
/// `""` means unset.
#[derive(Debug, Default, Deserialize)]
struct WcPricing {
    #[serde(default, deserialize_with = "opt_lenient_string")]
    price: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    regular_price: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    sale_price: Option<String>,
}

impl WcPricing {
    /// `(price, compare_at_price)`: a sale price wins, with the regular price
    /// as the comparison.
    fn resolve(self) -> (String, Option<String>) {
        match self.sale_price {
            Some(sale) => (sale, self.regular_price),
            None => (
                self.regular_price
                    .or(self.price)
                    .unwrap_or_else(|| "0".to_owned()),
                None,
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct WcImage {
    src: String,
}

#[derive(Debug, Deserialize)]
struct WcAttribute {
    #[serde(default, deserialize_with = "lenient_string")]
    option: String,
}

fn is_in_stock(stock_status: &str) -> bool {
    stock_status != "outofstock"
}

fn normalize_product(product: WcProduct, variations: Vec<WcVariation>) -> CanonicalProduct {
    let variants = if variations.is_empty() {
        let available = is_in_stock(&product.stock_status);
        let (price, compare_at_price) = product.pricing.resolve();
        vec![CanonicalVariant {
            id: product.id.clone(),
            title: DEFAULT_VARIANT_TITLE.to_owned(),
            price,
            compare_at_price,
            sku: product.sku,
            available,
            option1: None,
            option2: None,
            option3: None,
        }]
    } else {
        variations.into_iter().map(normalize_variation).collect()
    };

    CanonicalProduct {
        id: product.id,
        title: product.name,
        handle: product.slug,
        body_html: product.description,
        vendor: product
            .brands
            .into_iter()
            .map(|b| b.name)
            .find(|n| !n.is_empty())
            .unwrap_or_else(|| "N/A".to_owned()),
        product_type: product
            .categories
            .into_iter()
            .map(|c| c.name)
            .find(|n| !n.is_empty())
            .unwrap_or_else(|| "N/A".to_owned()),
        published_at: (product.status == "publish").then(|| product.date_created.clone()),
        created_at: product.date_created,
        tags: product
            .tags
            .into_iter()
            .map(|t| t.name)
            .filter(|n| !n.is_empty())
            .collect(),
        variants,
        images: product.images.into_iter().map(|i| i.src).collect(),
    }
}

fn normalize_variation(variation: WcVariation) -> CanonicalVariant {
    let options = option_slots(variation.attributes.into_iter().map(|a| a.option));
    let title = variant_title(&options, None);
    let [option1, option2, option3] = options;
    let available = is_in_stock(&variation.stock_status);
    let (price, compare_at_price) = variation.pricing.resolve();

    CanonicalVariant {
        id: variation.id,
        title,
        price,
        compare_at_price,
        sku: variation.sku,
        available,
        option1,
        option2,
        option3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_product() -> WcProduct {
        serde_json::from_str(
            r#"{"id": 10, "name": "Taza", "slug": "taza", "description": "<p>Cerámica</p>",
                "date_created": "2024-05-01T10:00:00", "status": "publish", "sku": "TZ-1",
                "price": "80", "regular_price": "100", "sale_price": "80",
                "stock_status": "instock",
                "categories": [{"id": 3, "name": "Cocina"}],
                "tags": [{"id": 1, "name": "hogar"}, {"id": 2, "name": ""}],
                "brands": [],
                "images": [{"id": 7, "src": "https://tienda.example.com/wp-content/taza.jpg"}],
                "variations": []}"#,
        )
        .unwrap()
    }

    #[test]
    fn simple_product_gets_synthetic_variant() {
        let product = normalize_product(simple_product(), Vec::new());
        assert_eq!(product.variants.len(), 1);
        let variant = &product.variants[0];
        assert_eq!(variant.title, "Default Title");
        assert_eq!(variant.price, "80");
        assert_eq!(variant.compare_at_price.as_deref(), Some("100"));
        assert_eq!(variant.sku, "TZ-1");
        assert!(variant.available);
    }

    #[test]
    fn native_lists_map_to_tags_and_category() {
        let product = normalize_product(simple_product(), Vec::new());
        assert_eq!(product.tags, vec!["hogar"]);
        assert_eq!(product.product_type, "Cocina");
        assert_eq!(product.vendor, "N/A");
        assert!(product.is_published());
    }

    #[test]
    fn variations_become_variants_with_attribute_options() {
        let variations: Vec<WcVariation> = serde_json::from_str(
            r#"[{"id": 11, "sku": "", "price": "120", "regular_price": "120", "sale_price": "",
                 "stock_status": "outofstock",
                 "attributes": [{"id": 1, "name": "Talla", "option": "M"},
                                {"id": 2, "name": "Color", "option": "Azul"}]}]"#,
        )
        .unwrap();
        let product = normalize_product(simple_product(), variations);

        assert_eq!(product.variants.len(), 1);
        let variant = &product.variants[0];
        assert_eq!(variant.title, "M / Azul");
        assert_eq!(variant.option2.as_deref(), Some("Azul"));
        assert_eq!(variant.price, "120");
        assert!(variant.compare_at_price.is_none());
        assert!(!variant.available);
    }

    #[test]
    fn query_carries_key_pair_and_paging() {
        let source = WooCommerce::new("tienda.example.com", "ck_1", "cs_2").unwrap();
        assert_eq!(
            source.page_url(2).unwrap(),
            "https://tienda.example.com/wp-json/wc/v3/products?page=2&per_page=100&consumer_key=ck_1&consumer_secret=cs_2"
        );
    }
}
