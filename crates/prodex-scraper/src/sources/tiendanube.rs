//! Tienda Nube (Nuvemshop) REST adapter.

use std::collections::HashMap;

use prodex_core::{CanonicalProduct, CanonicalVariant, Platform, SourceId};
use serde::Deserialize;

use super::{checked, numbered_pages, option_slots, require, require_secret, variant_title, BatchStream, Secret};
use crate::client::{CatalogClient, RequestOptions};
use crate::error::ScraperError;
use crate::parse_helpers::{lenient_string, opt_lenient_i64, opt_lenient_string};

const API_BASE: &str = "https://api.tiendanube.com/v1";

const PER_PAGE: u32 = 200;

/// Locale preference for multilingual fields.
const LOCALES: [&str; 3] = ["es", "en", "pt"];

#[derive(Debug, Clone)]
pub struct TiendaNube {
    user_id: String,
    access_token: Secret,
    base_url: String,
}

impl TiendaNube {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] if the store id is not numeric or
    /// the token is blank.
    pub fn new(user_id: &str, access_token: &str) -> Result<Self, ScraperError> {
        let user_id = require("store id", user_id)?;
        if !user_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ScraperError::InvalidInput {
                input: user_id,
                reason: "store id must be numeric".to_owned(),
            });
        }
        Ok(Self {
            user_id,
            access_token: require_secret("access token", access_token)?,
            base_url: API_BASE.to_owned(),
        })
    }

    /// Points the adapter at a different API host; used by tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        base_url.trim_end_matches('/').clone_into(&mut self.base_url);
        self
    }

    pub(crate) fn store_identifier(&self) -> String {
        self.user_id.clone()
    }

    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}/{}/products?page={page}&per_page={PER_PAGE}",
            self.base_url, self.user_id
        )
    }

    pub(crate) fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        numbered_pages(Platform::TiendaNube, self.page_url(1), move |page| {
            self.fetch_page(client, page)
        })
    }

    async fn fetch_page(
        &self,
        client: &CatalogClient,
        page: u32,
    ) -> Result<Vec<CanonicalProduct>, ScraperError> {
        let options = RequestOptions::new().header(
            "Authentication",
            &format!("bearer {}", self.access_token.expose()),
        );
        let result = client
            .fetch_json::<Vec<TnProduct>>(
                &self.page_url(page),
                &options,
                &format!("Tienda Nube page {page}"),
            )
            .await;

        let products = match result {
            Ok(fetched) => fetched.data,
            // The API answers 404 for a page past the last one.
            Err(ScraperError::NotFound { .. }) if page > 1 => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        products
            .into_iter()
            .map(|p| checked(normalize_product(p)))
            .collect()
    }
}

/// A multilingual value: `{"es": "...", "pt": "..."}`.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum LocalizedText {
    ByLocale(HashMap<String, Option<String>>),
    Plain(String),
    #[default]
    Missing,
}

impl LocalizedText {
    fn pick(&self) -> String {
        match self {
            LocalizedText::ByLocale(map) => LOCALES
                .iter()
                .filter_map(|locale| map.get(*locale).and_then(Option::as_deref))
                .find(|v| !v.trim().is_empty())
                .unwrap_or_default()
                .to_owned(),
            LocalizedText::Plain(value) => value.clone(),
            LocalizedText::Missing => String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TnProduct {
    id: SourceId,
    #[serde(default)]
    name: LocalizedText,
    #[serde(default)]
    handle: LocalizedText,
    #[serde(default)]
    description: LocalizedText,
    #[serde(default, deserialize_with = "lenient_string")]
    brand: String,
    #[serde(default)]
    categories: Vec<TnCategory>,
    #[serde(default, deserialize_with = "lenient_string")]
    created_at: String,
    #[serde(default, deserialize_with = "lenient_string")]
    updated_at: String,
    #[serde(default)]
    published: bool,
    #[serde(default, deserialize_with = "prodex_core::tags::deserialize")]
    tags: Vec<String>,
    #[serde(default)]
    variants: Vec<TnVariant>,
    #[serde(default)]
    images: Vec<TnImage>,
}

#[derive(Debug, Deserialize)]
struct TnCategory {
    #[serde(default)]
    name: LocalizedText,
}

#[derive(Debug, Deserialize)]
struct TnImage {
    src: String,
}

#[derive(Debug, Deserialize)]
struct TnVariant {
    id: SourceId,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    price: Option<String>,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    promotional_price: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    sku: String,
    #[serde(default)]
    stock_management: bool,
    #[serde(default, deserialize_with = "opt_lenient_i64")]
    stock: Option<i64>,
    #[serde(default, alias = "attribute_values")]
    values: Vec<LocalizedText>,
}

fn normalize_product(product: TnProduct) -> CanonicalProduct {
    let product_type = product
        .categories
        .first()
        .map(|c| c.name.pick())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "N/A".to_owned());

    CanonicalProduct {
        id: product.id,
        title: product.name.pick(),
        handle: product.handle.pick(),
        body_html: product.description.pick(),
        vendor: if product.brand.is_empty() {
            "N/A".to_owned()
        } else {
            product.brand
        },
        product_type,
        created_at: product.created_at,
        published_at: product.published.then_some(product.updated_at),
        tags: product.tags,
        variants: product.variants.into_iter().map(normalize_variant).collect(),
        images: product.images.into_iter().map(|i| i.src).collect(),
    }
}

fn normalize_variant(variant: TnVariant) -> CanonicalVariant {
    let (price, compare_at_price) = match variant.promotional_price {
        Some(promo) => (promo, variant.price),
        None => (variant.price.unwrap_or_else(|| "0".to_owned()), None),
    };

    let options = option_slots(variant.values.iter().map(LocalizedText::pick));
    let title = variant_title(&options, None);
    let [option1, option2, option3] = options;

    let available = if variant.stock_management {
        variant.stock.unwrap_or(0) > 0
    } else {
        true
    };

    CanonicalVariant {
        id: variant.id,
        title,
        price,
        compare_at_price,
        sku: variant.sku,
        available,
        option1,
        option2,
        option3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CanonicalProduct {
        normalize_product(serde_json::from_str(json).unwrap())
    }

    const PRODUCT: &str = r#"{
        "id": 111,
        "name": {"es": "", "en": "Linen Shirt", "pt": "Camisa de Linho"},
        "handle": {"es": "camisa-lino"},
        "description": {"es": "<p>Fresca</p>"},
        "brand": null,
        "categories": [{"name": {"es": "Camisas"}}],
        "created_at": "2024-01-01T00:00:00+0000",
        "updated_at": "2024-02-01T00:00:00+0000",
        "published": true,
        "tags": "verano, lino,  ",
        "images": [{"src": "https://d2r9epyceweg5n.cloudfront.net/1.jpg"}],
        "variants": [
            {"id": 1, "price": "500.00", "promotional_price": "420.00", "sku": "A",
             "stock_management": true, "stock": 0,
             "values": [{"es": "M"}, {"es": "Rojo"}]},
            {"id": 2, "price": "500.00", "promotional_price": null, "sku": null,
             "stock_management": false, "stock": null, "values": []}
        ]
    }"#;

    #[test]
    fn localized_fields_follow_locale_order() {
        let product = parse(PRODUCT);
        assert_eq!(product.title, "Linen Shirt");
        assert_eq!(product.handle, "camisa-lino");
        assert_eq!(product.product_type, "Camisas");
        assert_eq!(product.vendor, "N/A");
    }

    #[test]
    fn tags_string_is_split_and_trimmed() {
        assert_eq!(parse(PRODUCT).tags, vec!["verano", "lino"]);
    }

    #[test]
    fn promotional_price_becomes_price() {
        let product = parse(PRODUCT);
        assert_eq!(product.variants[0].price, "420.00");
        assert_eq!(product.variants[0].compare_at_price.as_deref(), Some("500.00"));
        assert_eq!(product.variants[1].price, "500.00");
        assert!(product.variants[1].compare_at_price.is_none());
    }

    #[test]
    fn availability_depends_on_stock_management() {
        let product = parse(PRODUCT);
        assert!(!product.variants[0].available);
        assert!(product.variants[1].available);
    }

    #[test]
    fn variant_options_and_default_title() {
        let product = parse(PRODUCT);
        assert_eq!(product.variants[0].title, "M / Rojo");
        assert_eq!(product.variants[1].title, "Default Title");
        assert_eq!(product.variants[1].sku, "");
    }

    #[test]
    fn attribute_values_alias_is_accepted() {
        let product = parse(
            r#"{"id": 5, "variants": [{"id": 9, "price": "1.00",
                "attribute_values": [{"pt": "Azul"}]}]}"#,
        );
        assert_eq!(product.variants[0].option1.as_deref(), Some("Azul"));
        assert!(!product.is_published());
    }

    #[test]
    fn page_url_and_validation() {
        let source = TiendaNube::new("123456", "tok").unwrap();
        assert_eq!(
            source.page_url(2),
            "https://api.tiendanube.com/v1/123456/products?page=2&per_page=200"
        );
        assert!(TiendaNube::new("mi-tienda", "tok").is_err());
    }
}
