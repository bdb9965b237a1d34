//! VTEX catalog search adapter (`_from`/`_to` offset ranges).

use std::collections::HashMap;

use prodex_core::{CanonicalProduct, CanonicalVariant, Platform, SourceId};
use serde::Deserialize;
use serde_json::Value;

use super::{checked, numbered_pages, option_slots, require, require_secret, variant_title, BatchStream, Secret};
use crate::client::{CatalogClient, RequestOptions};
use crate::error::ScraperError;
use crate::parse_helpers::{lenient_i64, lenient_string, opt_lenient_string, parse_decimal};

/// Products per search request.
const PAGE_SIZE: u32 = 100;

const SEARCH_PATH: &str = "/api/catalog_system/pub/products/search";

#[derive(Debug, Clone)]
pub struct Vtex {
    account: String,
    app_key: Secret,
    app_token: Secret,
    base_url: String,
}

impl Vtex {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] for a malformed account name or
    /// blank credentials.
    pub fn new(account: &str, app_key: &str, app_token: &str) -> Result<Self, ScraperError> {
        let account = require("account name", account)?.to_ascii_lowercase();
        if !account
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ScraperError::InvalidInput {
                input: account,
                reason: "account name may only contain letters, digits and hyphens".to_owned(),
            });
        }
        let base_url = format!("https://{account}.vtexcommercestable.com.br");
        Ok(Self {
            account,
            app_key: require_secret("app key", app_key)?,
            app_token: require_secret("app token", app_token)?,
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
        self.account.clone()
    }

    /// Search URL for 1-based `page`; ranges are inclusive. Page 0 is
    /// treated as page 1.
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        let from = page.saturating_sub(1) * PAGE_SIZE;
        let to = from + PAGE_SIZE - 1;
        format!("{}{SEARCH_PATH}?_from={from}&_to={to}", self.base_url)
    }

    pub(crate) fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        numbered_pages(Platform::Vtex, self.page_url(1), move |page| {
            self.fetch_page(client, page)
        })
    }

    async fn fetch_page(
        &self,
        client: &CatalogClient,
        page: u32,
    ) -> Result<Vec<CanonicalProduct>, ScraperError> {
        let options = RequestOptions::new()
            .header("X-VTEX-API-AppKey", self.app_key.expose())
            .header("X-VTEX-API-AppToken", self.app_token.expose());
        let fetched = client
            .fetch_json::<Vec<VtexProduct>>(
                &self.page_url(page),
                &options,
                &format!("VTEX search page {page}"),
            )
            .await?;
        fetched
            .data
            .into_iter()
            .map(|p| checked(normalize_product(p)))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VtexProduct {
    product_id: SourceId,
    #[serde(default)]
    product_name: String,
    #[serde(default)]
    link_text: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    brand: String,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    release_date: String,
    #[serde(default)]
    sku_specifications: Vec<SkuSpecification>,
    #[serde(default)]
    items: Vec<VtexItem>,
}

#[derive(Debug, Deserialize)]
struct SkuSpecification {
    field: SpecificationField,
}

#[derive(Debug, Deserialize)]
struct SpecificationField {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VtexItem {
    item_id: SourceId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    reference_id: Vec<ReferenceId>,
    #[serde(default)]
    images: Vec<VtexImage>,
    #[serde(default)]
    sellers: Vec<VtexSeller>,
    /// Names of the SKU's variation attributes, e.g. `["Talla", "Color"]`.
    #[serde(default)]
    variations: Vec<Value>,
    /// Attribute values keyed by attribute name: `"Talla": ["M"]`.
    #[serde(flatten)]
    attributes: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ReferenceId {
    #[serde(rename = "Key", default)]
    key: String,
    #[serde(rename = "Value", default, deserialize_with = "lenient_string")]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VtexImage {
    image_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VtexSeller {
    #[serde(default)]
    seller_default: bool,
    #[serde(default)]
    commertial_offer: CommercialOffer,
}

#[derive(Debug, Default, Deserialize)]
struct CommercialOffer {
    #[serde(rename = "Price", default, deserialize_with = "opt_lenient_string")]
    price: Option<String>,
    #[serde(rename = "ListPrice", default, deserialize_with = "opt_lenient_string")]
    list_price: Option<String>,
    #[serde(rename = "AvailableQuantity", default, deserialize_with = "lenient_i64")]
    available_quantity: i64,
}

fn normalize_product(product: VtexProduct) -> CanonicalProduct {
    let spec_names: Vec<String> = product
        .sku_specifications
        .into_iter()
        .map(|s| s.field.name)
        .collect();

    let mut images: Vec<String> = Vec::new();
    for item in &product.items {
        for image in &item.images {
            if !images.contains(&image.image_url) {
                images.push(image.image_url.clone());
            }
        }
    }

    let variants = product
        .items
        .into_iter()
        .map(|item| normalize_item(item, &spec_names))
        .collect();

    let product_type = product
        .categories
        .first()
        .and_then(|path| path.split('/').rfind(|s| !s.trim().is_empty()))
        .unwrap_or_default()
        .to_owned();

    CanonicalProduct {
        id: product.product_id,
        title: product.product_name,
        handle: product.link_text,
        body_html: product.description,
        vendor: if product.brand.is_empty() {
            "N/A".to_owned()
        } else {
            product.brand
        },
        product_type,
        published_at: (!product.release_date.is_empty()).then(|| product.release_date.clone()),
        created_at: product.release_date,
        tags: Vec::new(),
        variants,
        images,
    }
}

fn normalize_item(item: VtexItem, spec_names: &[String]) -> CanonicalVariant {
    let names: Vec<String> = if spec_names.is_empty() {
        item.variations.iter().filter_map(variation_name).collect()
    } else {
        spec_names.to_vec()
    };
    let values: Vec<String> = names
        .iter()
        .map(|name| attribute_value(&item.attributes, name).unwrap_or_default())
        .collect();
    let options = option_slots(values);
    let title = variant_title(&options, Some(&item.name));
    let [option1, option2, option3] = options;

    let offer = item
        .sellers
        .iter()
        .find(|s| s.seller_default)
        .or_else(|| item.sellers.first())
        .map(|s| &s.commertial_offer);

    let price = offer
        .and_then(|o| o.price.clone())
        .unwrap_or_else(|| "0".to_owned());
    let compare_at_price = offer.and_then(|o| o.list_price.clone()).filter(|list| {
        match (parse_decimal(list), parse_decimal(&price)) {
            (Some(list), Some(current)) => list > current,
            _ => false,
        }
    });

    let sku = item
        .reference_id
        .iter()
        .find(|r| r.key == "RefId")
        .map(|r| r.value.clone())
        .unwrap_or_default();

    CanonicalVariant {
        id: item.item_id,
        title,
        price,
        compare_at_price,
        sku,
        available: offer.is_some_and(|o| o.available_quantity > 0),
        option1,
        option2,
        option3,
    }
}

/// `variations` entries are attribute names in the legacy search API and
/// `{name, values}` objects in newer accounts.
fn variation_name(value: &Value) -> Option<String> {
    match value {
        Value::String(name) => Some(name.clone()),
        Value::Object(map) => map.get("name").and_then(Value::as_str).map(str::to_owned),
        _ => None,
    }
}

/// First value of attribute `name` on an item (`item[name][0]`).
fn attribute_value(attributes: &HashMap<String, Value>, name: &str) -> Option<String> {
    match attributes.get(name)? {
        Value::Array(values) => values.first().and_then(Value::as_str).map(str::to_owned),
        Value::String(value) => Some(value.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_page() -> Vec<VtexProduct> {
        serde_json::from_str(
            r#"[{
                "productId": "1001",
                "productName": "Camisa Lino",
                "brand": "Acme",
                "linkText": "camisa-lino",
                "description": "Fresca",
                "categories": ["/Ropa/Camisas/", "/Ropa/"],
                "releaseDate": "2024-03-01T00:00:00",
                "skuSpecifications": [
                    {"field": {"name": "Talla"}, "values": [{"name": "M"}]},
                    {"field": {"name": "Color"}, "values": [{"name": "Rojo"}]}
                ],
                "items": [{
                    "itemId": "5001",
                    "name": "M Rojo",
                    "referenceId": [{"Key": "RefId", "Value": "CAM-M-R"}],
                    "images": [{"imageUrl": "https://acme.vteximg.com.br/1.jpg"}],
                    "variations": ["Talla", "Color"],
                    "Talla": ["M"],
                    "Color": ["Rojo"],
                    "sellers": [
                        {"sellerId": "2", "sellerDefault": false,
                         "commertialOffer": {"Price": 1.0, "ListPrice": 1.0, "AvailableQuantity": 0}},
                        {"sellerId": "1", "sellerDefault": true,
                         "commertialOffer": {"Price": 399.9, "ListPrice": 499.9, "AvailableQuantity": 3}}
                    ]
                }, {
                    "itemId": "5002",
                    "name": "L Rojo",
                    "images": [{"imageUrl": "https://acme.vteximg.com.br/1.jpg"},
                               {"imageUrl": "https://acme.vteximg.com.br/2.jpg"}],
                    "Talla": ["L"],
                    "Color": ["Rojo"],
                    "sellers": [{"sellerId": "1", "sellerDefault": true,
                        "commertialOffer": {"Price": 399.9, "ListPrice": 399.9, "AvailableQuantity": 0}}]
                }]
            }]"#,
        )
        .unwrap()
    }

    #[test]
    fn page_url_uses_inclusive_offset_ranges() {
        let source = Vtex::new("acme", "key", "token").unwrap();
        assert!(source.page_url(1).ends_with("/products/search?_from=0&_to=99"));
        assert!(source.page_url(3).ends_with("?_from=200&_to=299"));
        assert!(source
            .page_url(1)
            .starts_with("https://acme.vtexcommercestable.com.br/api/"));
    }

    #[test]
    fn page_zero_maps_to_first_range() {
        let source = Vtex::new("acme", "key", "token").unwrap();
        assert_eq!(source.page_url(0), source.page_url(1));
    }

    #[test]
    fn normalize_maps_default_seller_offer() {
        let product = normalize_product(search_page().remove(0));
        let first = &product.variants[0];

        assert_eq!(first.price, "399.9");
        assert_eq!(first.compare_at_price.as_deref(), Some("499.9"));
        assert!(first.available);
        assert_eq!(first.sku, "CAM-M-R");
    }

    #[test]
    fn normalize_drops_list_price_not_above_price() {
        let product = normalize_product(search_page().remove(0));
        assert!(product.variants[1].compare_at_price.is_none());
        assert!(!product.variants[1].available);
    }

    #[test]
    fn options_follow_specification_order() {
        let product = normalize_product(search_page().remove(0));
        assert_eq!(product.variants[0].option1.as_deref(), Some("M"));
        assert_eq!(product.variants[0].option2.as_deref(), Some("Rojo"));
        assert_eq!(product.variants[0].title, "M / Rojo");
        assert_eq!(product.variants[1].title, "L / Rojo");
    }

    #[test]
    fn product_fields_and_deduplicated_images() {
        let product = normalize_product(search_page().remove(0));
        assert_eq!(product.id, SourceId::Text("1001".to_owned()));
        assert_eq!(product.product_type, "Camisas");
        assert_eq!(product.handle, "camisa-lino");
        assert_eq!(product.images.len(), 2);
    }

    #[test]
    fn falls_back_to_item_variations_without_specifications() {
        let mut raw = search_page().remove(0);
        raw.sku_specifications.clear();
        let product = normalize_product(raw);
        assert_eq!(product.variants[0].option1.as_deref(), Some("M"));
        // The second item lists no variations at all.
        assert_eq!(product.variants[1].title, "L Rojo");
    }

    #[test]
    fn rejects_account_with_domain() {
        assert!(Vtex::new("acme.com.br", "key", "token").is_err());
        assert!(Vtex::new("acme", "", "token").is_err());
    }
}
