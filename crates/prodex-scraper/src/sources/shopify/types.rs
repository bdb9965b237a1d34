//! Shopify product payloads, shared by the storefront `products.json` and the
//! Admin REST `products.json` endpoints.
//!
//! ### Tags
//! The storefront returns a JSON array (`["verano", "lino"]`); the Admin API
//! returns one comma-joined string (`"verano, lino"`). Both decode through
//! [`prodex_core::tags::deserialize`].
//!
//! ### `compare_at_price`
//! `null` when the variant is not on sale, otherwise a decimal string. Some
//! stores send `""` or `"0.00"`; the empty string is treated as absent and
//! `"0.00"` is passed through (it never exceeds the price, so no promotion is
//! derived from it).
//!
//! ### `available`
//! Present on the storefront, absent on the Admin API, which exposes
//! `inventory_quantity` instead.

use serde::Deserialize;

use crate::parse_helpers::{lenient_string, opt_lenient_string};

/// Top-level response from `GET /products.json`.
#[derive(Debug, Deserialize)]
pub struct ShopifyProductsResponse {
    #[serde(default)]
    pub products: Vec<ShopifyProduct>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyProduct {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub handle: String,
    /// Raw HTML description; `null` on products without one.
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// `null` for unpublished products (Admin API only).
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "prodex_core::tags::deserialize")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub variants: Vec<ShopifyVariant>,
    #[serde(default)]
    pub images: Vec<ShopifyImage>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyVariant {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "opt_lenient_string")]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShopifyImage {
    pub src: String,
}
