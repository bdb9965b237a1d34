//! PrestaShop webservice payloads (`output_format=JSON`).
//!
//! The webservice is loose about types: ids and quantities arrive as numbers
//! or strings, prices as `"19.900000"`, and an empty collection is `[]`
//! instead of `{"products": []}`. Multilingual fields are a plain string
//! when the shop has one language and a `[{id, value}]` list otherwise.

use prodex_core::SourceId;
use serde::Deserialize;

use crate::parse_helpers::{lenient_i64, lenient_string};

/// Response of `GET /api/products`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum ProductList {
    Products { products: Vec<IdRef> },
    Empty(Vec<serde_json::Value>),
}

impl ProductList {
    pub(super) fn into_ids(self) -> Vec<SourceId> {
        match self {
            ProductList::Products { products } => products.into_iter().map(|r| r.id).collect(),
            ProductList::Empty(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct IdRef {
    pub id: SourceId,
}

/// Response of `GET /api/products/<id>`.
#[derive(Debug, Deserialize)]
pub(super) struct ProductEnvelope {
    pub product: PsProduct,
}

#[derive(Debug, Deserialize)]
pub(super) struct PsProduct {
    pub id: SourceId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub active: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_add: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_upd: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub manufacturer_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_name: String,
    #[serde(default)]
    pub name: Localized,
    #[serde(default)]
    pub description: Localized,
    #[serde(default)]
    pub link_rewrite: Localized,
    #[serde(default)]
    pub associations: ProductAssociations,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ProductAssociations {
    #[serde(default)]
    pub combinations: Vec<IdRef>,
    #[serde(default)]
    pub images: Vec<IdRef>,
}

/// Response of `GET /api/combinations/<id>`.
#[derive(Debug, Deserialize)]
pub(super) struct CombinationEnvelope {
    pub combination: PsCombination,
}

#[derive(Debug, Deserialize)]
pub(super) struct PsCombination {
    pub id: SourceId,
    /// Impact on the base product price, may be negative.
    #[serde(default, deserialize_with = "lenient_string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub quantity: i64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference: String,
    #[serde(default)]
    pub associations: CombinationAssociations,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct CombinationAssociations {
    #[serde(default)]
    pub product_option_values: Vec<IdRef>,
}

/// A multilingual field.
#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
pub(super) enum Localized {
    Plain(String),
    Translations(Vec<Translation>),
    #[default]
    Missing,
}

#[derive(Debug, Deserialize)]
pub(super) struct Translation {
    #[serde(default)]
    pub value: Option<String>,
}

impl Localized {
    /// First populated value.
    pub(super) fn first(&self) -> String {
        match self {
            Localized::Plain(s) => s.clone(),
            Localized::Translations(list) => list
                .iter()
                .filter_map(|t| t.value.as_deref())
                .find(|v| !v.is_empty())
                .unwrap_or_default()
                .to_owned(),
            Localized::Missing => String::new(),
        }
    }
}
