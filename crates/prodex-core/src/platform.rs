use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CanonicalProduct;

/// E-commerce platform a catalog was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Shopify,
    PrestaShop,
    Vtex,
    TiendaNube,
    WooCommerce,
}

impl Platform {
    /// Lowercase slug used in export filenames and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Shopify => "shopify",
            Platform::PrestaShop => "prestashop",
            Platform::Vtex => "vtex",
            Platform::TiendaNube => "tiendanube",
            Platform::WooCommerce => "woocommerce",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one extraction run.
///
/// Owned by whoever started the run and handed by reference to the exporter.
/// A new run replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub platform: Platform,
    /// Hostname (without `www.`), store name, or account the products came
    /// from; used in export filenames.
    pub store_identifier: String,
    pub products: Vec<CanonicalProduct>,
}

impl Catalog {
    /// Number of export rows (one per variant).
    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.products.iter().map(|p| p.variants.len()).sum()
    }
}
