use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Title given to the single variant synthesized for products that have no
/// native variant concept.
pub const DEFAULT_VARIANT_TITLE: &str = "Default Title";

/// Source-native identifier. Shopify and Tienda Nube use integers, VTEX uses
/// numeric strings, PrestaShop mixes both depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Number(n) => write!(f, "{n}"),
            SourceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SourceId {
    fn from(value: i64) -> Self {
        SourceId::Number(value)
    }
}

impl From<String> for SourceId {
    fn from(value: String) -> Self {
        SourceId::Text(value)
    }
}

impl From<&str> for SourceId {
    fn from(value: &str) -> Self {
        SourceId::Text(value.to_owned())
    }
}

/// A product normalized from any supported platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalProduct {
    pub id: SourceId,
    pub title: String,
    /// URL slug, e.g. `"hi-boy-blood-orange"`.
    pub handle: String,
    /// Raw description markup as the platform returns it.
    pub body_html: String,
    pub vendor: String,
    /// Category or product-type label.
    pub product_type: String,
    /// Creation timestamp, in whatever format the platform uses.
    pub created_at: String,
    /// Publication timestamp; `None` when the product is not published.
    pub published_at: Option<String>,
    pub tags: Vec<String>,
    pub variants: Vec<CanonicalVariant>,
    /// Absolute image URLs in gallery order.
    pub images: Vec<String>,
}

impl CanonicalProduct {
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }
}

/// A single purchasable variant of a [`CanonicalProduct`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalVariant {
    pub id: SourceId,
    /// Display title, e.g. `"M / Rojo"` or `"Default Title"`.
    pub title: String,
    /// Decimal string, always parseable as a non-negative float.
    pub price: String,
    /// Pre-sale comparison price, if the platform reports one.
    pub compare_at_price: Option<String>,
    /// Stock-keeping unit; empty when the platform has none.
    pub sku: String,
    pub available: bool,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
}

/// Prices derived from a variant at export time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePair {
    /// The higher of price and compare-at price.
    pub list_price: f64,
    /// The current price, only when a higher compare-at price exists.
    pub promo_price: Option<f64>,
}

impl CanonicalVariant {
    /// Joins the populated option values with `" / "` in positional order.
    ///
    /// Returns `None` when every option is absent or blank.
    #[must_use]
    pub fn options_title(options: &[Option<String>]) -> Option<String> {
        let parts: Vec<&str> = options
            .iter()
            .filter_map(|o| o.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" / "))
        }
    }

    /// Checks the price invariants of the canonical model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPrice`] when `price` is not a finite,
    /// non-negative number and [`ModelError::InvalidCompareAtPrice`] when a
    /// present `compare_at_price` is not a finite number.
    pub fn validate(&self) -> Result<(), ModelError> {
        match parse_amount(&self.price) {
            Some(p) if p >= 0.0 => {}
            _ => {
                return Err(ModelError::InvalidPrice {
                    variant_id: self.id.to_string(),
                    value: self.price.clone(),
                })
            }
        }
        if let Some(compare) = &self.compare_at_price {
            if parse_amount(compare).is_none() {
                return Err(ModelError::InvalidCompareAtPrice {
                    variant_id: self.id.to_string(),
                    value: compare.clone(),
                });
            }
        }
        Ok(())
    }

    /// Numeric price; `0.0` if the variant was never validated and the price
    /// does not parse.
    #[must_use]
    pub fn price_value(&self) -> f64 {
        parse_amount(&self.price).unwrap_or(0.0)
    }

    #[must_use]
    pub fn compare_at_value(&self) -> Option<f64> {
        self.compare_at_price.as_deref().and_then(parse_amount)
    }

    /// List and promotional price for the business export.
    ///
    /// The promotional price only exists when the compare-at price exceeds the
    /// current price; the list price is then the compare-at price.
    #[must_use]
    pub fn price_pair(&self) -> PricePair {
        let price = self.price_value();
        match self.compare_at_value() {
            Some(compare) if compare > price => PricePair {
                list_price: compare,
                promo_price: Some(price),
            },
            _ => PricePair {
                list_price: price,
                promo_price: None,
            },
        }
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
