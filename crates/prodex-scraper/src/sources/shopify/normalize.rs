//! Conversion from Shopify payloads to the canonical model.
//!
//! Shopify's product shape is the canonical shape, so this is mostly a
//! pass-through that fills defaults.

use prodex_core::{CanonicalProduct, CanonicalVariant, SourceId};

use super::types::{ShopifyProduct, ShopifyVariant};
use crate::error::ScraperError;
use crate::sources::variant_title;

/// Normalizes a raw [`ShopifyProduct`].
///
/// # Errors
///
/// Returns [`ScraperError::Normalization`] if a variant has no price.
pub fn normalize_product(product: ShopifyProduct) -> Result<CanonicalProduct, ScraperError> {
    let product_id = product.id;
    let variants = product
        .variants
        .into_iter()
        .map(|v| normalize_variant(v, product_id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CanonicalProduct {
        id: SourceId::Number(product.id),
        title: product.title,
        handle: product.handle,
        body_html: product.body_html.unwrap_or_default(),
        vendor: product.vendor.unwrap_or_default(),
        product_type: product.product_type.unwrap_or_default(),
        created_at: product.created_at.unwrap_or_default(),
        published_at: product.published_at.filter(|s| !s.is_empty()),
        tags: product.tags,
        variants,
        images: product.images.into_iter().map(|i| i.src).collect(),
    })
}

fn normalize_variant(
    variant: ShopifyVariant,
    product_id: i64,
) -> Result<CanonicalVariant, ScraperError> {
    if variant.price.is_empty() {
        return Err(ScraperError::Normalization {
            product_id: product_id.to_string(),
            reason: format!("variant {} has no price", variant.id),
        });
    }

    // Admin payloads carry stock counts instead of an availability flag.
    let available = variant
        .available
        .or_else(|| variant.inventory_quantity.map(|q| q > 0))
        .unwrap_or(true);

    let options = [
        non_blank(variant.option1),
        non_blank(variant.option2),
        non_blank(variant.option3),
    ];
    let title = variant_title(&options, variant.title.as_deref());
    let [option1, option2, option3] = options;

    Ok(CanonicalVariant {
        id: SourceId::Number(variant.id),
        title,
        price: variant.price,
        compare_at_price: variant.compare_at_price,
        sku: variant.sku.unwrap_or_default(),
        available,
        option1,
        option2,
        option3,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
