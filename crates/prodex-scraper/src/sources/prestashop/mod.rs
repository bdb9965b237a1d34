//! PrestaShop webservice adapter.
//!
//! Extraction is two-phase: one request lists every product id, then each
//! product (and each of its combinations) is fetched on its own. Per-item
//! requests are spaced by a fixed delay to stay polite with shop servers,
//! which are usually small shared hosts.

mod types;

use std::collections::VecDeque;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use prodex_core::{CanonicalProduct, CanonicalVariant, Platform, SourceId, DEFAULT_VARIANT_TITLE};
use reqwest::Url;
use rust_decimal::Decimal;

use super::{checked, option_slots, require_secret, BatchStream, Secret};
use crate::client::{parse_store_url, store_hostname, store_origin, CatalogClient, RequestOptions};
use crate::error::ScraperError;
use crate::parse_helpers::{format_price, parse_decimal};

use types::{CombinationEnvelope, ProductEnvelope, ProductList, PsCombination, PsProduct};

/// Default spacing between per-item requests.
pub const DEFAULT_ITEM_DELAY: Duration = Duration::from_millis(250);

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone)]
pub struct PrestaShop {
    store_url: Url,
    api_key: Secret,
    item_delay: Duration,
}

impl PrestaShop {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidInput`] if the store URL is unusable or
    /// the webservice key is blank.
    pub fn new(store_url: &str, api_key: &str) -> Result<Self, ScraperError> {
        Ok(Self {
            store_url: parse_store_url(store_url)?,
            api_key: require_secret("webservice key", api_key)?,
            item_delay: DEFAULT_ITEM_DELAY,
        })
    }

    #[must_use]
    pub fn with_item_delay(mut self, delay: Duration) -> Self {
        self.item_delay = delay;
        self
    }

    pub(crate) fn store_identifier(&self) -> String {
        store_hostname(&self.store_url)
    }

    fn origin(&self) -> String {
        store_origin(&self.store_url)
    }

    /// `<origin>/api/<resource>?ws_key=..&output_format=JSON`
    fn resource_url(&self, resource: &str) -> Result<String, ScraperError> {
        let base = format!("{}/api/{resource}", self.origin());
        Url::parse_with_params(
            &base,
            &[("ws_key", self.api_key.expose()), ("output_format", "JSON")],
        )
        .map(String::from)
        .map_err(|e| ScraperError::InvalidInput {
            input: base,
            reason: format!("cannot build webservice URL: {e}"),
        })
    }

    pub(crate) fn extract<'a>(&'a self, client: &'a CatalogClient) -> BatchStream<'a> {
        let cursor = ItemCursor {
            pending: None,
            pacer: Pacer::new(self.item_delay),
            done: 0,
        };

        stream::try_unfold(cursor, move |mut cursor| async move {
            if cursor.pending.is_none() {
                let ids = self.list_product_ids(client).await?;
                tracing::info!(
                    platform = %Platform::PrestaShop,
                    count = ids.len(),
                    "listed product ids"
                );
                cursor.pending = Some(ids.into());
            }

            let Some(pending) = cursor.pending.as_mut() else {
                return Ok(None);
            };
            let Some(id) = pending.pop_front() else {
                return Ok(None);
            };
            let remaining = pending.len();

            let product = self.fetch_product(client, &id, &mut cursor.pacer).await?;
            cursor.done += 1;
            tracing::debug!(
                platform = %Platform::PrestaShop,
                product_id = %id,
                done = cursor.done,
                remaining,
                "processed product"
            );
            Ok(Some((vec![product], cursor)))
        })
        .boxed()
    }

    async fn list_product_ids(&self, client: &CatalogClient) -> Result<Vec<SourceId>, ScraperError> {
        let url = self.resource_url("products")?;
        let fetched = client
            .fetch_json::<ProductList>(&url, &RequestOptions::new(), "PrestaShop product list")
            .await?;
        Ok(fetched.data.into_ids())
    }

    async fn fetch_product(
        &self,
        client: &CatalogClient,
        id: &SourceId,
        pacer: &mut Pacer,
    ) -> Result<CanonicalProduct, ScraperError> {
        pacer.wait().await;
        let url = self.resource_url(&format!("products/{id}"))?;
        let product = client
            .fetch_json::<ProductEnvelope>(
                &url,
                &RequestOptions::new(),
                &format!("PrestaShop product {id}"),
            )
            .await?
            .data
            .product;

        let base_price = parse_decimal(&product.price).ok_or_else(|| ScraperError::Normalization {
            product_id: product.id.to_string(),
            reason: format!("base price \"{}\" is not a number", product.price),
        })?;

        let mut combinations = Vec::with_capacity(product.associations.combinations.len());
        for combo_ref in &product.associations.combinations {
            pacer.wait().await;
            let url = self.resource_url(&format!("combinations/{}", combo_ref.id))?;
            let combination = client
                .fetch_json::<CombinationEnvelope>(
                    &url,
                    &RequestOptions::new(),
                    &format!("PrestaShop combination {}", combo_ref.id),
                )
                .await?
                .data
                .combination;
            combinations.push(combination);
        }

        checked(build_product(product, base_price, combinations, &self.origin())?)
    }
}

struct ItemCursor {
    pending: Option<VecDeque<SourceId>>,
    pacer: Pacer,
    done: usize,
}

/// Enforces the fixed delay before every per-item request except the first.
struct Pacer {
    delay: Duration,
    started: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            started: false,
        }
    }

    async fn wait(&mut self) {
        if self.started && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.started = true;
    }
}

fn build_product(
    product: PsProduct,
    base_price: Decimal,
    combinations: Vec<PsCombination>,
    origin: &str,
) -> Result<CanonicalProduct, ScraperError> {
    let handle = product.link_rewrite.first();

    let variants = if combinations.is_empty() {
        vec![CanonicalVariant {
            id: product.id.clone(),
            title: DEFAULT_VARIANT_TITLE.to_owned(),
            price: format_price(base_price),
            compare_at_price: None,
            sku: product.reference.clone(),
            available: product.quantity > 0,
            option1: None,
            option2: None,
            option3: None,
        }]
    } else {
        combinations
            .into_iter()
            .map(|c| combination_variant(&product.id, base_price, c))
            .collect::<Result<Vec<_>, _>>()?
    };

    let images = product
        .associations
        .images
        .iter()
        .map(|image| format!("{origin}/{}/{handle}.jpg", image.id))
        .collect();

    Ok(CanonicalProduct {
        id: product.id,
        title: product.name.first(),
        handle,
        body_html: product.description.first(),
        vendor: non_empty_or_na(product.manufacturer_name),
        product_type: non_empty_or_na(product.category_name),
        created_at: product.date_add,
        published_at: (product.active == "1").then_some(product.date_upd),
        tags: Vec::new(),
        variants,
        images,
    })
}

fn combination_variant(
    product_id: &SourceId,
    base_price: Decimal,
    combination: PsCombination,
) -> Result<CanonicalVariant, ScraperError> {
    let delta = if combination.price.is_empty() {
        Decimal::ZERO
    } else {
        parse_decimal(&combination.price).ok_or_else(|| ScraperError::Normalization {
            product_id: product_id.to_string(),
            reason: format!(
                "combination {} price impact \"{}\" is not a number",
                combination.id, combination.price
            ),
        })?
    };

    let option_ids: Vec<String> = combination
        .associations
        .product_option_values
        .iter()
        .map(|v| format!("ID:{}", v.id))
        .collect();
    let title = if option_ids.is_empty() {
        DEFAULT_VARIANT_TITLE.to_owned()
    } else {
        option_ids.join(" / ")
    };
    let [option1, option2, option3] = option_slots(option_ids);

    Ok(CanonicalVariant {
        id: combination.id,
        title,
        price: format_price(base_price + delta),
        compare_at_price: None,
        sku: combination.reference,
        available: combination.quantity > 0,
        option1,
        option2,
        option3,
    })
}

fn non_empty_or_na(value: String) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_owned()
    } else {
        value
    }
}
