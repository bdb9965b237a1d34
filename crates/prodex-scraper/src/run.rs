//! Run coordinator: drains one adapter stream into a [`Catalog`].

use futures::TryStreamExt;
use prodex_core::Catalog;

use crate::client::CatalogClient;
use crate::error::ScraperError;
use crate::sources::Source;

/// Runs one extraction from start to finish.
///
/// All-or-nothing: on the first failing page or item the products gathered
/// so far are dropped and the error is returned.
///
/// # Errors
///
/// Propagates the first adapter error. Returns [`ScraperError::EmptyResult`]
/// when the run completes without a single product.
pub async fn run_extraction(
    client: &CatalogClient,
    source: &Source,
) -> Result<Catalog, ScraperError> {
    let platform = source.platform();
    let store_identifier = source.store_identifier();
    tracing::info!(%platform, store = %store_identifier, "starting extraction");

    let mut products = Vec::new();
    let mut batches = source.extract(client);
    while let Some(batch) = batches.try_next().await.inspect_err(|e| {
        tracing::warn!(%platform, store = %store_identifier, error = %e, "extraction failed");
    })? {
        products.extend(batch);
        tracing::info!(%platform, count = products.len(), "products extracted so far");
    }

    if products.is_empty() {
        return Err(ScraperError::EmptyResult {
            platform,
            store: store_identifier,
        });
    }

    tracing::info!(
        %platform,
        store = %store_identifier,
        count = products.len(),
        "extraction complete"
    );
    Ok(Catalog {
        platform,
        store_identifier,
        products,
    })
}
