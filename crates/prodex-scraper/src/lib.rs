pub mod client;
pub mod error;
pub mod pagination;
mod parse_helpers;
mod run;
pub mod sources;

pub use client::{CatalogClient, Fetched, RequestOptions, Transport, DEFAULT_TIMEOUT_SECS};
pub use error::ScraperError;
pub use run::run_extraction;
pub use sources::{
    BatchStream, PrestaShop, ShopifyAdmin, ShopifyPublic, Source, TiendaNube, Vtex, WooCommerce,
};
