mod app_config;
mod config;
mod platform;
mod products;
pub mod tags;

pub use app_config::{AppConfig, Environment, HostHeader};
pub use config::{load_app_config, load_app_config_from_env};
pub use platform::{Catalog, Platform};
pub use products::{CanonicalProduct, CanonicalVariant, PricePair, SourceId, DEFAULT_VARIANT_TITLE};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Violations of the canonical model invariants.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("variant {variant_id}: price \"{value}\" is not a non-negative number")]
    InvalidPrice { variant_id: String, value: String },

    #[error("variant {variant_id}: compare-at price \"{value}\" is not a number")]
    InvalidCompareAtPrice { variant_id: String, value: String },
}
