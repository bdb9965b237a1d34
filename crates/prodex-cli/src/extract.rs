//! `extract` command: pull one store's catalog and write the export files.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use prodex_core::AppConfig;
use prodex_export::{export_catalog, ExportFormat};
use prodex_scraper::{
    run_extraction, CatalogClient, PrestaShop, ScraperError, ShopifyAdmin, ShopifyPublic, Source,
    TiendaNube, Vtex, WooCommerce,
};

/// Sub-commands available under `extract`, one per store platform.
#[derive(Debug, Subcommand)]
pub enum ExtractCommands {
    /// Public Shopify storefront (no credentials)
    Shopify {
        /// Store URL or bare domain (e.g., tienda.example.com)
        store_url: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Shopify Admin API with an access token
    ShopifyAdmin {
        /// Store name, with or without `.myshopify.com`
        store: String,
        #[arg(long, env = "PRODEX_SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
        token: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// PrestaShop webservice
    Prestashop {
        /// Store base URL
        store_url: String,
        #[arg(long, env = "PRODEX_PRESTASHOP_API_KEY", hide_env_values = true)]
        api_key: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// VTEX catalog API
    Vtex {
        /// VTEX account name
        account: String,
        #[arg(long, env = "PRODEX_VTEX_APP_KEY", hide_env_values = true)]
        app_key: String,
        #[arg(long, env = "PRODEX_VTEX_APP_TOKEN", hide_env_values = true)]
        app_token: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Tienda Nube (Nuvemshop) API
    Tiendanube {
        /// Numeric store (user) id
        user_id: String,
        #[arg(long, env = "PRODEX_TIENDANUBE_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// WooCommerce REST API
    Woocommerce {
        /// Store base URL
        store_url: String,
        #[arg(long, env = "PRODEX_WOOCOMMERCE_CONSUMER_KEY", hide_env_values = true)]
        consumer_key: String,
        #[arg(long, env = "PRODEX_WOOCOMMERCE_CONSUMER_SECRET", hide_env_values = true)]
        consumer_secret: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Files to write
    #[arg(long, value_enum, default_value_t = FormatArg::Xlsx)]
    pub format: FormatArg,

    /// Output directory (defaults to PRODEX_OUTPUT_DIR)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Xlsx,
    Csv,
    Both,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Xlsx => ExportFormat::Xlsx,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Both => ExportFormat::Both,
        }
    }
}

impl ExtractCommands {
    pub(crate) fn output(&self) -> &OutputArgs {
        match self {
            ExtractCommands::Shopify { output, .. }
            | ExtractCommands::ShopifyAdmin { output, .. }
            | ExtractCommands::Prestashop { output, .. }
            | ExtractCommands::Vtex { output, .. }
            | ExtractCommands::Tiendanube { output, .. }
            | ExtractCommands::Woocommerce { output, .. } => output,
        }
    }

    /// Validates the arguments and builds the platform adapter.
    pub(crate) fn to_source(&self, config: &AppConfig) -> Result<Source, ScraperError> {
        let source = match self {
            ExtractCommands::Shopify { store_url, .. } => {
                Source::ShopifyPublic(ShopifyPublic::new(store_url)?)
            }
            ExtractCommands::ShopifyAdmin { store, token, .. } => {
                Source::ShopifyAdmin(ShopifyAdmin::new(store, token)?)
            }
            ExtractCommands::Prestashop {
                store_url, api_key, ..
            } => Source::PrestaShop(
                PrestaShop::new(store_url, api_key)?
                    .with_item_delay(Duration::from_millis(config.item_delay_ms)),
            ),
            ExtractCommands::Vtex {
                account,
                app_key,
                app_token,
                ..
            } => Source::Vtex(Vtex::new(account, app_key, app_token)?),
            ExtractCommands::Tiendanube {
                user_id,
                access_token,
                ..
            } => Source::TiendaNube(TiendaNube::new(user_id, access_token)?),
            ExtractCommands::Woocommerce {
                store_url,
                consumer_key,
                consumer_secret,
                ..
            } => Source::WooCommerce(WooCommerce::new(store_url, consumer_key, consumer_secret)?),
        };
        Ok(source)
    }
}

/// Runs one extraction and writes the requested export files.
///
/// # Errors
///
/// Returns the scraper's user-facing message when validation or extraction
/// fails, or the export error when files cannot be written.
pub(crate) async fn run_extract(
    config: &AppConfig,
    command: &ExtractCommands,
) -> anyhow::Result<()> {
    let source = command.to_source(config).map_err(user_facing)?;
    let client = CatalogClient::from_config(config).map_err(user_facing)?;

    let catalog = run_extraction(&client, &source)
        .await
        .map_err(user_facing)?;
    println!(
        "extracted {} products ({} variants) from {} store {}",
        catalog.products.len(),
        catalog.variant_count(),
        catalog.platform,
        catalog.store_identifier
    );

    let output = command.output();
    let out_dir = output.out.as_deref().unwrap_or(&config.output_dir);
    for path in export_catalog(&catalog, output.format.into(), out_dir)? {
        println!("wrote {}", path.display());
    }
    Ok(())
}

fn user_facing(err: ScraperError) -> anyhow::Error {
    tracing::debug!(error = ?err, "extraction failed");
    anyhow::anyhow!(err.user_message())
}
