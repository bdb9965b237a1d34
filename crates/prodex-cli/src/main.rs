mod extract;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::extract::{run_extract, ExtractCommands};

#[derive(Debug, Parser)]
#[command(name = "prodex")]
#[command(about = "Extract e-commerce product catalogs to spreadsheet and CSV files")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a store's full catalog
    Extract {
        #[command(subcommand)]
        command: ExtractCommands,
    },
    /// Print the effective configuration (secrets redacted)
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = prodex_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Extract { command }) => run_extract(&config, &command).await?,
        Some(Commands::Config) => println!("{config:#?}"),
        None => println!("prodex: run `prodex extract --help` to get started"),
    }

    Ok(())
}
