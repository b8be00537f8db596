//! price-scout - Multi-storefront price comparison CLI
//!
//! Compares prices for configured items across storefronts, with a headless
//! browser fallback for pages that only price up after JavaScript.

use anyhow::Result;
use clap::{Parser, Subcommand};
use price_scout::commands::{CheckCommand, LookupCommand};
use price_scout::config::{Config, OutputFormat};
use price_scout::fetch::RenderEngine;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "price-scout",
    version,
    about = "Multi-storefront price comparison CLI",
    long_about = "Tracks configured items across storefronts, extracts prices with a layered strategy ladder, and falls back to a headless browser for JavaScript-heavy pages."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check prices for every configured item
    #[command(alias = "c")]
    Check {
        /// Bypass intermediate caches with a cache-busting query parameter
        #[arg(long)]
        force: bool,
    },

    /// Look up the price on a single page
    #[command(alias = "l")]
    Lookup {
        /// Page URL
        url: String,

        /// CSS selector hint, optionally with a trailing ::content
        #[arg(short, long)]
        selector: Option<String>,

        /// Skip the direct tier and render the page in a browser
        #[arg(long)]
        rendered: bool,

        /// How long to wait for a price selector, in milliseconds
        #[arg(long)]
        wait_ms: Option<u64>,

        /// User-Agent override
        #[arg(long)]
        user_agent: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();
    config.format = cli.format;

    let result = tokio::select! {
        result = run(cli.command, config) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("interrupted")),
    };

    // The sidecar browser outlives individual fetches; stop it before exit.
    RenderEngine::shutdown_shared().await;

    let output = result?;
    println!("{}", output);
    Ok(())
}

async fn run(command: Commands, mut config: Config) -> Result<String> {
    match command {
        Commands::Check { force } => {
            let cmd = CheckCommand::new(config);
            cmd.execute(force).await
        }

        Commands::Lookup { url, selector, rendered, wait_ms, user_agent } => {
            if let Some(wait) = wait_ms {
                config.wait_ms = wait;
            }
            if let Some(ua) = user_agent {
                config.user_agent = Some(ua);
            }

            let cmd = LookupCommand::new(config);
            cmd.execute(&url, selector.as_deref(), rendered).await
        }
    }
}
