//! Storefront CLI - inspect carts, prices and coupons from the command line.
//!
//! Commands:
//! - `storefront totals` - Show the lines and totals of a saved cart
//! - `storefront price` - Price a product under an attribute selection
//! - `storefront coupon` - Validate a coupon code against a saved cart
//! - `storefront config` - Manage configuration

mod commands;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use storefront_observability::LogLevel;

use commands::{ConfigArgs, CouponArgs, PriceArgs, TotalsArgs};

/// Storefront CLI - Inspect carts, prices and coupons
#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the lines and totals of a saved cart
    Totals(TotalsArgs),

    /// Price a product under an attribute selection
    Price(PriceArgs),

    /// Validate a coupon code against a saved cart
    Coupon(CouponArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let mut logging = ctx.config.logging.clone();
    if cli.verbose {
        logging.level = logging.level.min(LogLevel::Debug);
    }
    if let Err(e) = storefront_observability::init(&logging) {
        ctx.output.debug(&format!("Logging not initialized: {}", e));
    }

    // Execute command
    let result = match cli.command {
        Commands::Totals(args) => commands::totals::run(args, &ctx).await,
        Commands::Price(args) => commands::price::run(args, &ctx).await,
        Commands::Coupon(args) => commands::coupon::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
