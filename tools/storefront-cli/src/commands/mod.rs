//! CLI command implementations.

pub mod config;
pub mod coupon;
pub mod price;
pub mod totals;

use clap::{Args, Subcommand};

/// Arguments for the totals command.
#[derive(Args)]
pub struct TotalsArgs {
    /// Cart snapshot file (JSON).
    pub cart: String,
}

/// Arguments for the price command.
#[derive(Args)]
pub struct PriceArgs {
    /// Product file (JSON).
    pub product: String,

    /// Attribute selection as key=value. Repeatable.
    #[arg(short, long = "select", value_name = "KEY=VALUE")]
    pub selections: Vec<String>,

    /// Fail unless every required attribute is selected.
    #[arg(long)]
    pub commit: bool,
}

/// Arguments for the coupon command.
#[derive(Args)]
pub struct CouponArgs {
    /// Cart snapshot file (JSON).
    pub cart: String,

    /// Coupon code to validate. An empty code removes the coupon.
    pub code: String,

    /// Validation URL, overriding the configured endpoint.
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Write the updated cart back to the file.
    #[arg(short, long)]
    pub write: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
