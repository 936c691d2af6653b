//! # Storefront SDK
//!
//! Everything a storefront client needs to run a cart:
//!
//! - [`StorefrontConfig`] loads currency, pricing, coupon, storage and logging
//!   settings from TOML or JSON
//! - [`CartController`] owns the cart and wires it to storage, the coupon
//!   validator and the pricing policy
//!
//! ## Quick Start
//!
//! ```rust
//! use storefront_sdk::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = StorefrontConfig::parse("[pricing]\nshipping = 4.99\n", false)?;
//! let cart = ConfiguredController::from_config(&config, Some(&SessionId::generate()))?;
//! cart.restore();
//!
//! cart.add_line(PartialLine::new("tee-001").with_price(Money::from_decimal(20.0)), 2);
//! let state = cart.apply_coupon("SAVE10").await;
//! println!("{:?} {}", state, config.currency.display(cart.totals().total));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;

pub use config::{
    generate_default_config, CouponConfig, CurrencyConfig, PricingConfig, StorageConfig,
    StorefrontConfig,
};
pub use controller::{CartController, ConfiguredController};

// Re-export the storefront crates
pub use storefront_cache;
pub use storefront_commerce;
pub use storefront_data;
pub use storefront_observability;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{CartController, ConfiguredController, StorefrontConfig};
    pub use storefront_cache::{FileStore, KvStore, MemoryStore, SessionId, SnapshotStore};
    pub use storefront_commerce::prelude::*;
    pub use storefront_data::HttpCouponValidator;
    pub use storefront_observability::{LogConfig, LogFormat, LogLevel};
}
