//! Storefront configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use storefront_cache::{FileStore, KvStore, MemoryStore};
use storefront_commerce::cart::FlatRatePolicy;
use storefront_commerce::money::{self, Money, RateTable};
use storefront_data::{BackoffStrategy, FetchPolicy, HttpCouponValidator, RetryPolicy, TimeoutConfig};
use storefront_observability::LogConfig;

/// Storefront configuration file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    pub currency: CurrencyConfig,
    pub pricing: PricingConfig,
    pub coupon: CouponConfig,
    pub storage: StorageConfig,
    pub logging: LogConfig,
}

impl StorefrontConfig {
    /// Load config from a file; `.json` is read as JSON, anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content, is_json(path))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Parse config text.
    pub fn parse(content: &str, json: bool) -> Result<Self> {
        if json {
            serde_json::from_str(content).context("Invalid JSON config")
        } else {
            toml::from_str(content).context("Invalid TOML config")
        }
    }

    /// Save config to a file, in the format its extension names.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}

/// Base and display currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency all amounts are stored and computed in.
    pub base: String,
    /// Currency amounts are shown in; the base currency when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    /// Rates relative to the base currency.
    pub rates: RateTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            base: "USD".to_string(),
            display: None,
            rates: RateTable::new(),
            locale: None,
        }
    }
}

impl CurrencyConfig {
    pub fn display_code(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.base)
    }

    /// Convert a base amount to the display currency and format it.
    pub fn display(&self, amount: Money) -> String {
        let target = self.display_code();
        let converted = money::convert(amount.to_decimal(), &self.rates, target, &self.base);
        money::format(converted, target, self.locale.as_deref())
    }
}

/// Shipping and tax, in base-currency major units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    pub shipping: f64,
    pub flat_tax: f64,
}

impl PricingConfig {
    pub fn policy(&self) -> FlatRatePolicy {
        FlatRatePolicy::new(
            Money::from_decimal(self.shipping),
            Money::from_decimal(self.flat_tax),
        )
    }
}

/// Coupon validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CouponConfig {
    /// Validation URL. Without one every code is rejected with `NETWORK`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for CouponConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 3000,
            max_retries: 1,
        }
    }
}

impl CouponConfig {
    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy::new(
            TimeoutConfig::from_millis(self.timeout_ms),
            RetryPolicy::new(self.max_retries).with_backoff(BackoffStrategy::default()),
        )
    }

    /// The configured validator, if an endpoint is set.
    pub fn validator(&self) -> Result<Option<HttpCouponValidator>> {
        self.endpoint
            .as_deref()
            .map(|endpoint| {
                HttpCouponValidator::new(endpoint, self.fetch_policy())
                    .context("Failed to build coupon client")
            })
            .transpose()
    }
}

/// Where carts are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for the file store. Carts live in memory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Key (or key namespace, with a session) for the cart snapshot.
    pub cart_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: None,
            cart_key: "cart".to_string(),
        }
    }
}

impl StorageConfig {
    /// Open the configured store.
    pub fn open(&self) -> Result<Arc<dyn KvStore>> {
        match &self.directory {
            Some(dir) => {
                let store = FileStore::open(dir)
                    .with_context(|| format!("Failed to open cart storage: {}", dir.display()))?;
                Ok(Arc::new(store))
            }
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }
}

/// A commented starter config.
pub fn generate_default_config() -> String {
    r#"# Storefront configuration

[currency]
base = "USD"
# display = "EUR"
# locale = "de-DE"

[currency.rates]
EUR = 0.92
GBP = 0.79

[pricing]
shipping = 4.99
flat_tax = 0.0

[coupon]
# endpoint = "https://shop.example.com/api/coupons/validate"
timeout_ms = 3000
max_retries = 1

[storage]
# directory = ".storefront"
cart_key = "cart"

[logging]
level = "info"
format = "human"
"#
    .to_string()
}
