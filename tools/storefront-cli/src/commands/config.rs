//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use storefront_commerce::money::Currency;
use storefront_sdk::{generate_default_config, StorefrontConfig};

use super::{ConfigArgs, ConfigCommand};
use crate::context::{Context, CONFIG_NAMES};

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(defaults)"),
    }

    let config = &ctx.config;

    // Currency section
    ctx.output.info("[currency]");
    ctx.output.kv("base", &config.currency.base);
    ctx.output.kv("display", config.currency.display_code());
    if let Some(ref locale) = config.currency.locale {
        ctx.output.kv("locale", locale);
    }
    for (code, rate) in config.currency.rates.iter() {
        ctx.output.list_item(&format!("{} = {}", code, rate));
    }

    // Pricing section
    ctx.output.info("[pricing]");
    ctx.output.kv("shipping", &config.pricing.shipping.to_string());
    ctx.output.kv("flat_tax", &config.pricing.flat_tax.to_string());

    // Coupon section
    ctx.output.info("[coupon]");
    ctx.output.kv(
        "endpoint",
        config.coupon.endpoint.as_deref().unwrap_or("(none)"),
    );
    ctx.output.kv("timeout_ms", &config.coupon.timeout_ms.to_string());
    ctx.output.kv("max_retries", &config.coupon.max_retries.to_string());

    // Storage section
    ctx.output.info("[storage]");
    match &config.storage.directory {
        Some(dir) => ctx.output.kv("directory", &dir.display().to_string()),
        None => ctx.output.kv("directory", "(memory)"),
    }
    ctx.output.kv("cart_key", &config.storage.cart_key);

    // Logging section
    ctx.output.info("[logging]");
    ctx.output.kv("level", config.logging.level.as_str());
    ctx.output.kv("format", &format!("{:?}", config.logging.format).to_lowercase());

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_NAMES[0]);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check_config(&ctx.config);

    // Print results
    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

/// Errors and warnings for a loaded config.
fn check_config(config: &StorefrontConfig) -> (Vec<String>, Vec<String>) {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    // Currencies
    if Currency::from_code(&config.currency.base).is_none() {
        warnings.push(format!(
            "currency.base '{}' has no known symbol",
            config.currency.base
        ));
    }
    let display = config.currency.display_code();
    if !display.eq_ignore_ascii_case(&config.currency.base)
        && config.currency.rates.rate(display) == 1.0
    {
        warnings.push(format!(
            "currency.rates has no rate for display currency '{}'",
            display
        ));
    }
    for (code, rate) in config.currency.rates.iter() {
        if !rate.is_finite() || rate <= 0.0 {
            errors.push(format!("currency.rates.{} must be a positive number", code));
        }
    }

    // Pricing
    if !config.pricing.shipping.is_finite() || config.pricing.shipping < 0.0 {
        errors.push("pricing.shipping must not be negative".to_string());
    }
    if !config.pricing.flat_tax.is_finite() || config.pricing.flat_tax < 0.0 {
        errors.push("pricing.flat_tax must not be negative".to_string());
    }

    // Coupon
    match config.coupon.endpoint.as_deref() {
        Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
            errors.push("coupon.endpoint must be an http(s) URL".to_string());
        }
        Some(_) => {}
        None => {
            warnings.push("coupon.endpoint is not set; every code will be rejected".to_string())
        }
    }
    if config.coupon.timeout_ms == 0 {
        errors.push("coupon.timeout_ms must be greater than 0".to_string());
    }

    // Storage
    if config.storage.cart_key.trim().is_empty() {
        errors.push("storage.cart_key is required".to_string());
    }

    (errors, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_only_warnings() {
        let config = StorefrontConfig::parse(&generate_default_config(), false).unwrap();
        let (errors, warnings) = check_config(&config);
        assert!(errors.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_bad_values_are_errors() {
        let toml = r#"
[currency]
display = "JPY"

[currency.rates]
EUR = -1.0

[pricing]
shipping = -2.0

[coupon]
endpoint = "ftp://coupons"
timeout_ms = 0

[storage]
cart_key = " "
"#;
        let config = StorefrontConfig::parse(toml, false).unwrap();
        let (errors, warnings) = check_config(&config);
        assert_eq!(errors.len(), 5);
        assert!(warnings.iter().any(|w| w.contains("JPY")));
    }
}
