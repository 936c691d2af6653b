//! Variant pricing command.

use anyhow::{bail, Context as _, Result};
use serde::Serialize;
use storefront_commerce::cart::{commit_quote, price_for, PriceQuote};
use storefront_commerce::catalog::{Product, Selection};

use super::PriceArgs;
use crate::context::Context;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceReport {
    variant_key: String,
    missing: Vec<String>,
    #[serde(flatten)]
    quote: PriceQuote,
}

/// Run the price command.
pub async fn run(args: PriceArgs, ctx: &Context) -> Result<()> {
    let path = ctx.resolve_path(&args.product);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read product file: {}", path.display()))?;
    let product: Product = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse product file: {}", path.display()))?;

    let selection = parse_selection(&product, &args.selections)?;
    let quote = if args.commit {
        commit_quote(&product, &selection)?
    } else {
        price_for(&product, &selection)
    };
    let missing = selection.missing_required(&product.attributes);

    if ctx.output.is_json() {
        ctx.output.json(&PriceReport {
            variant_key: selection.variant_key(),
            missing,
            quote,
        });
        return Ok(());
    }

    let currency = &ctx.config.currency;
    ctx.output.header(product.display_title().unwrap_or("Untitled product"));
    let variant_key = selection.variant_key();
    if !variant_key.is_empty() {
        ctx.output.kv("variant", &variant_key);
    }
    ctx.output.kv("price", &currency.display(quote.unit_price));
    if let Some(compare) = quote.compare_price {
        ctx.output.kv("was", &currency.display(compare));
    }
    if let Some(percent) = quote.discount_percent {
        ctx.output.kv("discount", &format!("{}%", percent));
    }
    for key in &missing {
        ctx.output.warn(&format!("Required attribute not selected: {}", key));
    }

    Ok(())
}

/// One entry per product attribute, then each `key=value` argument applied.
///
/// Keys must name one of the product's attributes. An empty value clears
/// the attribute.
fn parse_selection(product: &Product, args: &[String]) -> Result<Selection> {
    let mut selection = Selection::for_attributes(&product.attributes);
    for arg in args {
        let Some((key, value)) = arg.split_once('=') else {
            bail!("Invalid selection '{}': expected KEY=VALUE", arg);
        };
        let key = key.trim();
        if product.attribute(key).is_none() {
            bail!("Unknown attribute '{}'", key);
        }
        match value.trim() {
            "" => selection.unselect(key),
            value => selection.select(key, value),
        }
    }
    Ok(selection)
}
