//! Cart totals command.

use anyhow::Result;
use serde::Serialize;
use storefront_commerce::cart::{CartStore, CartTotals, CouponState, OrderLine};

use super::TotalsArgs;
use crate::context::Context;
use crate::output::status_badge;

/// Machine-readable cart summary.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartReport<'a> {
    pub lines: &'a [OrderLine],
    pub coupon: &'a CouponState,
    pub item_count: u64,
    pub totals: CartTotals,
}

/// Run the totals command.
pub async fn run(args: TotalsArgs, ctx: &Context) -> Result<()> {
    let snapshot = ctx.read_snapshot(&args.cart)?;
    let store = CartStore::from_snapshot(snapshot);
    print_cart(&store, ctx);
    Ok(())
}

/// Print the lines, coupon and totals of a cart.
pub fn print_cart(store: &CartStore, ctx: &Context) {
    let policy = ctx.config.pricing.policy();
    let totals = store.totals(&policy);

    if ctx.output.is_json() {
        ctx.output.json(&CartReport {
            lines: store.lines(),
            coupon: store.coupon(),
            item_count: store.item_count(),
            totals,
        });
        return;
    }

    let currency = &ctx.config.currency;
    ctx.output.header(&format!("Cart ({} items)", store.item_count()));

    if store.is_empty() {
        ctx.output.info("Cart is empty");
    } else {
        let widths = [28, 16, 5, 12];
        ctx.output.table_row(&["Item", "Variant", "Qty", "Subtotal"], &widths);
        for line in store.lines() {
            let qty = line.qty().to_string();
            let subtotal = currency.display(line.line_subtotal());
            ctx.output.table_row(
                &[line.title(), line.variant_key(), qty.as_str(), subtotal.as_str()],
                &widths,
            );
        }
    }

    let coupon = store.coupon();
    if let Some(code) = coupon.code() {
        ctx.output.kv("coupon", &format!("{} ({})", code, status_badge(coupon.status())));
    }
    if let CouponState::Invalid { reason, .. } = coupon {
        ctx.output.kv("reason", reason);
    }

    ctx.output.header("Totals");
    ctx.output.kv("subtotal", &currency.display(totals.subtotal));
    ctx.output.kv("discount", &currency.display(totals.discount));
    ctx.output.kv("shipping", &currency.display(totals.shipping));
    ctx.output.kv("tax", &currency.display(totals.tax));
    ctx.output.kv("total", &currency.display(totals.total));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use storefront_commerce::cart::{CouponResponse, FlatRatePolicy, PartialLine};
    use storefront_commerce::Money;

    #[test]
    fn test_report_amounts_are_major_units() {
        let mut store = CartStore::new();
        store.add_line(
            PartialLine::new("tee")
                .with_title("Tee")
                .with_price(Money::from_decimal(50.0)),
            2,
        );
        let request = store.begin_coupon("SAVE10").unwrap();
        store.resolve_coupon(request.generation, &CouponResponse::accepted(10.0));

        let report = CartReport {
            lines: store.lines(),
            coupon: store.coupon(),
            item_count: store.item_count(),
            totals: store.totals(&FlatRatePolicy::new(Money::new(499), Money::zero())),
        };
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["lines"][0]["unitPriceBase"], json!(50.0));
        assert_eq!(
            value["coupon"],
            json!({"status": "applied", "code": "SAVE10", "discountBase": 10.0})
        );
        assert_eq!(
            value["totals"],
            json!({
                "subtotal": 100.0,
                "discount": 10.0,
                "shipping": 4.99,
                "tax": 0.0,
                "total": 94.99
            })
        );
        assert_eq!(value["itemCount"], json!(2));
    }
}
