//! Coupon validation command.

use anyhow::Result;
use storefront_commerce::cart::{CartStore, CouponValidator};

use super::CouponArgs;
use crate::context::Context;
use crate::output::status_badge;

/// Run the coupon command.
pub async fn run(args: CouponArgs, ctx: &Context) -> Result<()> {
    let snapshot = ctx.read_snapshot(&args.cart)?;
    let mut store = CartStore::from_snapshot(snapshot);

    let mut coupon_config = ctx.config.coupon.clone();
    if let Some(endpoint) = args.endpoint {
        coupon_config.endpoint = Some(endpoint);
    }

    match store.begin_coupon(&args.code) {
        Some(request) => {
            let validator = coupon_config.validator()?;
            if validator.is_none() {
                ctx.output.warn("No coupon endpoint configured");
            }
            ctx.output.debug(&format!(
                "Validating {} against {} line(s)",
                request.code,
                request.lines.len()
            ));

            let response = validator.validate(&request).await;
            store.resolve_coupon(request.generation, &response);

            let state = store.coupon();
            let code = state.code().unwrap_or(&request.code);
            let msg = format!("{} {}", code, status_badge(state.status()));
            if state.is_applied() {
                ctx.output.success(&msg);
            } else {
                ctx.output.warn(&msg);
            }
        }
        None => ctx.output.info("Coupon removed"),
    }

    super::totals::print_cart(&store, ctx);

    if args.write {
        ctx.write_snapshot(&args.cart, &store.snapshot())?;
        ctx.output.success(&format!("Updated: {}", args.cart));
    }

    Ok(())
}
