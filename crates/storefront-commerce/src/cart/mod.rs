//! Cart engine: line normalization, variant pricing, the store, the coupon
//! protocol and totals.

pub mod coupon;
mod line;
mod pricing;
mod snapshot;
mod store;
mod variant;

pub use coupon::{
    CouponLine, CouponRequest, CouponResponse, CouponState, CouponValidator, REASON_HTTP_FAIL,
    REASON_INVALID, REASON_NETWORK,
};
pub use line::{
    clamp_qty, line_id, normalize, LineInput, OrderLine, PartialLine, PersistedLine,
    PLACEHOLDER_IMAGE, UNTITLED,
};
pub use pricing::{compute_totals, CartTotals, Charges, FlatRatePolicy, PricingPolicy, TotalsSelector};
pub use snapshot::{CartSnapshot, CouponRecord, PersistedCoupon};
pub use store::CartStore;
pub use variant::{commit_quote, ensure_selection_complete, price_for, PriceQuote};
