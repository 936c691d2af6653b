//! Cart and pricing engine for the storefront client.
//!
//! This crate holds the part of the storefront with real invariants:
//!
//! - **Money**: base-currency amounts, display conversion and formatting
//! - **Catalog**: the consumed product shape, variant attributes, price adjustments
//! - **Cart**: line normalization and identity, variant pricing, the cart store,
//!   the coupon validation protocol and totals derivation
//!
//! # Example
//!
//! ```rust
//! use storefront_commerce::prelude::*;
//!
//! let mut cart = CartStore::new();
//! let line = PartialLine::new("tee-001")
//!     .with_title("Plain Tee")
//!     .with_price(Money::from_decimal(20.0));
//! cart.add_line(line, 2);
//!
//! let totals = cart.totals(&FlatRatePolicy::default());
//! assert_eq!(totals.total, Money::from_decimal(40.0));
//! ```

pub mod error;
pub mod ids;
pub mod money;

pub mod cart;
pub mod catalog;

pub use error::CommerceError;
pub use ids::*;
pub use money::{Currency, Money, RateTable};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::CommerceError;
    pub use crate::ids::*;
    pub use crate::money::{convert, format, Currency, Money, RateTable};

    // Catalog
    pub use crate::catalog::{
        AttributeKind, PriceAdjustments, PriceField, Product, Selection, VariantAttribute,
    };

    // Cart
    pub use crate::cart::{
        compute_totals, normalize, price_for, CartSnapshot, CartStore, CartTotals, Charges,
        CouponRequest, CouponResponse, CouponState, CouponValidator, FlatRatePolicy, LineInput,
        OrderLine, PartialLine, PersistedCoupon, PersistedLine, PriceQuote, PricingPolicy,
        TotalsSelector,
    };
}
