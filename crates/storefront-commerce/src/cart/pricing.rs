//! Cart totals derivation.

use crate::cart::{CartStore, CouponState, OrderLine};
use crate::money::Money;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Shipping and tax charged for a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Charges {
    pub shipping: Money,
    pub tax: Money,
}

/// Decides shipping and tax for a cart subtotal.
///
/// Any `Fn(Money) -> Charges` closure is a policy.
pub trait PricingPolicy: Send + Sync {
    fn charges(&self, subtotal: Money) -> Charges;
}

impl<F> PricingPolicy for F
where
    F: Fn(Money) -> Charges + Send + Sync,
{
    fn charges(&self, subtotal: Money) -> Charges {
        self(subtotal)
    }
}

/// Fixed shipping fee plus a flat tax amount.
///
/// Nothing is charged on an empty subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FlatRatePolicy {
    pub shipping: Money,
    pub flat_tax: Money,
}

impl FlatRatePolicy {
    pub fn new(shipping: Money, flat_tax: Money) -> Self {
        Self { shipping, flat_tax }
    }
}

impl PricingPolicy for FlatRatePolicy {
    fn charges(&self, subtotal: Money) -> Charges {
        if subtotal.is_positive() {
            Charges {
                shipping: self.shipping,
                tax: self.flat_tax,
            }
        } else {
            Charges::default()
        }
    }
}

/// Derived cart totals. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub shipping: Money,
    pub tax: Money,
    /// `max(0, subtotal - discount + shipping + tax)`.
    pub total: Money,
}

impl fmt::Display for CartTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subtotal {} - discount {} + shipping {} + tax {} = {}",
            self.subtotal, self.discount, self.shipping, self.tax, self.total
        )
    }
}

/// Compute totals from scratch.
///
/// Pure: the same lines, coupon and policy always give the same result.
/// Tax is only charged on a positive subtotal, whatever the policy says.
pub fn compute_totals<P>(lines: &[OrderLine], coupon: &CouponState, policy: &P) -> CartTotals
where
    P: PricingPolicy + ?Sized,
{
    let subtotal = lines
        .iter()
        .fold(Money::zero(), |acc, line| acc + line.line_subtotal());
    let discount = coupon.discount();
    let charges = policy.charges(subtotal);
    let shipping = charges.shipping.non_negative();
    let tax = if subtotal.is_positive() {
        charges.tax.non_negative()
    } else {
        Money::zero()
    };
    let total = (subtotal - discount + shipping + tax).non_negative();

    CartTotals {
        subtotal,
        discount,
        shipping,
        tax,
        total,
    }
}

/// Memoized totals for a cart store.
///
/// Recomputes only when the store's revision changes. One selector should
/// follow one store.
pub struct TotalsSelector {
    policy: Arc<dyn PricingPolicy>,
    cached: Option<(u64, CartTotals)>,
}

impl TotalsSelector {
    pub fn new(policy: Arc<dyn PricingPolicy>) -> Self {
        Self {
            policy,
            cached: None,
        }
    }

    /// Totals for the store's current revision.
    pub fn select(&mut self, store: &CartStore) -> CartTotals {
        let revision = store.revision();
        match self.cached {
            Some((cached_revision, totals)) if cached_revision == revision => totals,
            _ => {
                let totals = store.totals(self.policy.as_ref());
                self.cached = Some((revision, totals));
                totals
            }
        }
    }

    /// Whether totals for `revision` are cached.
    pub fn is_cached(&self, revision: u64) -> bool {
        matches!(self.cached, Some((cached, _)) if cached == revision)
    }
}

impl fmt::Debug for TotalsSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TotalsSelector")
            .field("cached", &self.cached)
            .finish_non_exhaustive()
    }
}
