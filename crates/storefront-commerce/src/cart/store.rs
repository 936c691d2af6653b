//! The cart store: ordered lines plus one coupon slot.

use crate::cart::variant::ensure_selection_complete;
use crate::cart::{
    compute_totals, normalize, CartSnapshot, CartTotals, CouponRequest, CouponResponse,
    CouponState, LineInput, OrderLine, PersistedCoupon, PersistedLine, PricingPolicy,
};
use crate::catalog::{Product, Selection};
use crate::error::CommerceError;
use crate::ids::LineId;
use tracing::{debug, info, warn};

/// Owned cart state.
///
/// Every mutation bumps [`CartStore::revision`], which memoized readers such
/// as [`TotalsSelector`](crate::cart::TotalsSelector) key on. Mutations never
/// fail; malformed input degrades to defaults.
#[derive(Debug, Clone, Default)]
pub struct CartStore {
    lines: Vec<OrderLine>,
    coupon: CouponState,
    coupon_generation: u64,
    revision: u64,
}

impl CartStore {
    /// An empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cart restored from a snapshot.
    pub fn from_snapshot(snapshot: CartSnapshot) -> Self {
        let mut store = Self::new();
        store.hydrate(snapshot);
        store
    }

    /// Add `qty` units of a line.
    ///
    /// A line with the same identity has its quantity increased; otherwise
    /// the line is appended. A requested quantity below one counts as one.
    pub fn add_line(&mut self, input: impl Into<LineInput>, qty: i64) -> LineId {
        let line = normalize(input);
        let line_id = self.merge(line, qty.max(1));
        self.touch();
        debug!(%line_id, qty, lines = self.lines.len(), "cart_line_added");
        line_id
    }

    /// Add a product under a selection, refusing incomplete selections.
    ///
    /// The cart is untouched when a required attribute is unselected.
    pub fn add_product(
        &mut self,
        product: &Product,
        selection: &Selection,
        qty: i64,
    ) -> Result<LineId, CommerceError> {
        if let Err(err) = ensure_selection_complete(product, selection) {
            debug!(error = %err, "cart_add_refused");
            return Err(err);
        }
        Ok(self.add_line(
            LineInput::product(product.clone(), selection.clone()),
            qty,
        ))
    }

    /// Set a line's quantity, clamped to `[1, max_qty]`.
    ///
    /// Returns `false` when no such line exists.
    pub fn set_qty(&mut self, line_id: &LineId, qty: i64) -> bool {
        let Some(line) = self.lines.iter_mut().find(|l| l.line_id() == line_id) else {
            return false;
        };
        line.set_qty(qty);
        let applied = line.qty();
        self.touch();
        debug!(%line_id, requested = qty, applied, "cart_qty_set");
        true
    }

    /// Remove a line. Returns `false` when no such line exists.
    pub fn remove_line(&mut self, line_id: &LineId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.line_id() != line_id);
        if self.lines.len() == before {
            return false;
        }
        self.touch();
        debug!(%line_id, "cart_line_removed");
        true
    }

    /// Empty the cart and its coupon slot.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.reset_coupon(CouponState::None);
        self.touch();
        debug!("cart_cleared");
    }

    /// Replace the cart with a persisted snapshot.
    ///
    /// Lines are normalized; duplicates by identity are merged.
    pub fn hydrate(&mut self, snapshot: CartSnapshot) {
        self.lines.clear();
        for item in snapshot.items {
            let line = normalize(item);
            let qty = i64::from(line.qty());
            self.merge(line, qty);
        }
        let coupon = snapshot
            .coupon
            .map(PersistedCoupon::into_state)
            .unwrap_or_default();
        self.reset_coupon(coupon);
        self.touch();
        debug!(lines = self.lines.len(), coupon = self.coupon.status(), "cart_hydrated");
    }

    /// Persistable form of the cart.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.lines.iter().map(PersistedLine::from).collect(),
            coupon: PersistedCoupon::from_state(&self.coupon),
        }
    }

    /// Start a coupon check for `code`.
    ///
    /// The slot moves to pending immediately and any earlier check becomes
    /// stale. A blank code empties the slot and returns `None`.
    ///
    /// The request carries the lines as they are now. Lines edited while the
    /// check is pending do not invalidate it, so the resolved discount
    /// describes the cart at submit time.
    pub fn begin_coupon(&mut self, code: &str) -> Option<CouponRequest> {
        let code = code.trim();
        if code.is_empty() {
            self.remove_coupon();
            return None;
        }
        self.reset_coupon(CouponState::Pending {
            code: code.to_string(),
        });
        self.touch();
        info!(code, generation = self.coupon_generation, "coupon_check_started");
        Some(CouponRequest::new(self.coupon_generation, code, &self.lines))
    }

    /// Apply a validator response to the check issued under `generation`.
    ///
    /// Responses to superseded checks are discarded and `false` is returned.
    pub fn resolve_coupon(&mut self, generation: u64, response: &CouponResponse) -> bool {
        let code = match &self.coupon {
            CouponState::Pending { code } if generation == self.coupon_generation => code.clone(),
            _ => {
                warn!(
                    generation,
                    current = self.coupon_generation,
                    "coupon_response_stale"
                );
                return false;
            }
        };
        self.coupon = CouponState::from_response(code, response);
        self.touch();
        info!(
            code = self.coupon.code().unwrap_or_default(),
            status = self.coupon.status(),
            discount = %self.coupon.discount(),
            "coupon_check_resolved"
        );
        true
    }

    /// Empty the coupon slot, discarding any in-flight check.
    pub fn remove_coupon(&mut self) {
        self.reset_coupon(CouponState::None);
        self.touch();
        info!("coupon_removed");
    }

    /// Totals under `policy`, computed from scratch.
    pub fn totals<P>(&self, policy: &P) -> CartTotals
    where
        P: PricingPolicy + ?Sized,
    {
        compute_totals(&self.lines, &self.coupon, policy)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line(&self, line_id: &LineId) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.line_id() == line_id)
    }

    pub fn coupon(&self) -> &CouponState {
        &self.coupon
    }

    /// Generation of the most recently issued coupon check.
    pub fn coupon_generation(&self) -> u64 {
        self.coupon_generation
    }

    /// Increases on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.qty())).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn merge(&mut self, mut line: OrderLine, qty: i64) -> LineId {
        let line_id = line.line_id().clone();
        match self.lines.iter_mut().find(|l| l.line_id() == &line_id) {
            Some(existing) => existing.add_qty(qty),
            None => {
                line.set_qty(qty);
                self.lines.push(line);
            }
        }
        line_id
    }

    fn reset_coupon(&mut self, state: CouponState) {
        self.coupon_generation += 1;
        self.coupon = state;
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

impl From<CartSnapshot> for CartStore {
    fn from(snapshot: CartSnapshot) -> Self {
        Self::from_snapshot(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{FlatRatePolicy, PartialLine};
    use crate::catalog::{AttributeKind, VariantAttribute};
    use crate::money::Money;

    fn tee(price_cents: i64) -> PartialLine {
        PartialLine::new("tee")
            .with_title("Tee")
            .with_variant_key("size=M")
            .with_price(Money::new(price_cents))
    }

    #[test]
    fn test_same_identity_merges() {
        let mut cart = CartStore::new();
        let first = cart.add_line(tee(2000), 1);
        let second = cart.add_line(tee(2000), 2);

        assert_eq!(first, second);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&first).unwrap().qty(), 3);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_identity_is_sensitive_to_variant_and_price() {
        let mut cart = CartStore::new();
        cart.add_line(tee(2000), 1);
        cart.add_line(tee(2000).with_variant_key("size=L"), 1);
        cart.add_line(tee(2100), 1);
        assert_eq!(cart.lines().len(), 3);
    }

    #[test]
    fn test_qty_clamps() {
        let mut cart = CartStore::new();
        let id = cart.add_line(tee(2000), 0);
        assert_eq!(cart.line(&id).unwrap().qty(), 1);

        assert!(cart.set_qty(&id, -5));
        assert_eq!(cart.line(&id).unwrap().qty(), 1);

        let limited = cart.add_line(tee(500).with_max_qty(3), 10);
        assert_eq!(cart.line(&limited).unwrap().qty(), 3);
        cart.add_line(tee(500).with_max_qty(3), 1);
        assert_eq!(cart.line(&limited).unwrap().qty(), 3);
    }

    #[test]
    fn test_missing_line_is_noop() {
        let mut cart = CartStore::new();
        cart.add_line(tee(2000), 1);
        let revision = cart.revision();
        let missing = LineId::new("nope");

        assert!(!cart.set_qty(&missing, 4));
        assert!(!cart.remove_line(&missing));
        assert_eq!(cart.revision(), revision);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = CartStore::new();
        let id = cart.add_line(tee(2000), 1);
        cart.add_line(tee(900), 1);
        assert!(cart.remove_line(&id));
        assert_eq!(cart.lines().len(), 1);

        cart.begin_coupon("SAVE10");
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.coupon().is_none());
    }

    #[test]
    fn test_empty_cart_totals() {
        let cart = CartStore::new();
        let totals = cart.totals(&FlatRatePolicy::new(Money::new(500), Money::new(200)));
        assert_eq!(totals.subtotal, Money::zero());
        assert_eq!(totals.tax, Money::zero());
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_coupon_round_trip() {
        let mut cart = CartStore::new();
        cart.add_line(tee(5000), 2);

        let request = cart.begin_coupon("SAVE10").unwrap();
        assert!(cart.coupon().is_pending());
        assert_eq!(request.lines.len(), 1);
        assert_eq!(request.lines[0].qty, 2);

        assert!(cart.resolve_coupon(request.generation, &CouponResponse::accepted(10.0)));
        let totals = cart.totals(&FlatRatePolicy::default());
        assert_eq!(totals.subtotal, Money::from_decimal(100.0));
        assert_eq!(totals.discount, Money::from_decimal(10.0));
        assert_eq!(totals.total, Money::from_decimal(90.0));
    }

    #[test]
    fn test_coupon_rejection() {
        let mut cart = CartStore::new();
        cart.add_line(tee(5000), 2);
        let request = cart.begin_coupon("OLD").unwrap();
        cart.resolve_coupon(request.generation, &CouponResponse::rejected("EXPIRED"));

        assert_eq!(
            cart.coupon(),
            &CouponState::Invalid {
                code: "OLD".into(),
                reason: "EXPIRED".into()
            }
        );
        assert_eq!(cart.totals(&FlatRatePolicy::default()).discount, Money::zero());
    }

    #[test]
    fn test_stale_coupon_response_is_discarded() {
        let mut cart = CartStore::new();
        cart.add_line(tee(5000), 2);

        let first = cart.begin_coupon("FIRST").unwrap();
        let second = cart.begin_coupon("SECOND").unwrap();

        assert!(cart.resolve_coupon(second.generation, &CouponResponse::rejected("EXPIRED")));
        assert!(!cart.resolve_coupon(first.generation, &CouponResponse::accepted(10.0)));
        assert_eq!(cart.coupon().code(), Some("SECOND"));
        assert!(cart.coupon().is_invalid());
    }

    #[test]
    fn test_coupon_request_describes_cart_at_submit() {
        let mut cart = CartStore::new();
        cart.add_line(tee(5000), 1);
        let request = cart.begin_coupon("SAVE10").unwrap();

        cart.add_line(PartialLine::new("mug").with_price(Money::new(800)), 1);
        assert_eq!(request.lines.len(), 1);

        assert!(cart.resolve_coupon(request.generation, &CouponResponse::accepted(10.0)));
        assert_eq!(cart.coupon().discount(), Money::new(1000));
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_removed_coupon_ignores_late_response() {
        let mut cart = CartStore::new();
        let request = cart.begin_coupon("SAVE10").unwrap();
        cart.remove_coupon();
        assert!(!cart.resolve_coupon(request.generation, &CouponResponse::accepted(10.0)));
        assert!(cart.coupon().is_none());
    }

    #[test]
    fn test_blank_code_clears_slot() {
        let mut cart = CartStore::new();
        cart.begin_coupon("SAVE10");
        assert!(cart.begin_coupon("   ").is_none());
        assert!(cart.coupon().is_none());
    }

    #[test]
    fn test_required_gate_leaves_cart_untouched() {
        let product = Product::new("phone", "Phone", 500.0).with_attribute(
            VariantAttribute::new("storage", AttributeKind::Select)
                .with_values(["128GB", "256GB"])
                .required(),
        );
        let mut cart = CartStore::new();
        let revision = cart.revision();

        let err = cart
            .add_product(&product, &Selection::for_attributes(&product.attributes), 1)
            .unwrap_err();
        assert!(err.is_missing_selection());
        assert!(cart.is_empty());
        assert_eq!(cart.revision(), revision);

        let id = cart
            .add_product(&product, &Selection::new().with("storage", "128GB"), 2)
            .unwrap();
        assert_eq!(cart.line(&id).unwrap().qty(), 2);
    }

    #[test]
    fn test_persistence_round_trip() {
        let product = Product::new("phone", "Phone", 500.0)
            .with_adjustment("storage", "256GB", 100.0)
            .with_old_price(650.0);

        let mut cart = CartStore::new();
        cart.add_line(
            LineInput::product(product, Selection::new().with("storage", "256GB")),
            1,
        );
        cart.add_line(tee(1999), 3);
        cart.add_line(
            PersistedLine {
                sku: Some("MUG-1".into()),
                name: Some("Mug".into()),
                unit_price: Some(8.5),
                ..Default::default()
            },
            2,
        );
        let request = cart.begin_coupon("SAVE10").unwrap();
        cart.resolve_coupon(request.generation, &CouponResponse::accepted(10.0));

        let json = cart.snapshot().to_json().unwrap();
        let restored = CartStore::from_snapshot(CartSnapshot::from_json(&json).unwrap());

        assert_eq!(restored.lines(), cart.lines());
        assert_eq!(restored.coupon(), cart.coupon());
        let policy = FlatRatePolicy::new(Money::new(499), Money::new(100));
        assert_eq!(restored.totals(&policy), cart.totals(&policy));
    }

    #[test]
    fn test_hydrate_merges_duplicate_lines() {
        let line = PersistedLine {
            product_id: Some("tee".into()),
            unit_price_base: Some(20.0),
            qty: Some(2.0),
            ..Default::default()
        };
        let snapshot = CartSnapshot {
            items: vec![line.clone(), line],
            coupon: Some(PersistedCoupon::Code("LEGACY".into())),
        };
        let cart = CartStore::from(snapshot);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 4);
        assert!(cart.coupon().is_applied());
        assert_eq!(cart.coupon().discount(), Money::zero());
    }

    #[test]
    fn test_revision_advances_on_mutation() {
        let mut cart = CartStore::new();
        let start = cart.revision();
        let id = cart.add_line(tee(100), 1);
        cart.set_qty(&id, 2);
        cart.remove_coupon();
        assert_eq!(cart.revision(), start + 3);
    }
}
