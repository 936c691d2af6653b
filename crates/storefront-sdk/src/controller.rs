//! Cart controller: the cart store wired to storage, coupon validation and a
//! pricing policy.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use storefront_cache::{KvStore, SessionId, SnapshotStore};
use storefront_commerce::cart::{
    CartSnapshot, CartStore, CartTotals, CouponState, CouponValidator, LineInput, OrderLine,
    PricingPolicy,
};
use storefront_commerce::catalog::{Product, Selection};
use storefront_commerce::{CommerceError, LineId};
use storefront_data::HttpCouponValidator;
use tracing::{debug, info, warn};

use crate::config::StorefrontConfig;

/// Controller built from a [`StorefrontConfig`].
pub type ConfiguredController = CartController<Arc<dyn KvStore>, Option<HttpCouponValidator>>;

/// Owns one cart and everything it talks to.
///
/// Cloning is cheap and every clone drives the same cart, so a controller
/// can be handed to each UI component that needs it. Every change is saved
/// right away, before the next change can start; a failed save is logged and
/// otherwise ignored.
pub struct CartController<S, V> {
    store: Arc<Mutex<CartStore>>,
    snapshots: Arc<SnapshotStore<CartSnapshot, S>>,
    validator: Arc<V>,
    policy: Arc<dyn PricingPolicy>,
}

impl<S, V> Clone for CartController<S, V> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            snapshots: Arc::clone(&self.snapshots),
            validator: Arc::clone(&self.validator),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl ConfiguredController {
    /// Build a controller from config.
    ///
    /// With a session the cart lives under `cart_key:session`, otherwise
    /// under `cart_key` itself. The controller starts empty; call
    /// [`CartController::restore`] to load the saved cart.
    pub fn from_config(config: &StorefrontConfig, session: Option<&SessionId>) -> Result<Self> {
        let store = config.storage.open()?;
        let key = &config.storage.cart_key;
        let snapshots = match session {
            Some(session) => SnapshotStore::for_session(store, key, session),
            None => SnapshotStore::new(store, key.as_str()),
        };
        let validator = config.coupon.validator()?;
        Ok(Self::new(
            snapshots,
            validator,
            Arc::new(config.pricing.policy()),
        ))
    }
}

impl<S, V> CartController<S, V>
where
    S: KvStore,
    V: CouponValidator,
{
    pub fn new(
        snapshots: SnapshotStore<CartSnapshot, S>,
        validator: V,
        policy: Arc<dyn PricingPolicy>,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(CartStore::new())),
            snapshots: Arc::new(snapshots),
            validator: Arc::new(validator),
            policy,
        }
    }

    /// Replace the cart with the saved snapshot.
    ///
    /// A missing or unreadable snapshot leaves an empty cart. Returns whether
    /// a snapshot was loaded.
    pub fn restore(&self) -> bool {
        let snapshot = match self.snapshots.load() {
            Ok(Some(snapshot)) => Some(snapshot),
            Ok(None) => None,
            Err(err) => {
                warn!(key = self.snapshots.key(), error = %err, "cart_restore_failed");
                None
            }
        };
        let loaded = snapshot.is_some();
        let mut store = self.lock();
        match snapshot {
            Some(snapshot) => store.hydrate(snapshot),
            None => store.clear(),
        }
        info!(
            key = self.snapshots.key(),
            loaded,
            lines = store.lines().len(),
            "cart_restored"
        );
        loaded
    }

    pub fn add_line(&self, input: impl Into<LineInput>, qty: i64) -> LineId {
        self.mutate(|store| store.add_line(input, qty))
    }

    /// Add a product, refusing selections that miss a required attribute.
    pub fn add_product(
        &self,
        product: &Product,
        selection: &Selection,
        qty: i64,
    ) -> Result<LineId, CommerceError> {
        self.mutate(|store| store.add_product(product, selection, qty))
    }

    pub fn set_qty(&self, line_id: &LineId, qty: i64) -> bool {
        self.mutate(|store| store.set_qty(line_id, qty))
    }

    pub fn remove_line(&self, line_id: &LineId) -> bool {
        self.mutate(|store| store.remove_line(line_id))
    }

    pub fn clear(&self) {
        self.mutate(CartStore::clear)
    }

    pub fn remove_coupon(&self) {
        self.mutate(CartStore::remove_coupon)
    }

    /// Submit a coupon code and wait for the validator.
    ///
    /// The cart is not locked while the validator runs. If another code is
    /// submitted (or the coupon removed) in the meantime, this answer is
    /// dropped. Returns the coupon state after the exchange.
    pub async fn apply_coupon(&self, code: &str) -> CouponState {
        let Some(request) = self.mutate(|store| store.begin_coupon(code)) else {
            return self.coupon();
        };

        let response = self.validator.validate(&request).await;

        self.mutate(|store| {
            if !store.resolve_coupon(request.generation, &response) {
                debug!(code = %request.code, "coupon_answer_superseded");
            }
            store.coupon().clone()
        })
    }

    /// Totals under the controller's pricing policy.
    pub fn totals(&self) -> CartTotals {
        self.lock().totals(self.policy.as_ref())
    }

    pub fn lines(&self) -> Vec<OrderLine> {
        self.lock().lines().to_vec()
    }

    pub fn coupon(&self) -> CouponState {
        self.lock().coupon().clone()
    }

    pub fn item_count(&self) -> u64 {
        self.lock().item_count()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot()
    }

    /// Read the store under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&CartStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn policy(&self) -> Arc<dyn PricingPolicy> {
        Arc::clone(&self.policy)
    }

    // Applies a change and saves the result if the cart changed. The save
    // happens under the lock so saves land in mutation order.
    fn mutate<R>(&self, f: impl FnOnce(&mut CartStore) -> R) -> R {
        let mut store = self.lock();
        let before = store.revision();
        let result = f(&mut store);
        if store.revision() != before {
            self.persist(&store.snapshot());
        }
        result
    }

    fn persist(&self, snapshot: &CartSnapshot) {
        match self.snapshots.save(snapshot) {
            Ok(version) => debug!(key = self.snapshots.key(), version, "cart_saved"),
            Err(err) => warn!(key = self.snapshots.key(), error = %err, "cart_save_failed"),
        }
    }

    // Cart state stays consistent even if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, CartStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, V> std::fmt::Debug for CartController<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartController").finish_non_exhaustive()
    }
}
