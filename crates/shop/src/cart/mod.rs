//! In-memory cart store.
//!
//! [`CartStore`] is the single authority for the current session's cart. It
//! is cheaply cloneable (`Arc` inside); every clone sees the same lines, so
//! the cart badge, the cart page, and checkout can each hold a handle.
//!
//! # Consistency
//!
//! Every mutation takes the write lock once, applies the whole change, and
//! releases it. Readers take [`CartStore::snapshot`] and therefore never see a
//! half-applied update. Totals are computed from a snapshot on demand and are
//! never stored.
//!
//! # Persistence
//!
//! A store built with [`CartStore::with_storage`] mirrors its lines to the
//! [`keys::CART`] entry after each mutation, while still holding the write
//! lock. Storage failures are logged and otherwise ignored: cart operations
//! cannot fail.

mod line;

pub use line::{Cart, CartLine, CartProduct};

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use planttaxa_core::{Price, ProductId, ZeroQuantityPolicy};

use crate::storage::{KeyValueStore, keys};

/// Shared, thread-safe cart store.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    lines: RwLock<Vec<CartLine>>,
    storage: Option<Arc<dyn KeyValueStore>>,
    zero_policy: ZeroQuantityPolicy,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.snapshot().len())
            .field("persistent", &self.inner.storage.is_some())
            .field("zero_policy", &self.inner.zero_policy)
            .finish()
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(ZeroQuantityPolicy::default())
    }
}

impl CartStore {
    /// Create an empty, memory-only cart.
    #[must_use]
    pub fn new(zero_policy: ZeroQuantityPolicy) -> Self {
        Self::build(Vec::new(), None, zero_policy)
    }

    /// Create a cart mirrored to `storage`, starting from whatever it holds.
    ///
    /// A missing or unreadable stored cart yields an empty cart.
    #[must_use]
    pub fn with_storage(storage: Arc<dyn KeyValueStore>, zero_policy: ZeroQuantityPolicy) -> Self {
        let lines = load_lines(storage.as_ref());
        tracing::debug!(lines = lines.len(), "Loaded cart from storage");
        Self::build(lines, Some(storage), zero_policy)
    }

    fn build(
        lines: Vec<CartLine>,
        storage: Option<Arc<dyn KeyValueStore>>,
        zero_policy: ZeroQuantityPolicy,
    ) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                lines: RwLock::new(lines),
                storage,
                zero_policy,
            }),
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of `product`.
    ///
    /// Increments the existing line for the same product id, or appends a new
    /// line with quantity 1.
    pub fn add_to_cart(&self, product: CartProduct) {
        self.add_quantity(product, 1);
    }

    /// Add `quantity` units of `product`. Adding zero units does nothing.
    pub fn add_quantity(&self, product: CartProduct, quantity: u32) {
        if quantity == 0 {
            return;
        }

        let product_id = product.product_id.clone();
        let mut lines = self.write();
        let new_quantity = if let Some(line) = lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = line.quantity.saturating_add(quantity);
            line.quantity
        } else {
            lines.push(CartLine::new(product, quantity));
            quantity
        };

        tracing::debug!(
            product_id = %product_id,
            quantity = new_quantity,
            "Added to cart"
        );
        self.persist(&lines);
    }

    /// Delete the line for `product_id`. Absent ids are a no-op.
    pub fn remove_from_cart(&self, product_id: &ProductId) {
        let mut lines = self.write();
        let before = lines.len();
        lines.retain(|line| &line.product_id != product_id);

        if lines.len() != before {
            tracing::debug!(product_id = %product_id, "Removed from cart");
            self.persist(&lines);
        }
    }

    /// Set the quantity of the line for `product_id`. Absent ids are a no-op.
    ///
    /// Zero is handled by the store's [`ZeroQuantityPolicy`].
    pub fn update_quantity(&self, product_id: &ProductId, quantity: u32) {
        let mut lines = self.write();
        let Some(index) = lines
            .iter()
            .position(|line| &line.product_id == product_id)
        else {
            return;
        };

        match (quantity, self.inner.zero_policy) {
            (0, ZeroQuantityPolicy::Remove) => {
                lines.remove(index);
                tracing::debug!(product_id = %product_id, "Quantity set to zero, line removed");
            }
            (q, _) => {
                let q = q.max(1);
                if let Some(line) = lines.get_mut(index) {
                    line.quantity = q;
                }
                tracing::debug!(product_id = %product_id, quantity = q, "Updated quantity");
            }
        }

        self.persist(&lines);
    }

    /// Empty the cart unconditionally.
    pub fn clear_cart(&self) {
        let mut lines = self.write();
        lines.clear();

        if let Some(storage) = &self.inner.storage
            && let Err(e) = storage.clear(keys::CART)
        {
            tracing::warn!(error = %e, "Failed to clear stored cart");
        }
        tracing::debug!("Cleared cart");
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Copy of the current lines.
    #[must_use]
    pub fn snapshot(&self) -> Cart {
        Cart::from_lines(
            self.inner
                .lines
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }

    /// Current total, recomputed from the lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.snapshot().total()
    }

    /// Current sum of quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.snapshot().item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner
            .lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }

    /// The policy applied when a quantity is set to zero.
    #[must_use]
    pub fn zero_policy(&self) -> ZeroQuantityPolicy {
        self.inner.zero_policy
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    // A panic while holding the lock cannot leave a partially applied line
    // behind, so a poisoned lock is safe to reuse.
    fn write(&self) -> RwLockWriteGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, lines: &[CartLine]) {
        let Some(storage) = &self.inner.storage else {
            return;
        };

        let result = serde_json::to_string(lines)
            .map_err(|e| e.to_string())
            .and_then(|json| storage.save(keys::CART, &json).map_err(|e| e.to_string()));

        if let Err(error) = result {
            tracing::warn!(%error, "Failed to persist cart");
        }
    }
}

/// Read stored lines, discarding anything unreadable.
fn load_lines(storage: &dyn KeyValueStore) -> Vec<CartLine> {
    let raw = match storage.load(keys::CART) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read stored cart");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<CartLine>>(&raw) {
        Ok(lines) => merge_lines(lines),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding corrupt stored cart");
            if let Err(e) = storage.clear(keys::CART) {
                tracing::warn!(error = %e, "Failed to clear corrupt stored cart");
            }
            Vec::new()
        }
    }
}

/// Collapse stored lines to one per product id, in first-seen order.
///
/// Quantities of repeated ids are summed; the first line's price and display
/// data win. Zero-quantity lines are dropped.
fn merge_lines(stored: Vec<CartLine>) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(stored.len());
    for line in stored.into_iter().filter(|line| line.quantity > 0) {
        if let Some(existing) = lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            lines.push(line);
        }
    }
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::storage::MemoryStore;

    fn product(id: &str, price: i64) -> CartProduct {
        CartProduct {
            product_id: ProductId::new(id),
            unit_price: Price::usd(Decimal::new(price, 0)),
            display_name: format!("Plant {id}"),
            image_ref: Some(format!("https://img.example/{id}.jpg")),
        }
    }

    fn quantities(cart: &CartStore) -> Vec<(String, u32)> {
        cart.snapshot()
            .lines()
            .iter()
            .map(|l| (l.product_id.to_string(), l.quantity))
            .collect()
    }

    #[test]
    fn test_repeated_add_increments_single_line() {
        let cart = CartStore::default();
        for _ in 0..5 {
            cart.add_to_cart(product("A", 12));
        }

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.lines()[0].quantity, 5);
        assert_eq!(cart.total(), Price::usd(Decimal::new(60, 0)));
    }

    #[test]
    fn test_add_existing_keeps_insertion_order() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 10));
        cart.add_to_cart(product("A", 10));
        cart.add_to_cart(product("B", 5));
        assert_eq!(cart.total().amount, Decimal::new(25, 0));

        cart.add_to_cart(product("A", 10));
        assert_eq!(
            quantities(&cart),
            vec![("A".to_owned(), 3), ("B".to_owned(), 1)]
        );
        assert_eq!(cart.total().amount, Decimal::new(35, 0));
    }

    #[test]
    fn test_add_keeps_price_snapshotted_at_first_add() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 10));
        cart.add_to_cart(product("A", 99));
        assert_eq!(cart.total().amount, Decimal::new(20, 0));
    }

    #[test]
    fn test_add_quantity_zero_is_noop() {
        let cart = CartStore::default();
        cart.add_quantity(product("A", 10), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_quantity_increments_by_amount() {
        let cart = CartStore::default();
        cart.add_quantity(product("A", 10), 2);
        cart.add_quantity(product("A", 10), 3);
        assert_eq!(quantities(&cart), vec![("A".to_owned(), 5)]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 10));
        cart.add_to_cart(product("B", 5));

        cart.remove_from_cart(&ProductId::new("A"));
        let after_first = cart.snapshot();
        cart.remove_from_cart(&ProductId::new("A"));

        assert_eq!(cart.snapshot(), after_first);
        assert_eq!(quantities(&cart), vec![("B".to_owned(), 1)]);
    }

    #[test]
    fn test_update_quantity_sets_value() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 4));
        cart.update_quantity(&ProductId::new("A"), 7);

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.lines()[0].quantity, 7);
        assert_eq!(snapshot.total().amount, Decimal::new(28, 0));
    }

    #[test]
    fn test_update_quantity_absent_is_noop() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 4));
        cart.update_quantity(&ProductId::new("Z"), 3);
        assert_eq!(quantities(&cart), vec![("A".to_owned(), 1)]);
    }

    #[test]
    fn test_update_quantity_zero_clamps_by_default() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 4));
        cart.add_to_cart(product("A", 4));
        cart.update_quantity(&ProductId::new("A"), 0);
        assert_eq!(quantities(&cart), vec![("A".to_owned(), 1)]);
    }

    #[test]
    fn test_update_quantity_zero_removes_with_remove_policy() {
        let cart = CartStore::new(ZeroQuantityPolicy::Remove);
        cart.add_to_cart(product("A", 4));
        cart.add_to_cart(product("B", 4));
        cart.update_quantity(&ProductId::new("A"), 0);
        assert_eq!(quantities(&cart), vec![("B".to_owned(), 1)]);
    }

    #[test]
    fn test_clear_cart_empties_and_zeroes_total() {
        let cart = CartStore::default();
        cart.add_to_cart(product("A", 4));
        cart.add_to_cart(product("B", 6));
        cart.clear_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.total().amount, Decimal::ZERO);
    }

    #[test]
    fn test_clear_empty_cart_is_fine() {
        let cart = CartStore::default();
        cart.clear_cart();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clones_share_lines() {
        let page = CartStore::default();
        let badge = page.clone();
        page.add_to_cart(product("A", 4));
        page.add_to_cart(product("A", 4));
        assert_eq!(badge.item_count(), 2);
    }

    #[test]
    fn test_concurrent_adds_are_not_lost() {
        let cart = CartStore::default();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cart = cart.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cart.add_to_cart(product("A", 1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.lines()[0].quantity, 800);
        assert_eq!(snapshot.total().amount, Decimal::new(800, 0));
    }

    #[test]
    fn test_persists_and_reloads() {
        let storage = MemoryStore::new();
        let cart = CartStore::with_storage(Arc::new(storage.clone()), ZeroQuantityPolicy::Clamp);
        cart.add_to_cart(product("A", 10));
        cart.add_to_cart(product("A", 10));
        cart.add_to_cart(product("B", 5));

        let reloaded = CartStore::with_storage(Arc::new(storage), ZeroQuantityPolicy::Clamp);
        assert_eq!(reloaded.snapshot(), cart.snapshot());
        assert_eq!(reloaded.total().amount, Decimal::new(25, 0));
    }

    #[test]
    fn test_clear_removes_stored_cart() {
        let storage = MemoryStore::new();
        let cart = CartStore::with_storage(Arc::new(storage.clone()), ZeroQuantityPolicy::Clamp);
        cart.add_to_cart(product("A", 10));
        assert!(storage.load(keys::CART).unwrap().is_some());

        cart.clear_cart();
        assert!(storage.load(keys::CART).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_stored_lines_are_merged() {
        let storage = MemoryStore::new();
        let first = CartLine::new(product("A", 10), 2);
        let second = CartLine::new(product("B", 5), 1);
        let repeat = CartLine::new(product("A", 99), 3);
        storage
            .save(
                keys::CART,
                &serde_json::to_string(&[first, second, repeat]).unwrap(),
            )
            .unwrap();

        let cart = CartStore::with_storage(Arc::new(storage), ZeroQuantityPolicy::Clamp);
        assert_eq!(
            quantities(&cart),
            vec![("A".to_owned(), 5), ("B".to_owned(), 1)]
        );
        assert_eq!(cart.total().amount, Decimal::new(55, 0));

        cart.add_to_cart(product("A", 10));
        assert_eq!(cart.snapshot().len(), 2);
    }

    #[test]
    fn test_huge_total_does_not_panic() {
        let cart = CartStore::default();
        cart.add_to_cart(CartProduct {
            unit_price: Price::usd(Decimal::from_i128_with_scale(10_i128.pow(25), 0)),
            ..product("A", 0)
        });
        cart.update_quantity(&ProductId::new("A"), 100_000);
        assert_eq!(cart.total().amount, Decimal::MAX);
    }

    #[test]
    fn test_corrupt_stored_cart_starts_empty() {
        let storage = MemoryStore::new();
        storage.save(keys::CART, "{not json").unwrap();

        let cart = CartStore::with_storage(Arc::new(storage.clone()), ZeroQuantityPolicy::Clamp);
        assert!(cart.is_empty());
        assert!(storage.load(keys::CART).unwrap().is_none());
    }
}
