//! Local shopping cart.
//!
//! Cart intents are synchronous and purely in-memory - no request envelope,
//! no network. By construction they cannot fail: invalid quantities are
//! absorbed (a quantity of zero removes the line) rather than rejected.
//! The optional best-effort server mirror of cart adds lives in the
//! registry, not here, so this store stays authoritative and pure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tiffin_core::{Money, ProductId};

use crate::entity::EntityStore;
use crate::registry::ChangeNotifier;
use crate::types::CartLine;

/// Immutable cart view for screens.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    /// Lines in insertion order (render order).
    pub lines: Vec<CartLine>,
    /// Sum of all quantities.
    pub item_count: u32,
    /// Sum of price times quantity across lines.
    pub subtotal: Money,
}

/// The shopping-cart slice.
#[derive(Debug, Clone)]
pub struct CartStore {
    inner: Arc<CartInner>,
}

#[derive(Debug)]
struct CartInner {
    lines: Mutex<EntityStore<CartLine>>,
    notifier: ChangeNotifier,
}

impl CartStore {
    pub(crate) fn new(notifier: ChangeNotifier) -> Self {
        Self {
            inner: Arc::new(CartInner {
                lines: Mutex::new(EntityStore::new()),
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EntityStore<CartLine>> {
        self.inner.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a line, or add its quantity onto the existing line for the same
    /// product. New lines go to the back, preserving render order.
    pub fn add_or_increment(&self, line: CartLine) {
        {
            let mut lines = self.lock();
            if let Some(existing) = lines.get_mut(&line.id) {
                existing.quantity = existing.quantity.saturating_add(line.quantity.max(1));
            } else {
                let mut line = line;
                line.quantity = line.quantity.max(1);
                lines.upsert(line);
            }
        }
        self.inner.notifier.notify();
    }

    /// Replace a line's quantity. Zero removes the line; a line never sits
    /// in the cart at quantity zero. Absent ids are a no-op.
    pub fn set_quantity(&self, id: &ProductId, quantity: u32) {
        {
            let mut lines = self.lock();
            if quantity == 0 {
                lines.remove(id);
            } else if let Some(line) = lines.get_mut(id) {
                line.quantity = quantity;
            }
        }
        self.inner.notifier.notify();
    }

    /// Remove a line. Absent ids are a no-op, not an error.
    pub fn remove(&self, id: &ProductId) {
        self.lock().remove(id);
        self.inner.notifier.notify();
    }

    /// Empty the cart (post-checkout).
    pub fn clear(&self) {
        self.lock().clear();
        self.inner.notifier.notify();
    }

    /// Current cart contents plus derived totals.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let lines = self.lock();
        let item_count = lines.as_slice().iter().map(|line| line.quantity).sum();
        let subtotal = lines.as_slice().iter().map(CartLine::line_total).sum();
        CartSnapshot {
            lines: lines.to_vec(),
            item_count,
            subtotal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiffin_core::Money;

    fn store() -> CartStore {
        let (notifier, _changes) = ChangeNotifier::new();
        CartStore::new(notifier)
    }

    fn line(id: &str, price: i64, quantity: u32) -> CartLine {
        CartLine {
            id: ProductId::new(id),
            title: id.to_owned(),
            price: Money::from_units(price),
            quantity,
            image: String::new(),
            restaurant_id: None,
        }
    }

    #[test]
    fn test_add_or_increment_merges_by_product() {
        let cart = store();
        cart.add_or_increment(line("p-1", 50, 1));
        cart.add_or_increment(line("p-2", 80, 2));
        cart.add_or_increment(line("p-1", 50, 2));

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines.first().map(|l| l.quantity), Some(3));
        assert_eq!(snapshot.item_count, 5);
        assert_eq!(snapshot.subtotal, Money::from_units(50 * 3 + 80 * 2));
    }

    #[test]
    fn test_insertion_order_is_render_order() {
        let cart = store();
        cart.add_or_increment(line("p-3", 10, 1));
        cart.add_or_increment(line("p-1", 10, 1));
        cart.add_or_increment(line("p-2", 10, 1));

        let ids: Vec<String> = cart
            .snapshot()
            .lines
            .iter()
            .map(|l| l.id.to_string())
            .collect();
        assert_eq!(ids, vec!["p-3", "p-1", "p-2"]);
    }

    #[test]
    fn test_quantity_never_below_one() {
        let cart = store();
        // A zero-quantity add is clamped up, not stored at zero.
        cart.add_or_increment(line("p-1", 50, 0));
        assert_eq!(cart.snapshot().lines.first().map(|l| l.quantity), Some(1));

        cart.set_quantity(&ProductId::new("p-1"), 4);
        assert_eq!(cart.snapshot().lines.first().map(|l| l.quantity), Some(4));

        for snapshot_line in &cart.snapshot().lines {
            assert!(snapshot_line.quantity >= 1);
        }
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let via_zero = store();
        via_zero.add_or_increment(line("p-1", 50, 2));
        via_zero.add_or_increment(line("p-2", 60, 1));
        via_zero.set_quantity(&ProductId::new("p-1"), 0);

        let via_remove = store();
        via_remove.add_or_increment(line("p-1", 50, 2));
        via_remove.add_or_increment(line("p-2", 60, 1));
        via_remove.remove(&ProductId::new("p-1"));

        assert_eq!(via_zero.snapshot().lines, via_remove.snapshot().lines);
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let cart = store();
        cart.add_or_increment(line("p-1", 50, 1));
        cart.remove(&ProductId::new("p-9"));
        cart.set_quantity(&ProductId::new("p-9"), 3);

        assert_eq!(cart.snapshot().lines.len(), 1);
    }

    #[test]
    fn test_clear_empties_cart() {
        let cart = store();
        cart.add_or_increment(line("p-1", 50, 2));
        cart.clear();

        let snapshot = cart.snapshot();
        assert!(snapshot.lines.is_empty());
        assert_eq!(snapshot.item_count, 0);
        assert_eq!(snapshot.subtotal, Money::ZERO);
    }
}
