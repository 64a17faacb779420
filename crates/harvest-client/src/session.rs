//! # Session Cart State
//!
//! Shared handle to the session's cart.
//!
//! ## Thread Safety
//! The cart sits behind `Arc<Mutex<Cart>>`: UI handlers and the checkout
//! orchestrator hold clones of the same handle, and every mutation runs
//! under the lock so totals are never read mid-update.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Session Cart Access                               │
//! │                                                                         │
//! │  UI handler ────────► with_cart_mut(|c| c.add(item))                   │
//! │  Cart page ─────────► with_cart(|c| c.totals())                        │
//! │  Checkout ──────────► snapshot() ... clear() only after order success  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use harvest_core::{Cart, CartItem, CartTotals, ProductId};

/// Cloneable handle to the session cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing cart.
    pub fn from_cart(cart: Cart) -> Self {
        CartState {
            cart: Arc::new(Mutex::new(cart)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // Cart operations cannot leave the lines half-updated, so a poisoned
        // lock still guards a consistent cart.
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        f(&self.lock())
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        f(&mut self.lock())
    }

    pub fn add(&self, item: CartItem) {
        self.with_cart_mut(|cart| cart.add(item));
    }

    pub fn remove(&self, id: ProductId) {
        self.with_cart_mut(|cart| cart.remove(id));
    }

    pub fn inc(&self, id: ProductId) {
        self.with_cart_mut(|cart| cart.inc(id));
    }

    pub fn dec(&self, id: ProductId) {
        self.with_cart_mut(|cart| cart.dec(id));
    }

    pub fn clear(&self) {
        self.with_cart_mut(Cart::clear);
    }

    pub fn totals(&self) -> CartTotals {
        self.with_cart(Cart::totals)
    }

    /// Copy of the current cart.
    pub fn snapshot(&self) -> Cart {
        self.with_cart(Cart::clone)
    }

    pub fn is_empty(&self) -> bool {
        self.with_cart(Cart::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_cart() {
        let ui = CartState::new();
        let checkout = ui.clone();

        ui.add(CartItem::new(1, "Organic Tomatoes", 99.0, "Vegetables", "/t.jpg"));
        ui.inc(1);
        assert_eq!(checkout.with_cart(|cart| cart.total_quantity()), 2);

        checkout.clear();
        assert!(ui.is_empty());
    }

    #[test]
    fn test_totals_follow_mutations() {
        let state = CartState::new();
        state.add(CartItem::new(1, "Organic Tomatoes", 99.0, "Vegetables", "/t.jpg"));
        state.add(CartItem::new(2, "Fresh Strawberries", 149.0, "Fruits", "/s.jpg"));
        assert_eq!(state.totals().subtotal, 248.0);

        state.dec(2);
        state.remove(1);
        assert_eq!(state.totals(), CartTotals::default());
    }
}
