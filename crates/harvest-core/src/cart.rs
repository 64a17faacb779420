//! # Cart
//!
//! The cart state machine and its derived totals.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  UI Event              Operation        Effect                          │
//! │  ────────              ─────────        ──────                          │
//! │  "Add to cart" ──────► add(item) ─────► qty += 1, or insert qty = 1     │
//! │  "+" ────────────────► inc(id) ───────► qty += 1 (absent: no-op)        │
//! │  "-" ────────────────► dec(id) ───────► qty -= 1, removed at 0          │
//! │  "Remove" ───────────► remove(id) ────► line deleted (absent: no-op)    │
//! │  Order confirmed ────► clear() ───────► all lines deleted               │
//! │                                                                         │
//! │  totals() is recomputed from the lines on every read.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per product id.
//! - Every retained line has `qty >= 1`.
//! - `subtotal = Σ price × qty`, `shipping = 5` iff `subtotal > 0`,
//!   `tax = subtotal × 0.07`, `total = subtotal + shipping + tax`.
//!
//! Totals are raw `f64` sums; rounding happens only at display time via
//! [`crate::currency::format_inr`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{OrderItemRequest, Product, ProductId};
use crate::{SHIPPING_FLAT_FEE, TAX_RATE};

// =============================================================================
// Cart Item (what the UI hands to `add`)
// =============================================================================

/// The product snapshot added to the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: String,
}

impl CartItem {
    pub fn new(id: ProductId, name: &str, price: f64, category: &str, image: &str) -> Self {
        CartItem {
            id,
            name: name.to_string(),
            price,
            category: category.to_string(),
            image: image.to_string(),
        }
    }

    /// Snapshots a catalogue product.
    ///
    /// The price is frozen at this moment; later catalogue changes do not
    /// affect lines already in the cart.
    pub fn from_product(product: &Product) -> Self {
        CartItem {
            id: product.product_id,
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            image: product.image.clone(),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product entry in the cart with an aggregated quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub id: ProductId,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    pub qty: u32,
}

impl CartLine {
    /// price × qty.
    pub fn line_total(&self) -> f64 {
        self.price * self.qty as f64
    }

    /// The order-request form of this line.
    pub fn to_order_item(&self) -> OrderItemRequest {
        OrderItemRequest {
            product_id: self.id,
            quantity: self.qty,
            price: self.price,
        }
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Derived totals; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

impl CartTotals {
    /// Computes totals from a subtotal.
    pub fn from_subtotal(subtotal: f64) -> Self {
        let shipping = if subtotal > 0.0 { SHIPPING_FLAT_FEE } else { 0.0 };
        let tax = subtotal * TAX_RATE;
        CartTotals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart. Lines keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds one unit of `item`. Never fails.
    pub fn add(&mut self, item: CartItem) {
        if let Some(line) = self.line_mut(item.id) {
            line.qty = line.qty.saturating_add(1);
            return;
        }

        self.lines.push(CartLine {
            id: item.id,
            name: item.name,
            price: item.price,
            category: item.category,
            image: item.image,
            qty: 1,
        });
    }

    /// Deletes the line for `id`; no-op when absent.
    pub fn remove(&mut self, id: ProductId) {
        self.lines.retain(|line| line.id != id);
    }

    /// Increments the quantity of `id`; no-op when absent.
    pub fn inc(&mut self, id: ProductId) {
        if let Some(line) = self.line_mut(id) {
            line.qty = line.qty.saturating_add(1);
        }
    }

    /// Decrements the quantity of `id`, removing the line when it would
    /// reach zero; no-op when absent.
    pub fn dec(&mut self, id: ProductId) {
        let Some(index) = self.lines.iter().position(|line| line.id == id) else {
            return;
        };

        if self.lines[index].qty <= 1 {
            self.lines.remove(index);
        } else {
            self.lines[index].qty -= 1;
        }
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Recomputes subtotal, shipping, tax and total from the current lines.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from_subtotal(self.lines.iter().map(CartLine::line_total).sum())
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities (the header badge count).
    pub fn total_quantity(&self) -> u64 {
        self.lines.iter().map(|line| line.qty as u64).sum()
    }

    /// Order-request items, one per line.
    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.lines.iter().map(CartLine::to_order_item).collect()
    }

    fn line_mut(&mut self, id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| line.id == id)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
