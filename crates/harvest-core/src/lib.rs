//! # harvest-core: Pure Storefront Logic for Harvest Hub
//!
//! This crate holds everything the storefront computes without touching the
//! network: the cart state machine, derived totals, currency display, the
//! great-circle distance estimator and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Harvest Hub Storefront                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront UI / CLI                          │   │
//! │  │    Products ──► Cart ──► Checkout ──► Delivery tracking        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                harvest-client (dispatcher, checkout)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ harvest-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │  cart   │ │ currency │ │  geo  │ │validation│ │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └───────┘ └──────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire types (Product, OrderRequest, PaymentOrder, User, ...)
//! - [`cart`] - Cart state machine and derived totals
//! - [`currency`] - INR display formatting
//! - [`geo`] - Haversine distance and travel-time estimate
//! - [`delivery`] - Delivery tracking view model
//! - [`validation`] - Checkout and product payload validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use harvest_core::cart::{Cart, CartItem};
//!
//! let mut cart = Cart::new();
//! cart.add(CartItem::new(1, "Organic Tomatoes", 99.0, "Vegetables", "/veg.jpg"));
//! cart.add(CartItem::new(1, "Organic Tomatoes", 99.0, "Vegetables", "/veg.jpg"));
//!
//! let totals = cart.totals();
//! assert_eq!(totals.subtotal, 198.0);
//! assert_eq!(totals.shipping, 5.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod currency;
pub mod delivery;
pub mod error;
pub mod geo;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartLine, CartTotals};
pub use currency::format_inr;
pub use error::{CoreError, CoreResult, ValidationError};
pub use geo::{estimate_distance, Coordinates, DistanceEstimate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat shipping fee applied to any non-empty cart.
pub const SHIPPING_FLAT_FEE: f64 = 5.0;

/// Tax rate applied to the subtotal (7%).
pub const TAX_RATE: f64 = 0.07;

/// Currency code used for payment orders.
pub const DEFAULT_CURRENCY: &str = "INR";

/// `keyId` returned by a payment-order call when no real gateway exists.
///
/// Seeing this value forces the checkout onto the mock payment processor.
pub const MOCK_PAYMENT_KEY_ID: &str = "mock_key_id";
