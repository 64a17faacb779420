//! # Validation Module
//!
//! Client-side checks that run before any request leaves the storefront.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (client-side, no network)                        │
//! │  ├── Empty cart / blank address gate for checkout                      │
//! │  └── Farmer product payload checks                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Backend (real or mock)                                       │
//! │  └── Authorisation, ownership, existence                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::cart::Cart;
use crate::error::ValidationError;
use crate::types::ProductPayload;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a delivery address.
pub const MAX_ADDRESS_LEN: usize = 500;

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Validates a delivery address and returns it trimmed.
///
/// ## Rules
/// - Must not be empty or whitespace only
/// - At most 500 characters after trimming
///
/// ## Example
/// ```rust
/// use harvest_core::validation::validate_address;
///
/// assert_eq!(validate_address("  12 MG Road, Bangalore ").unwrap(), "12 MG Road, Bangalore");
/// assert!(validate_address(" \t\n").is_err());
/// ```
pub fn validate_address(address: &str) -> ValidationResult<String> {
    let address = address.trim();

    if address.is_empty() {
        return Err(ValidationError::required("delivery address"));
    }

    if address.chars().count() > MAX_ADDRESS_LEN {
        return Err(ValidationError::TooLong {
            field: "delivery address".to_string(),
            max: MAX_ADDRESS_LEN,
        });
    }

    Ok(address.to_string())
}

/// Checks that the cart has at least one line.
pub fn validate_cart_not_empty(cart: &Cart) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    Ok(())
}

/// Gate run by the checkout before any network call.
///
/// The cart is checked first so an empty cart reports `EmptyCart` even
/// when the address is also blank.
pub fn validate_checkout(cart: &Cart, address: &str) -> ValidationResult<String> {
    validate_cart_not_empty(cart)?;
    validate_address(address)
}

/// Validates a farmer product payload.
///
/// ## Rules
/// - `name` and `category` non-blank; `name` at most 200 characters
/// - `price` finite and non-negative (zero allowed)
/// - `quantity`, when present, non-negative
pub fn validate_product_payload(payload: &ProductPayload) -> ValidationResult<()> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ValidationError::required("product name"));
    }
    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "product name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    if payload.category.trim().is_empty() {
        return Err(ValidationError::required("category"));
    }

    if !payload.price.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "price".to_string(),
        });
    }
    if payload.price < 0.0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if matches!(payload.quantity, Some(qty) if qty < 0) {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartItem;

    fn payload(name: &str, category: &str, price: f64) -> ProductPayload {
        ProductPayload {
            name: name.to_string(),
            category: category.to_string(),
            price,
            quantity: None,
            image: None,
            freshness: None,
            date_of_harvest: None,
        }
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address("Flat 4, Indiranagar, Bangalore").is_ok());
        assert!(validate_address("").is_err());
        assert!(validate_address("   \n\t ").is_err());
        assert!(validate_address(&"a".repeat(501)).is_err());
    }

    #[test]
    fn test_checkout_gate_prefers_empty_cart() {
        let cart = Cart::new();
        assert_eq!(validate_checkout(&cart, "  "), Err(ValidationError::EmptyCart));
    }

    #[test]
    fn test_checkout_gate_requires_address() {
        let mut cart = Cart::new();
        cart.add(CartItem::new(1, "Kale Bunch", 69.0, "Vegetables", "/kale.jpg"));

        assert_eq!(
            validate_checkout(&cart, " "),
            Err(ValidationError::required("delivery address"))
        );
        assert_eq!(validate_checkout(&cart, " Delhi ").unwrap(), "Delhi");
    }

    #[test]
    fn test_validate_product_payload() {
        assert!(validate_product_payload(&payload("Carrots", "Vegetables", 40.0)).is_ok());
        assert!(validate_product_payload(&payload("Free sample", "Misc", 0.0)).is_ok());

        assert!(validate_product_payload(&payload(" ", "Vegetables", 40.0)).is_err());
        assert!(validate_product_payload(&payload("Carrots", "", 40.0)).is_err());
        assert!(validate_product_payload(&payload("Carrots", "Vegetables", -1.0)).is_err());
        assert!(validate_product_payload(&payload("Carrots", "Vegetables", f64::NAN)).is_err());

        let mut negative_stock = payload("Carrots", "Vegetables", 40.0);
        negative_stock.quantity = Some(-3);
        assert!(validate_product_payload(&negative_stock).is_err());
    }
}
