//! # Error Types
//!
//! Domain-specific error types for harvest-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  harvest-core errors (this file)                                        │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  harvest-client errors (separate crate)                                 │
//! │  ├── ClientError      - Transport / dispatch failures                  │
//! │  └── CheckoutError    - What the checkout screen sees                  │
//! │                                                                         │
//! │  Flow: ValidationError → CheckoutError::Validation → user message      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A product could not be decoded from its wire shape.
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Unknown payment method string.
    #[error("Unknown payment method: '{0}'. Valid options: cod, card")]
    UnknownPaymentMethod(String),

    /// Validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation failures.
///
/// These are raised entirely client-side and always block before any
/// network call is made.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Checkout attempted with nothing in the cart.
    #[error("Your cart is empty")]
    EmptyCart,

    /// Required field is empty or whitespace only.
    #[error("Please enter your {field}")]
    Required { field: String },

    /// Field exceeds maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric field must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Numeric field is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },
}

impl ValidationError {
    /// Shorthand for a [`ValidationError::Required`] on `field`.
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::required("delivery address").to_string(),
            "Please enter your delivery address"
        );
        assert_eq!(ValidationError::EmptyCart.to_string(), "Your cart is empty");
    }

    #[test]
    fn test_core_error_wraps_validation() {
        let err: CoreError = ValidationError::EmptyCart.into();
        assert!(matches!(err, CoreError::Validation(ValidationError::EmptyCart)));
        assert_eq!(err.to_string(), "Your cart is empty");
    }
}
