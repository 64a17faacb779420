//! # Client Error Types
//!
//! Error types for dispatch and checkout operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  ClientError    │  │  ClientError    │  │  ClientError            │ │
//! │  │  (no response)  │  │  (rejection)    │  │  (local)                │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network ★      │  │  Application    │  │  InvalidConfig          │ │
//! │  │  Timeout        │  │  NotFound       │  │  InvalidResponse        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │   ★ only Network is eligible for the mock fallback                     │
//! │                                                                         │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │  CheckoutError                                                    │ │
//! │  │  Validation │ InFlight │ PaymentFailed │ VerificationFailed │     │ │
//! │  │  Payment(ClientError) │ OrderSubmission(ClientError)             │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use harvest_core::ValidationError;
use thiserror::Error;

/// Result type alias for dispatch operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for checkout attempts.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Client Error
// =============================================================================

/// Failures surfaced by the request dispatcher and its transports.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// No response was obtained (DNS, connection refused, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The transport did not answer within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    // =========================================================================
    // Application Errors
    // =========================================================================
    /// Structured rejection from the backend.
    #[error("{message}")]
    Application { status: u16, message: String },

    /// Lookup miss.
    #[error("{0}")]
    NotFound(String),

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Request payload failed client-side validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// Invalid base URL.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

// =============================================================================
// Transport Error
// =============================================================================

/// What a [`crate::transport::Transport`] reports when a call does not
/// produce a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never got a response.
    #[error("{0}")]
    Network(String),

    /// The backend answered with an error status.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },

    /// The body could not be read.
    #[error("{0}")]
    Decode(String),

    /// The request could not be turned into a URL; nothing was sent.
    #[error("{0}")]
    InvalidRequest(String),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Network(msg) => ClientError::Network(msg),
            TransportError::Status { status, message } => ClientError::from_status(status, message),
            TransportError::Decode(msg) => ClientError::InvalidResponse(msg),
            TransportError::InvalidRequest(msg) => ClientError::InvalidUrl(msg),
        }
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ClientError {
    /// Maps an HTTP error status and message to the taxonomy.
    ///
    /// 404 becomes [`ClientError::NotFound`]; every other status is an
    /// [`ClientError::Application`] rejection.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 404 {
            ClientError::NotFound(message)
        } else {
            ClientError::Application { status, message }
        }
    }

    /// True when no response was obtained at all.
    ///
    /// Only these failures may be re-dispatched to the mock backend.
    /// Timeouts are excluded because the request may have been processed.
    pub fn is_network_failure(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// HTTP-like status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Application { status, .. } => Some(*status),
            ClientError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Returns true if the user may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Network(_) | ClientError::Timeout(_) => true,
            ClientError::Application { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

// =============================================================================
// Checkout Error
// =============================================================================

/// Why a checkout attempt ended without an order.
///
/// In every variant the cart is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckoutError {
    /// Blocked client-side; no request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Another checkout attempt is still running.
    #[error("A checkout is already in progress")]
    InFlight,

    /// The processor declined or the customer cancelled.
    #[error("{0}")]
    PaymentFailed(String),

    /// The gateway callback did not verify; no order was created.
    #[error("Payment verification failed for {order_id}")]
    VerificationFailed { order_id: String },

    /// A payment step could not reach the backend.
    #[error("Payment could not be completed: {0}")]
    Payment(ClientError),

    /// Order submission failed.
    #[error("Failed to place order: {0}. Please try again.")]
    OrderSubmission(ClientError),
}

impl CheckoutError {
    /// Status code of the underlying backend error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CheckoutError::Payment(err) | CheckoutError::OrderSubmission(err) => err.status(),
            _ => None,
        }
    }

    /// True when the failure happened before any request was issued.
    pub fn is_client_side(&self) -> bool {
        matches!(self, CheckoutError::Validation(_) | CheckoutError::InFlight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_failures_fall_back() {
        assert!(ClientError::Network("connection refused".into()).is_network_failure());

        assert!(!ClientError::Timeout(Duration::from_secs(15)).is_network_failure());
        assert!(!ClientError::from_status(500, "boom").is_network_failure());
        assert!(!ClientError::NotFound("Product not found".into()).is_network_failure());
    }

    #[test]
    fn test_from_status_maps_404_to_not_found() {
        assert_eq!(
            ClientError::from_status(404, "Product not found"),
            ClientError::NotFound("Product not found".into())
        );
        assert_eq!(ClientError::from_status(403, "nope").status(), Some(403));
    }

    #[test]
    fn test_transport_errors_convert() {
        let refused: ClientError = TransportError::Network("connection refused".into()).into();
        assert!(refused.is_network_failure());

        let missing: ClientError = TransportError::Status {
            status: 404,
            message: "Product not found".into(),
        }
        .into();
        assert!(matches!(missing, ClientError::NotFound(_)));

        let unsendable: ClientError = TransportError::InvalidRequest("bad path".into()).into();
        assert!(!unsendable.is_network_failure());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::Network("down".into()).is_retryable());
        assert!(ClientError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(ClientError::from_status(503, "busy").is_retryable());

        assert!(!ClientError::from_status(400, "bad").is_retryable());
        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
    }

    #[test]
    fn test_application_error_displays_server_message() {
        let err = ClientError::from_status(422, "Product is out of stock");
        assert_eq!(err.to_string(), "Product is out of stock");

        let checkout = CheckoutError::OrderSubmission(err);
        assert_eq!(
            checkout.to_string(),
            "Failed to place order: Product is out of stock. Please try again."
        );
        assert_eq!(checkout.status(), Some(422));
    }
}
