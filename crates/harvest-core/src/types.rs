//! # Domain Types
//!
//! Wire-level types exchanged with the marketplace backend (real or mock).
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  OrderRequest   │   │  PaymentOrder   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  productId / id │   │  address        │   │  orderId        │       │
//! │  │  name, price    │   │  paymentMethod  │   │  amount         │       │
//! │  │  category       │   │  items[]        │   │  keyId          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │  OrderResult    │   │ PaymentResult   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  userId, email  │   │  orderId        │   │  success        │       │
//! │  │  type           │   │  status         │   │  paymentId      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All field names are camelCase on the wire.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreError;

/// Numeric product identifier.
pub type ProductId = u64;

// =============================================================================
// Product
// =============================================================================

/// A product listed in the marketplace catalogue.
///
/// ## Dual Id
/// The backend calls the key `productId`, older frontend code reads `id`.
/// Both are always written and either is accepted when reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductWire", into = "ProductWire")]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    /// Units available from the farmer.
    pub quantity: Option<i64>,
    /// Freshness score reported by the farmer.
    pub freshness: Option<f64>,
    pub date_of_harvest: Option<String>,
    /// Owning farmer's user id.
    pub farmer_id: Option<u64>,
}

/// Wire form of [`Product`] carrying both id spellings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductWire {
    #[serde(default)]
    product_id: Option<ProductId>,
    #[serde(default)]
    id: Option<ProductId>,
    name: String,
    price: f64,
    #[serde(default)]
    category: String,
    #[serde(default)]
    image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    freshness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_of_harvest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    farmer_id: Option<u64>,
}

impl TryFrom<ProductWire> for Product {
    type Error = CoreError;

    fn try_from(wire: ProductWire) -> Result<Self, Self::Error> {
        let product_id = wire
            .product_id
            .or(wire.id)
            .ok_or_else(|| CoreError::InvalidProduct(format!("'{}' has no id", wire.name)))?;

        Ok(Product {
            product_id,
            name: wire.name,
            price: wire.price,
            category: wire.category,
            image: wire.image,
            quantity: wire.quantity,
            freshness: wire.freshness,
            date_of_harvest: wire.date_of_harvest,
            farmer_id: wire.farmer_id,
        })
    }
}

impl From<Product> for ProductWire {
    fn from(product: Product) -> Self {
        ProductWire {
            product_id: Some(product.product_id),
            id: Some(product.product_id),
            name: product.name,
            price: product.price,
            category: product.category,
            image: product.image,
            quantity: product.quantity,
            freshness: product.freshness,
            date_of_harvest: product.date_of_harvest,
            farmer_id: product.farmer_id,
        }
    }
}

/// Body for farmer create/update product calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductPayload {
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_harvest: Option<String>,
}

// =============================================================================
// Users & Auth
// =============================================================================

/// Account type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum UserType {
    #[default]
    #[serde(alias = "customer", alias = "CUSTOMER")]
    Customer,
    #[serde(alias = "farmer", alias = "FARMER")]
    Farmer,
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserType::Customer => write!(f, "Customer"),
            UserType::Farmer => write!(f, "Farmer"),
        }
    }
}

/// Public identity of a signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

/// Body for `POST /api/auth/signin`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Body for `POST /api/auth/signup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to [`UserType::Customer`] when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Response shape shared by sign-in and sign-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AuthResponse {
    /// Successful response carrying a token and identity.
    pub fn granted(token: String, user: User) -> Self {
        AuthResponse {
            success: true,
            token: Some(token),
            user: Some(user),
            message: None,
        }
    }

    /// Rejected response with a user-facing message.
    pub fn denied(message: &str) -> Self {
        AuthResponse {
            success: false,
            token: None,
            user: None,
            message: Some(message.to_string()),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    /// Cash on delivery, no online payment step.
    Cod,
    /// Card payment through the (mock or real) gateway.
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cod => write!(f, "cod"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cod" | "cash" => Ok(PaymentMethod::Cod),
            "card" => Ok(PaymentMethod::Card),
            other => Err(CoreError::UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// One line of an order request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: f64,
}

/// Body for `POST /api/orders`. Immutable once sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderRequest {
    pub address: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<OrderItemRequest>,
}

impl OrderRequest {
    /// Σ price × quantity over the items.
    pub fn items_total(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.price * item.quantity as f64)
            .sum()
    }
}

/// Lifecycle status of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Response of `POST /api/orders`.
///
/// The backend answers with the saved order entity, which carries no
/// status; a freshly accepted order is `PENDING`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderResult {
    pub order_id: u64,
    pub total_amount: f64,
    #[serde(default)]
    pub status: OrderStatus,
}

// =============================================================================
// Payments
// =============================================================================

/// Body for `POST /api/payments/gateway/create-order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentOrderRequest {
    pub amount: f64,
    pub currency: String,
    pub receipt: String,
}

/// A payment intent issued by the gateway (card flow only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentOrder {
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub key_id: String,
}

impl PaymentOrder {
    /// True when the gateway signalled that no real integration exists.
    pub fn is_mock(&self) -> bool {
        self.key_id == crate::MOCK_PAYMENT_KEY_ID
    }
}

/// Outcome status of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum PaymentStatus {
    Success,
    #[default]
    Failed,
}

/// Result returned by the payment processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Gateway signature over `orderId|paymentId`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Body for `POST /api/payments/gateway/verify`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Response of the verify call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentResponse {
    pub verified: bool,
}

/// Body for `POST /api/payments` (records a completed payment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub order_id: String,
    pub amount: f64,
    pub payment_method: PaymentMethod,
    pub transaction_id: String,
    pub status: PaymentStatus,
}

// =============================================================================
// Acknowledgement
// =============================================================================

/// Generic acknowledgement body for calls with no meaningful payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default = "ack_default_success")]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn ack_default_success() -> bool {
    true
}

impl Default for Ack {
    fn default() -> Self {
        Ack {
            success: true,
            message: None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
