//! # Mock Backend
//!
//! In-memory stand-in for the marketplace backend.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          MockBackend                                    │
//! │                                                                         │
//! │   Transport::send(ApiRequest, token)                                   │
//! │        │  sleep(latency)                                               │
//! │        ▼                                                                │
//! │   route by (method, path)                                              │
//! │        │                                                                │
//! │   ┌────┴─────────┬──────────────────┬──────────────────┬────────────┐  │
//! │   ▼              ▼                  ▼                  ▼            │  │
//! │ MockAuth     MockCatalog     MockPaymentProcessor    maps           │  │
//! │ users,       products,       intents, approve/       geocode,       │  │
//! │ tokens       farmer CRUD,    decline draw,           distance       │  │
//! │              order log       signatures, log                        │  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `MockBackend` owns its own registries, so independent instances
//! never observe each other's sign-ups, products or orders.

pub mod auth;
pub mod catalog;
pub mod maps;
pub mod payment;

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use harvest_core::{
    Coordinates, CreatePaymentOrderRequest, OrderRequest, PaymentMethod, PaymentRecord,
    PaymentResult, ProductId, ProductPayload, SignInRequest, SignUpRequest, UserType,
    VerifyPaymentRequest, VerifyPaymentResponse,
};

use crate::config::MockSettings;
use crate::error::{ClientError, ClientResult, TransportError};
use crate::transport::{ApiRequest, Method, Transport};

pub use auth::{Claims, MockAuth, TokenIssuer};
pub use catalog::{MockCatalog, PlacedOrder, SEED_FARMER_ID};
pub use payment::{MockPaymentProcessor, PaymentRng, PAYMENT_DECLINED_MESSAGE};

// =============================================================================
// Latency
// =============================================================================

/// Artificial delays applied before the mock answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockLatency {
    /// Applied to every routed call.
    pub base: Duration,
    /// Added to sign-in and sign-up.
    pub auth: Duration,
    /// Added to payment-intent creation.
    pub payment_order: Duration,
    /// Processor run time.
    pub payment_processing: Duration,
}

impl MockLatency {
    pub fn from_settings(settings: &MockSettings) -> Self {
        MockLatency {
            base: Duration::from_millis(settings.latency_ms),
            auth: Duration::from_millis(settings.auth_latency_ms),
            payment_order: Duration::from_millis(settings.payment_latency_ms),
            payment_processing: Duration::from_millis(settings.payment_processing_ms),
        }
    }

    pub const fn none() -> Self {
        MockLatency {
            base: Duration::ZERO,
            auth: Duration::ZERO,
            payment_order: Duration::ZERO,
            payment_processing: Duration::ZERO,
        }
    }

    /// Total delay for a routed request.
    fn for_request(&self, request: &ApiRequest) -> Duration {
        let extra = match request.path.as_str() {
            "/api/auth/signin" | "/api/auth/signup" => self.auth,
            "/api/payments/gateway/create-order" => self.payment_order,
            path if path.starts_with("/api/maps/") => self.base,
            _ => Duration::ZERO,
        };
        self.base + extra
    }
}

impl Default for MockLatency {
    fn default() -> Self {
        Self::from_settings(&MockSettings::default())
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

// =============================================================================
// Mock Backend
// =============================================================================

pub struct MockBackend {
    latency: MockLatency,
    auth: MockAuth,
    catalog: MockCatalog,
    payments: MockPaymentProcessor,
}

impl MockBackend {
    /// Fresh seeded backend configured from `[mock]` settings.
    pub fn new(settings: &MockSettings) -> Self {
        MockBackend {
            latency: MockLatency::from_settings(settings),
            auth: MockAuth::seeded(&settings.token_secret),
            catalog: MockCatalog::seeded(),
            payments: MockPaymentProcessor::new(
                settings.payment_success_rate,
                settings.seed,
                &settings.payment_key_secret,
            ),
        }
    }

    /// Replaces the processor's random source.
    pub fn with_payment_rng(mut self, rng: PaymentRng, settings: &MockSettings) -> Self {
        self.payments = MockPaymentProcessor::with_rng(
            settings.payment_success_rate,
            rng,
            &settings.payment_key_secret,
        );
        self
    }

    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    pub fn auth(&self) -> &MockAuth {
        &self.auth
    }

    pub fn catalog(&self) -> &MockCatalog {
        &self.catalog
    }

    pub fn payments(&self) -> &MockPaymentProcessor {
        &self.payments
    }

    /// Runs the mock processor for a payment intent.
    pub async fn process_payment(
        &self,
        order_id: &str,
        amount: f64,
        method: PaymentMethod,
    ) -> ClientResult<PaymentResult> {
        pause(self.latency.payment_processing).await;
        self.payments.process(order_id, amount, method)
    }

    // =========================================================================
    // Routing
    // =========================================================================

    fn route(&self, request: &ApiRequest, token: Option<&str>) -> ClientResult<Value> {
        let segments = request.segments();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["api", "auth", "signin"]) => {
                let body: SignInRequest = parse_body(request)?;
                respond(self.auth.sign_in(&body.email, &body.password)?)
            }
            (Method::Post, ["api", "auth", "signup"]) => {
                respond(self.auth.sign_up(&parse_body::<SignUpRequest>(request)?)?)
            }

            (Method::Get, ["api", "products"]) => respond(self.catalog.products()),
            (Method::Get, ["api", "products", id]) => {
                respond(self.catalog.product(parse_id(id)?)?)
            }

            (Method::Post, ["api", "orders"]) => {
                let order: OrderRequest = parse_body(request)?;
                let user_id = token
                    .and_then(|token| self.auth.tokens().validate(token).ok())
                    .map(|claims| claims.user_id);
                respond(self.catalog.create_order(&order, user_id))
            }

            (Method::Post, ["api", "payments", "gateway", "create-order"]) => {
                let body: CreatePaymentOrderRequest = parse_body(request)?;
                respond(self.payments.create_order(body.amount, &body.currency))
            }
            (Method::Post, ["api", "payments", "gateway", "verify"]) => {
                let verified = self.payments.verify(&parse_body::<VerifyPaymentRequest>(request)?)?;
                respond(VerifyPaymentResponse { verified })
            }
            (Method::Post, ["api", "payments"]) => {
                respond(self.payments.record(parse_body::<PaymentRecord>(request)?))
            }

            (Method::Get, ["api", "farmer", "products"]) => {
                respond(self.catalog.farmer_products(self.farmer_id(token)?))
            }
            (Method::Post, ["api", "farmer", "products"]) => {
                let farmer_id = self.farmer_id(token)?;
                let payload: ProductPayload = parse_body(request)?;
                respond(self.catalog.create_product(farmer_id, &payload))
            }
            (Method::Put, ["api", "farmer", "products", id]) => {
                let farmer_id = self.farmer_id(token)?;
                let payload: ProductPayload = parse_body(request)?;
                respond(self.catalog.update_product(farmer_id, parse_id(id)?, &payload)?)
            }
            (Method::Delete, ["api", "farmer", "products", id]) => {
                let farmer_id = self.farmer_id(token)?;
                respond(self.catalog.delete_product(farmer_id, parse_id(id)?)?)
            }

            (Method::Get, ["api", "maps", "geocode"]) => {
                respond(maps::geocode(request.query_param("address").unwrap_or_default()))
            }
            (Method::Get, ["api", "maps", "distance"]) => {
                let origin = Coordinates::new(
                    parse_coordinate(request, "originLat")?,
                    parse_coordinate(request, "originLng")?,
                );
                let destination = Coordinates::new(
                    parse_coordinate(request, "destLat")?,
                    parse_coordinate(request, "destLng")?,
                );
                respond(maps::distance(origin, destination))
            }

            _ => Err(ClientError::NotFound(format!(
                "No mock route for {} {}",
                request.method, request.path
            ))),
        }
    }

    /// User id behind a farmer's bearer token.
    fn farmer_id(&self, token: Option<&str>) -> ClientResult<u64> {
        let token = token.ok_or_else(|| ClientError::Application {
            status: 401,
            message: "Authentication required".to_string(),
        })?;
        let claims = self.auth.tokens().validate(token)?;

        if claims.user_type != UserType::Farmer {
            return Err(ClientError::Application {
                status: 403,
                message: "Only farmers can manage products".to_string(),
            });
        }
        Ok(claims.user_id)
    }
}

#[async_trait]
impl Transport for MockBackend {
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Value, TransportError> {
        pause(self.latency.for_request(request)).await;
        debug!(method = %request.method, path = %request.path, "Mock backend handling request");

        self.route(request, token).map_err(|err| TransportError::Status {
            status: err.status().unwrap_or(500),
            message: err.to_string(),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn respond<T: Serialize>(value: T) -> ClientResult<Value> {
    serde_json::to_value(value)
        .map_err(|e| ClientError::Internal(format!("Failed to encode mock response: {}", e)))
}

fn bad_request(message: String) -> ClientError {
    ClientError::Application {
        status: 400,
        message,
    }
}

fn parse_body<T: DeserializeOwned>(request: &ApiRequest) -> ClientResult<T> {
    let body = request
        .body
        .clone()
        .ok_or_else(|| bad_request("Request body is required".to_string()))?;
    serde_json::from_value(body).map_err(|e| bad_request(format!("Invalid request body: {}", e)))
}

fn parse_id(raw: &str) -> ClientResult<ProductId> {
    raw.parse()
        .map_err(|_| bad_request(format!("Invalid product id: {}", raw)))
}

fn parse_coordinate(request: &ApiRequest, key: &str) -> ClientResult<f64> {
    request
        .query_param(key)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| bad_request(format!("Missing or invalid {}", key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> MockBackend {
        MockBackend::new(&MockSettings::default()).with_latency(MockLatency::none())
    }

    async fn sign_in(backend: &MockBackend, email: &str) -> String {
        let request = ApiRequest::post(
            "/api/auth/signin",
            &json!({ "email": email, "password": "123456" }),
        )
        .unwrap();
        let response = backend.send(&request, None).await.unwrap();
        response["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_injected_rng_decides_payment_outcome() {
        use rand::rngs::mock::StepRng;

        let settings = MockSettings::default();
        assert_eq!(settings.payment_success_rate, 0.95);

        // Draws 0.0 every time
        let approving = MockBackend::new(&settings)
            .with_payment_rng(Box::new(StepRng::new(0, 0)), &settings)
            .with_latency(MockLatency::none());
        // Draws just below 1.0 every time
        let declining = MockBackend::new(&settings)
            .with_payment_rng(Box::new(StepRng::new(u64::MAX, 0)), &settings)
            .with_latency(MockLatency::none());

        for _ in 0..10 {
            let approved = approving
                .process_payment("order_1", 376.29, PaymentMethod::Card)
                .await
                .unwrap();
            assert!(approved.success);
            assert!(approved.signature.is_some());

            let declined = declining
                .process_payment("order_1", 376.29, PaymentMethod::Card)
                .await
                .unwrap();
            assert!(!declined.success);
            assert_eq!(declined.message.as_deref(), Some(PAYMENT_DECLINED_MESSAGE));
        }
    }

    #[tokio::test]
    async fn test_products_route() {
        let backend = backend();
        let products = backend.send(&ApiRequest::get("/api/products"), None).await.unwrap();
        assert_eq!(products.as_array().unwrap().len(), 6);
        assert_eq!(products[0]["productId"], products[0]["id"]);

        let err = backend
            .send(&ApiRequest::get("/api/products/404"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_farmer_routes_require_farmer_token() {
        let backend = backend();
        let list = ApiRequest::get("/api/farmer/products");

        let anonymous = backend.send(&list, None).await.unwrap_err();
        assert!(matches!(anonymous, TransportError::Status { status: 401, .. }));

        let customer = sign_in(&backend, "customer@test.com").await;
        let forbidden = backend.send(&list, Some(&customer)).await.unwrap_err();
        assert!(matches!(forbidden, TransportError::Status { status: 403, .. }));

        let farmer = sign_in(&backend, "farmer@test.com").await;
        let own = backend.send(&list, Some(&farmer)).await.unwrap();
        assert_eq!(own.as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_order_route_records_order() {
        let backend = backend();
        let request = ApiRequest::post(
            "/api/orders",
            &json!({
                "address": "Bangalore",
                "paymentMethod": "cod",
                "items": [{ "productId": 1, "quantity": 2, "price": 99.0 }]
            }),
        )
        .unwrap();

        let result = backend.send(&request, None).await.unwrap();
        assert_eq!(result["status"], "PENDING");
        assert_eq!(result["totalAmount"], 198.0);
        assert_eq!(backend.catalog().orders().len(), 1);
    }

    #[tokio::test]
    async fn test_distance_route() {
        let backend = backend();
        let request = ApiRequest::get("/api/maps/distance")
            .with_query("originLat", 12.9716)
            .with_query("originLng", 77.5946)
            .with_query("destLat", 12.9716)
            .with_query("destLng", 77.5946);

        let estimate = backend.send(&request, None).await.unwrap();
        assert_eq!(estimate["distance"], 0.0);
        assert_eq!(estimate["durationText"], "0 mins");

        let missing = ApiRequest::get("/api/maps/distance").with_query("originLat", 1);
        assert!(backend.send(&missing, None).await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let err = backend()
            .send(&ApiRequest::get("/api/reviews"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 404, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_latency_is_simulated() {
        let backend = MockBackend::new(&MockSettings::default());
        let request = ApiRequest::post(
            "/api/auth/signin",
            &json!({ "email": "customer@test.com", "password": "123456" }),
        )
        .unwrap();

        let started = tokio::time::Instant::now();
        backend.send(&request, None).await.unwrap();
        // base 300ms + auth 500ms
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(800), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(900), "elapsed {:?}", elapsed);
    }
}
