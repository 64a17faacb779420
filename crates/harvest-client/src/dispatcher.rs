//! # Request Dispatcher
//!
//! One typed call surface over the mock backend and the real HTTP backend.
//!
//! ## Dispatch Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Dispatch Decision                               │
//! │                                                                         │
//! │  mode = Mock ──────────────────────────────► MockBackend               │
//! │                                                                         │
//! │  mode = Live / LiveWithFallback                                        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  timeout(request_timeout, HttpTransport::send)                         │
//! │     │                                                                   │
//! │     ├── Ok(body) ──────────────────────────► decode into T             │
//! │     ├── Err(Network) + LiveWithFallback ───► MockBackend (warn!)        │
//! │     ├── Err(Network) + Live ───────────────► NetworkFailure            │
//! │     ├── Err(Status 404) ───────────────────► NotFound                  │
//! │     ├── Err(Status n) ─────────────────────► Application{n, message}   │
//! │     └── elapsed ───────────────────────────► Timeout (never re-sent)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The bearer token is read from the [`CredentialStore`] on every call and
//! attached when present.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use harvest_core::delivery::DeliveryTracking;
use harvest_core::validation::validate_product_payload;
use harvest_core::{
    Ack, AuthResponse, Coordinates, CreatePaymentOrderRequest, DistanceEstimate, OrderRequest,
    OrderResult, OrderStatus, PaymentMethod, PaymentOrder, PaymentRecord, PaymentResult, Product,
    ProductId, ProductPayload, SignInRequest, SignUpRequest, VerifyPaymentRequest, VerifyPaymentResponse,
};

use crate::config::{ClientConfig, DispatchMode};
use crate::credentials::CredentialStore;
use crate::error::{ClientError, ClientResult};
use crate::mock::MockBackend;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Default upper bound on a live call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Dispatcher {
    mode: DispatchMode,
    mock: Arc<MockBackend>,
    live: Option<Arc<dyn Transport>>,
    credentials: Arc<dyn CredentialStore>,
    request_timeout: Duration,
}

impl Dispatcher {
    /// Dispatcher that only ever talks to `mock`.
    pub fn mock(mock: Arc<MockBackend>, credentials: Arc<dyn CredentialStore>) -> Self {
        Dispatcher {
            mode: DispatchMode::Mock,
            mock,
            live: None,
            credentials,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Dispatcher that sends calls to `live` first.
    ///
    /// `mode` decides whether connection failures are re-sent to `mock`.
    pub fn live(
        mode: DispatchMode,
        live: Arc<dyn Transport>,
        mock: Arc<MockBackend>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Dispatcher {
            mode,
            mock,
            live: Some(live),
            credentials,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Builds the dispatcher described by `config`.
    pub fn from_config(
        config: &ClientConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> ClientResult<Self> {
        let mock = Arc::new(MockBackend::new(&config.mock));

        let dispatcher = if config.mode().uses_live_backend() {
            let http = HttpTransport::new(&config.api.base_url)?;
            Self::live(config.mode(), Arc::new(http), mock, credentials)
        } else {
            Self::mock(mock, credentials)
        };

        Ok(dispatcher.with_timeout(config.request_timeout()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// The simulator answering mock and fallback calls.
    pub fn mock_backend(&self) -> &Arc<MockBackend> {
        &self.mock
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    // =========================================================================
    // Core Dispatch
    // =========================================================================

    async fn call(&self, request: ApiRequest) -> ClientResult<Value> {
        let token = self.credentials.token();
        let token = token.as_deref();

        let live = match (&self.live, self.mode) {
            (Some(live), mode) if mode.uses_live_backend() => live,
            _ => {
                debug!(method = %request.method, path = %request.path, "Dispatching to mock backend");
                return Ok(self.mock.send(&request, token).await?);
            }
        };

        debug!(method = %request.method, path = %request.path, mode = %self.mode, "Dispatching to live backend");
        match self.send_live(live.as_ref(), &request, token).await {
            Err(err) if err.is_network_failure() && self.mode.falls_back_to_mock() => {
                warn!(
                    method = %request.method,
                    path = %request.path,
                    error = %err,
                    "Backend unreachable, falling back to mock backend"
                );
                Ok(self.mock.send(&request, token).await?)
            }
            result => result,
        }
    }

    async fn send_live(
        &self,
        live: &dyn Transport,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> ClientResult<Value> {
        match tokio::time::timeout(self.request_timeout, live.send(request, token)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!(path = %request.path, timeout = ?self.request_timeout, "Request timed out");
                Err(ClientError::Timeout(self.request_timeout))
            }
        }
    }

    async fn call_as<T: DeserializeOwned>(&self, request: ApiRequest) -> ClientResult<T> {
        Ok(serde_json::from_value(self.call(request).await?)?)
    }

    /// Calls whose success body may be empty.
    async fn call_ack(&self, request: ApiRequest) -> ClientResult<Ack> {
        match self.call(request).await? {
            Value::Null => Ok(Ack::default()),
            body => Ok(serde_json::from_value(body)?),
        }
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// A wrong password is a `success: false` response, not an error.
    pub async fn sign_in(&self, email: &str, password: &str) -> ClientResult<AuthResponse> {
        let body = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.call_as(ApiRequest::post("/api/auth/signin", &body)?).await
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> ClientResult<AuthResponse> {
        self.call_as(ApiRequest::post("/api/auth/signup", request)?).await
    }

    // =========================================================================
    // Catalogue & Orders
    // =========================================================================

    pub async fn get_products(&self) -> ClientResult<Vec<Product>> {
        self.call_as(ApiRequest::get("/api/products")).await
    }

    pub async fn get_product_by_id(&self, id: ProductId) -> ClientResult<Product> {
        self.call_as(ApiRequest::get(format!("/api/products/{}", id))).await
    }

    /// A 2xx answer always means the order was placed, so an unfamiliar
    /// body is filled in from the request rather than reported as a failure.
    pub async fn create_order(&self, order: &OrderRequest) -> ClientResult<OrderResult> {
        let body = self.call(ApiRequest::post("/api/orders", order)?).await?;
        match serde_json::from_value::<OrderResult>(body.clone()) {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(error = %err, "Unrecognised order response, order treated as accepted");
                Ok(OrderResult {
                    order_id: body
                        .get("orderId")
                        .or_else(|| body.get("id"))
                        .and_then(Value::as_u64)
                        .unwrap_or_default(),
                    total_amount: body
                        .get("totalAmount")
                        .and_then(Value::as_f64)
                        .unwrap_or_else(|| order.items_total()),
                    status: OrderStatus::Pending,
                })
            }
        }
    }

    // =========================================================================
    // Payments
    // =========================================================================

    pub async fn create_payment_order(
        &self,
        request: &CreatePaymentOrderRequest,
    ) -> ClientResult<PaymentOrder> {
        self.call_as(ApiRequest::post("/api/payments/gateway/create-order", request)?)
            .await
    }

    /// Runs the mock processor. Only valid for sentinel payment orders, so
    /// this never leaves the process.
    pub async fn process_mock_payment(
        &self,
        order_id: &str,
        amount: f64,
        method: PaymentMethod,
    ) -> ClientResult<PaymentResult> {
        self.mock.process_payment(order_id, amount, method).await
    }

    pub async fn verify_payment(&self, request: &VerifyPaymentRequest) -> ClientResult<bool> {
        let response: VerifyPaymentResponse = self
            .call_as(ApiRequest::post("/api/payments/gateway/verify", request)?)
            .await?;
        Ok(response.verified)
    }

    pub async fn record_payment(&self, record: &PaymentRecord) -> ClientResult<Ack> {
        self.call_ack(ApiRequest::post("/api/payments", record)?).await
    }

    // =========================================================================
    // Farmer Products
    // =========================================================================

    pub async fn farmer_products(&self) -> ClientResult<Vec<Product>> {
        self.call_as(ApiRequest::get("/api/farmer/products")).await
    }

    pub async fn create_farmer_product(&self, payload: &ProductPayload) -> ClientResult<Product> {
        validate_product_payload(payload)?;
        self.call_as(ApiRequest::post("/api/farmer/products", payload)?)
            .await
    }

    pub async fn update_farmer_product(
        &self,
        id: ProductId,
        payload: &ProductPayload,
    ) -> ClientResult<Product> {
        validate_product_payload(payload)?;
        self.call_as(ApiRequest::put(format!("/api/farmer/products/{}", id), payload)?)
            .await
    }

    pub async fn delete_farmer_product(&self, id: ProductId) -> ClientResult<Ack> {
        self.call_ack(ApiRequest::delete(format!("/api/farmer/products/{}", id)))
            .await
    }

    // =========================================================================
    // Maps
    // =========================================================================

    pub async fn geocode(&self, address: &str) -> ClientResult<Coordinates> {
        self.call_as(ApiRequest::get("/api/maps/geocode").with_query("address", address))
            .await
    }

    pub async fn distance(
        &self,
        origin: Coordinates,
        destination: Coordinates,
    ) -> ClientResult<DistanceEstimate> {
        let request = ApiRequest::get("/api/maps/distance")
            .with_query("originLat", origin.latitude)
            .with_query("originLng", origin.longitude)
            .with_query("destLat", destination.latitude)
            .with_query("destLng", destination.longitude);
        self.call_as(request).await
    }

    /// Geocodes both addresses and routes between them.
    pub async fn track_delivery(
        &self,
        pickup_address: &str,
        delivery_address: &str,
    ) -> ClientResult<DeliveryTracking> {
        let pickup = self.geocode(pickup_address).await?;
        let destination = self.geocode(delivery_address).await?;
        let estimate = self.distance(pickup, destination).await?;

        debug!(
            distance = estimate.distance,
            duration = estimate.duration,
            "Delivery routed"
        );
        Ok(DeliveryTracking::routed(pickup, destination, &estimate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockSettings;
    use crate::credentials::{Credential, InMemoryCredentialStore};
    use crate::error::TransportError;
    use crate::mock::MockLatency;
    use async_trait::async_trait;
    use harvest_core::UserType;
    use std::sync::Mutex;

    /// Transport that answers every call with the same outcome.
    struct FixedTransport {
        outcome: Result<Value, TransportError>,
        delay: Duration,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    impl FixedTransport {
        fn new(outcome: Result<Value, TransportError>) -> Self {
            FixedTransport {
                outcome,
                delay: Duration::ZERO,
                seen_tokens: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn send(&self, _: &ApiRequest, token: Option<&str>) -> Result<Value, TransportError> {
            self.seen_tokens.lock().unwrap().push(token.map(str::to_string));
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone()
        }
    }

    fn mock() -> Arc<MockBackend> {
        Arc::new(MockBackend::new(&MockSettings::default()).with_latency(MockLatency::none()))
    }

    fn store() -> Arc<InMemoryCredentialStore> {
        Arc::new(InMemoryCredentialStore::new())
    }

    fn refused() -> Result<Value, TransportError> {
        Err(TransportError::Network("error sending request: connection refused".into()))
    }

    #[tokio::test]
    async fn test_mock_mode_answers_locally() {
        let dispatcher = Dispatcher::mock(mock(), store());
        let products = dispatcher.get_products().await.unwrap();
        assert_eq!(products.len(), 6);
    }

    #[tokio::test]
    async fn test_network_failure_falls_back_to_mock() {
        let live = Arc::new(FixedTransport::new(refused()));
        let dispatcher = Dispatcher::live(DispatchMode::LiveWithFallback, live, mock(), store());

        let response = dispatcher.sign_in("customer@test.com", "123456").await.unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_network_failure_surfaces_without_fallback() {
        let live = Arc::new(FixedTransport::new(refused()));
        let dispatcher = Dispatcher::live(DispatchMode::Live, live, mock(), store());

        let err = dispatcher.get_products().await.unwrap_err();
        assert!(err.is_network_failure());
    }

    #[tokio::test]
    async fn test_application_error_never_falls_back() {
        let live = Arc::new(FixedTransport::new(Err(TransportError::Status {
            status: 409,
            message: "Insufficient stock for Kale Bunch".into(),
        })));
        let backend = mock();
        let dispatcher =
            Dispatcher::live(DispatchMode::LiveWithFallback, live, backend.clone(), store());

        let order = OrderRequest {
            address: "Delhi".to_string(),
            payment_method: PaymentMethod::Cod,
            items: Vec::new(),
        };
        let err = dispatcher.create_order(&order).await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Application {
                status: 409,
                message: "Insufficient stock for Kale Bunch".into()
            }
        );
        assert!(backend.catalog().orders().is_empty());
    }

    #[tokio::test]
    async fn test_live_404_is_not_found() {
        let live = Arc::new(FixedTransport::new(Err(TransportError::Status {
            status: 404,
            message: "Product not found".into(),
        })));
        let dispatcher = Dispatcher::live(DispatchMode::LiveWithFallback, live, mock(), store());

        let err = dispatcher.get_product_by_id(42).await.unwrap_err();
        assert_eq!(err, ClientError::NotFound("Product not found".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_typed_and_not_retried_on_mock() {
        let mut slow = FixedTransport::new(Ok(Value::Null));
        slow.delay = Duration::from_secs(60);
        let backend = mock();
        let dispatcher =
            Dispatcher::live(DispatchMode::LiveWithFallback, Arc::new(slow), backend.clone(), store())
                .with_timeout(Duration::from_secs(10));

        let order = OrderRequest {
            address: "Delhi".to_string(),
            payment_method: PaymentMethod::Cod,
            items: Vec::new(),
        };
        let err = dispatcher.create_order(&order).await.unwrap_err();
        assert_eq!(err, ClientError::Timeout(Duration::from_secs(10)));
        assert!(backend.catalog().orders().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_timeout_keeps_millis() {
        let mut slow = FixedTransport::new(Ok(Value::Null));
        slow.delay = Duration::from_secs(5);
        let dispatcher = Dispatcher::live(DispatchMode::Live, Arc::new(slow), mock(), store())
            .with_timeout(Duration::from_millis(250));

        let err = dispatcher.get_products().await.unwrap_err();
        assert_eq!(err, ClientError::Timeout(Duration::from_millis(250)));
        assert_eq!(err.to_string(), "Request timed out after 250ms");
    }

    #[tokio::test]
    async fn test_accepted_order_without_status_is_pending() {
        let saved = serde_json::json!({
            "orderId": 5,
            "orderDate": "2024-03-01T10:15:30",
            "totalAmount": 347.0
        });
        let live = Arc::new(FixedTransport::new(Ok(saved)));
        let dispatcher = Dispatcher::live(DispatchMode::Live, live, mock(), store());

        let order = OrderRequest {
            address: "Delhi".to_string(),
            payment_method: PaymentMethod::Cod,
            items: vec![harvest_core::OrderItemRequest {
                product_id: 1,
                quantity: 2,
                price: 99.0,
            }],
        };
        let result = dispatcher.create_order(&order).await.unwrap();
        assert_eq!(result.order_id, 5);
        assert_eq!(result.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_empty_order_response_still_counts_as_placed() {
        let live = Arc::new(FixedTransport::new(Ok(Value::Null)));
        let dispatcher = Dispatcher::live(DispatchMode::Live, live, mock(), store());

        let order = OrderRequest {
            address: "Delhi".to_string(),
            payment_method: PaymentMethod::Card,
            items: vec![harvest_core::OrderItemRequest {
                product_id: 2,
                quantity: 1,
                price: 149.0,
            }],
        };
        let result = dispatcher.create_order(&order).await.unwrap();
        assert_eq!(result.total_amount, 149.0);
        assert_eq!(result.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_bearer_token_attached_when_present() {
        let live = Arc::new(FixedTransport::new(Ok(serde_json::json!([]))));
        let credentials = store();
        let dispatcher =
            Dispatcher::live(DispatchMode::Live, live.clone(), mock(), credentials.clone());

        dispatcher.get_products().await.unwrap();
        credentials.set(Credential::new(
            "tok-123",
            harvest_core::User {
                user_id: 1,
                name: "Test Customer".into(),
                email: "customer@test.com".into(),
                user_type: UserType::Customer,
            },
        ));
        dispatcher.get_products().await.unwrap();

        let seen = live.seen_tokens.lock().unwrap().clone();
        assert_eq!(seen, vec![None, Some("tok-123".to_string())]);
    }

    #[tokio::test]
    async fn test_empty_body_is_ack() {
        let live = Arc::new(FixedTransport::new(Ok(Value::Null)));
        let dispatcher = Dispatcher::live(DispatchMode::Live, live, mock(), store());
        assert!(dispatcher.delete_farmer_product(3).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_invalid_product_payload_blocked_locally() {
        let live = Arc::new(FixedTransport::new(refused()));
        let dispatcher = Dispatcher::live(DispatchMode::Live, live.clone(), mock(), store());

        let payload = ProductPayload {
            name: "  ".to_string(),
            category: "Vegetables".to_string(),
            price: 10.0,
            quantity: None,
            image: None,
            freshness: None,
            date_of_harvest: None,
        };
        let err = dispatcher.create_farmer_product(&payload).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(live.seen_tokens.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_farmer_crud_through_mock() {
        let credentials = store();
        let dispatcher = Dispatcher::mock(mock(), credentials.clone());

        let auth = dispatcher.sign_in("farmer@test.com", "123456").await.unwrap();
        credentials.set(Credential::from_auth_response(&auth).unwrap());

        let payload = ProductPayload {
            name: "Carrots".to_string(),
            category: "Vegetables".to_string(),
            price: 40.0,
            quantity: Some(25),
            image: None,
            freshness: Some(9.5),
            date_of_harvest: Some("2024-03-01".to_string()),
        };
        let created = dispatcher.create_farmer_product(&payload).await.unwrap();
        assert_eq!(dispatcher.farmer_products().await.unwrap().len(), 7);

        let renamed = ProductPayload {
            name: "Baby Carrots".to_string(),
            ..payload
        };
        let updated = dispatcher
            .update_farmer_product(created.product_id, &renamed)
            .await
            .unwrap();
        assert_eq!(updated.name, "Baby Carrots");

        dispatcher.delete_farmer_product(created.product_id).await.unwrap();
        let err = dispatcher
            .delete_farmer_product(created.product_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_track_delivery() {
        let dispatcher = Dispatcher::mock(mock(), store());
        let tracking = dispatcher
            .track_delivery("Farm gate, Bangalore", "Bandra, Mumbai")
            .await
            .unwrap();

        let (pickup, destination) = tracking.route_endpoints().unwrap();
        assert_eq!(pickup, Coordinates::new(12.9716, 77.5946));
        assert_eq!(destination, Coordinates::new(19.0760, 72.8777));
        assert!((840.0..=850.0).contains(&tracking.distance.unwrap()));
    }
}
