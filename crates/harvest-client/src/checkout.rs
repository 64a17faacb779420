//! # Checkout Orchestrator
//!
//! Turns the session cart into an order, running the card payment
//! sub-flow when needed.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Attempt States                            │
//! │                                                                         │
//! │  IDLE ──► VALIDATING ──┬── cod ──────────────────────► SUBMITTING_ORDER │
//! │                        │                                     │          │
//! │                        └── card ─► CREATING_PAYMENT_ORDER    │          │
//! │                                          │                   │          │
//! │                                          ▼                   │          │
//! │                             AWAITING_PAYMENT_CONFIRMATION    │          │
//! │                                │                  │          │          │
//! │                                ▼                  ▼          │          │
//! │                        PAYMENT_SUCCEEDED    PAYMENT_FAILED   │          │
//! │                                │                  │          │          │
//! │                                └──► SUBMITTING ◄──┼──────────┘          │
//! │                                      ORDER        ▼                     │
//! │                                        │         IDLE                   │
//! │                                        ▼                                │
//! │                              ORDER_SUBMITTED ──► CART_CLEARED           │
//! │                                                                         │
//! │  FAILED is reachable from any state and returns control to IDLE.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Validation failures issue no request at all.
//! - The cart is cleared if and only if order submission succeeded.
//! - A declined, cancelled or unverified payment never creates an order.
//! - At most one attempt runs at a time; a second one gets
//!   [`CheckoutError::InFlight`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use harvest_core::validation::validate_checkout;
use harvest_core::{
    CartTotals, CreatePaymentOrderRequest, OrderItemRequest, OrderRequest, OrderResult,
    PaymentMethod, PaymentOrder, PaymentRecord, PaymentStatus, VerifyPaymentRequest,
};

use crate::dispatcher::Dispatcher;
use crate::error::{CheckoutError, CheckoutResult};
use crate::mock::PAYMENT_DECLINED_MESSAGE;
use crate::session::CartState;

/// Message used when the customer backs out of a payment.
pub const PAYMENT_CANCELLED_MESSAGE: &str = "Payment cancelled";

// =============================================================================
// States
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutState {
    #[default]
    Idle,
    Validating,
    SubmittingOrder,
    CreatingPaymentOrder,
    AwaitingPaymentConfirmation,
    PaymentSucceeded,
    PaymentFailed,
    OrderSubmitted,
    CartCleared,
    Failed,
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CheckoutState::Idle => "IDLE",
            CheckoutState::Validating => "VALIDATING",
            CheckoutState::SubmittingOrder => "SUBMITTING_ORDER",
            CheckoutState::CreatingPaymentOrder => "CREATING_PAYMENT_ORDER",
            CheckoutState::AwaitingPaymentConfirmation => "AWAITING_PAYMENT_CONFIRMATION",
            CheckoutState::PaymentSucceeded => "PAYMENT_SUCCEEDED",
            CheckoutState::PaymentFailed => "PAYMENT_FAILED",
            CheckoutState::OrderSubmitted => "ORDER_SUBMITTED",
            CheckoutState::CartCleared => "CART_CLEARED",
            CheckoutState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// Payment Seams
// =============================================================================

/// Asks the customer to approve the exact amount of a mock payment.
#[async_trait]
pub trait PaymentConfirmer: Send + Sync {
    /// `false` cancels the payment.
    async fn confirm(&self, order: &PaymentOrder) -> bool;
}

/// Confirms every payment without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl PaymentConfirmer for AutoConfirm {
    async fn confirm(&self, _order: &PaymentOrder) -> bool {
        true
    }
}

/// What a real payment widget reports back.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayOutcome {
    /// The widget's callback payload, to be verified server-side.
    Completed(VerifyPaymentRequest),
    Cancelled,
}

/// Hand-off to a real payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn collect(&self, order: &PaymentOrder) -> GatewayOutcome;
}

// =============================================================================
// Outcome
// =============================================================================

/// Payment details of a successful card checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSummary {
    pub payment_order_id: String,
    pub payment_id: Option<String>,
    pub transaction_id: Option<String>,
    /// False when recording the payment failed; the order still went through.
    pub recorded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub order: OrderResult,
    /// Totals of the cart that was submitted.
    pub totals: CartTotals,
    pub payment: Option<PaymentSummary>,
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Debug, Default)]
struct Progress {
    state: CheckoutState,
    trail: Vec<CheckoutState>,
}

/// Releases the in-flight latch when the attempt ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(latch: &'a AtomicBool) -> Option<Self> {
        latch
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(latch))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// What the attempt submits, frozen after validation.
struct Submission {
    address: String,
    items: Vec<OrderItemRequest>,
    totals: CartTotals,
}

pub struct CheckoutOrchestrator {
    dispatcher: Arc<Dispatcher>,
    cart: CartState,
    confirmer: Arc<dyn PaymentConfirmer>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    currency: String,
    in_flight: AtomicBool,
    progress: Mutex<Progress>,
}

impl CheckoutOrchestrator {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        cart: CartState,
        confirmer: Arc<dyn PaymentConfirmer>,
    ) -> Self {
        CheckoutOrchestrator {
            dispatcher,
            cart,
            confirmer,
            gateway: None,
            currency: harvest_core::DEFAULT_CURRENCY.to_string(),
            in_flight: AtomicBool::new(false),
            progress: Mutex::new(Progress::default()),
        }
    }

    /// Uses `gateway` for payment orders that are not mock sentinels.
    pub fn with_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn state(&self) -> CheckoutState {
        self.progress().state
    }

    /// States visited by the most recent attempt, in order.
    pub fn trail(&self) -> Vec<CheckoutState> {
        self.progress().trail.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn transition(&self, to: CheckoutState) {
        let mut progress = self.progress();
        debug!(from = %progress.state, to = %to, "Checkout transition");
        progress.state = to;
        progress.trail.push(to);
    }

    /// Ends the attempt through FAILED.
    fn fail(&self, err: CheckoutError) -> CheckoutError {
        warn!(error = %err, status = ?err.status(), "Checkout failed");
        self.transition(CheckoutState::Failed);
        self.transition(CheckoutState::Idle);
        err
    }

    /// Ends the attempt through PAYMENT_FAILED.
    fn payment_failed(&self, message: String) -> CheckoutError {
        warn!(reason = %message, "Payment did not complete");
        self.transition(CheckoutState::PaymentFailed);
        self.transition(CheckoutState::Idle);
        CheckoutError::PaymentFailed(message)
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Runs one checkout attempt for the current cart.
    pub async fn checkout(
        &self,
        address: &str,
        method: PaymentMethod,
    ) -> CheckoutResult<CheckoutOutcome> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Checkout already in progress");
            return Err(CheckoutError::InFlight);
        };

        {
            let mut progress = self.progress();
            progress.state = CheckoutState::Idle;
            progress.trail = vec![CheckoutState::Idle];
        }
        self.transition(CheckoutState::Validating);

        let submission = self
            .cart
            .with_cart(|cart| {
                validate_checkout(cart, address).map(|address| Submission {
                    address,
                    items: cart.order_items(),
                    totals: cart.totals(),
                })
            })
            .map_err(|err| self.fail(err.into()))?;

        let payment = match method {
            PaymentMethod::Cod => None,
            PaymentMethod::Card => Some(self.pay_by_card(&submission).await?),
        };

        self.submit_order(submission, method, payment).await
    }

    async fn pay_by_card(&self, submission: &Submission) -> CheckoutResult<PaymentSummary> {
        self.transition(CheckoutState::CreatingPaymentOrder);
        let request = CreatePaymentOrderRequest {
            amount: submission.totals.total,
            currency: self.currency.clone(),
            receipt: format!("receipt_{}", Uuid::new_v4().simple()),
        };
        let order = self
            .dispatcher
            .create_payment_order(&request)
            .await
            .map_err(|err| self.fail(CheckoutError::Payment(err)))?;

        self.transition(CheckoutState::AwaitingPaymentConfirmation);
        match &self.gateway {
            Some(gateway) if !order.is_mock() => self.pay_through_gateway(gateway.as_ref(), &order).await,
            _ => self.pay_with_mock_processor(&order).await,
        }
    }

    async fn pay_with_mock_processor(&self, order: &PaymentOrder) -> CheckoutResult<PaymentSummary> {
        if !self.confirmer.confirm(order).await {
            return Err(self.payment_failed(PAYMENT_CANCELLED_MESSAGE.to_string()));
        }

        let result = self
            .dispatcher
            .process_mock_payment(&order.order_id, order.amount, PaymentMethod::Card)
            .await
            .map_err(|err| self.fail(CheckoutError::Payment(err)))?;

        if !result.success {
            let message = result
                .message
                .unwrap_or_else(|| PAYMENT_DECLINED_MESSAGE.to_string());
            return Err(self.payment_failed(message));
        }
        self.transition(CheckoutState::PaymentSucceeded);

        let transaction_id = result
            .transaction_id
            .clone()
            .or_else(|| result.payment_id.clone())
            .unwrap_or_default();
        let record = PaymentRecord {
            order_id: order.order_id.clone(),
            amount: order.amount,
            payment_method: PaymentMethod::Card,
            transaction_id,
            status: PaymentStatus::Success,
        };
        let recorded = match self.dispatcher.record_payment(&record).await {
            Ok(_) => true,
            Err(err) => {
                warn!(payment_order_id = %order.order_id, error = %err, "Failed to record payment");
                false
            }
        };

        Ok(PaymentSummary {
            payment_order_id: order.order_id.clone(),
            payment_id: result.payment_id,
            transaction_id: result.transaction_id,
            recorded,
        })
    }

    async fn pay_through_gateway(
        &self,
        gateway: &dyn PaymentGateway,
        order: &PaymentOrder,
    ) -> CheckoutResult<PaymentSummary> {
        let callback = match gateway.collect(order).await {
            GatewayOutcome::Completed(callback) => callback,
            GatewayOutcome::Cancelled => {
                return Err(self.payment_failed(PAYMENT_CANCELLED_MESSAGE.to_string()))
            }
        };

        let verified = self
            .dispatcher
            .verify_payment(&callback)
            .await
            .map_err(|err| self.fail(CheckoutError::Payment(err)))?;
        if !verified {
            return Err(self.fail(CheckoutError::VerificationFailed {
                order_id: callback.order_id,
            }));
        }
        self.transition(CheckoutState::PaymentSucceeded);

        Ok(PaymentSummary {
            payment_order_id: callback.order_id,
            payment_id: Some(callback.payment_id),
            transaction_id: None,
            recorded: true,
        })
    }

    async fn submit_order(
        &self,
        submission: Submission,
        method: PaymentMethod,
        payment: Option<PaymentSummary>,
    ) -> CheckoutResult<CheckoutOutcome> {
        self.transition(CheckoutState::SubmittingOrder);
        let request = OrderRequest {
            address: submission.address,
            payment_method: method,
            items: submission.items,
        };

        let order = self
            .dispatcher
            .create_order(&request)
            .await
            .map_err(|err| self.fail(CheckoutError::OrderSubmission(err)))?;
        self.transition(CheckoutState::OrderSubmitted);

        self.cart.clear();
        self.transition(CheckoutState::CartCleared);

        info!(
            order_id = order.order_id,
            payment_method = %method,
            total = submission.totals.total,
            "Order placed"
        );
        Ok(CheckoutOutcome {
            order,
            totals: submission.totals,
            payment,
        })
    }
}
