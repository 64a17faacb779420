//! Mock payment gateway and processor.
//!
//! ```text
//! create_order(amount) ──► PaymentOrder { orderId: "order_<ts>", keyId: "mock_key_id" }
//! process(orderId)     ──► draw u ∈ [0,1) from the injected RNG
//!                          u <  success_rate → SUCCESS + signature
//!                          u >= success_rate → FAILED "Payment failed. Please try again."
//! verify(callback)     ──► recompute HMAC-SHA256("{orderId}|{paymentId}")
//! ```

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use sha2::Sha256;
use tracing::{debug, warn};
use uuid::Uuid;

use harvest_core::{
    Ack, PaymentMethod, PaymentOrder, PaymentRecord, PaymentResult, PaymentStatus,
    VerifyPaymentRequest, MOCK_PAYMENT_KEY_ID,
};

use crate::error::{ClientError, ClientResult};

type HmacSha256 = Hmac<Sha256>;

/// Message shown when the processor declines.
pub const PAYMENT_DECLINED_MESSAGE: &str = "Payment failed. Please try again.";

/// Random source behind the approve/decline draw.
pub type PaymentRng = Box<dyn RngCore + Send>;

pub struct MockPaymentProcessor {
    rng: Mutex<PaymentRng>,
    success_rate: f64,
    key_secret: String,
    payments: Mutex<Vec<PaymentRecord>>,
}

impl MockPaymentProcessor {
    /// Seeded processors produce the same approve/decline sequence every run.
    pub fn new(success_rate: f64, seed: Option<u64>, key_secret: &str) -> Self {
        let rng: PaymentRng = match seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self::with_rng(success_rate, rng, key_secret)
    }

    pub fn with_rng(success_rate: f64, rng: PaymentRng, key_secret: &str) -> Self {
        MockPaymentProcessor {
            rng: Mutex::new(rng),
            success_rate,
            key_secret: key_secret.to_string(),
            payments: Mutex::new(Vec::new()),
        }
    }

    /// Issues a payment intent carrying the mock sentinel key.
    pub fn create_order(&self, amount: f64, currency: &str) -> PaymentOrder {
        PaymentOrder {
            order_id: format!("order_{}", Utc::now().timestamp_millis()),
            amount,
            currency: currency.to_string(),
            key_id: MOCK_PAYMENT_KEY_ID.to_string(),
        }
    }

    pub fn process(
        &self,
        order_id: &str,
        amount: f64,
        method: PaymentMethod,
    ) -> ClientResult<PaymentResult> {
        let draw: f64 = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen();

        if draw >= self.success_rate {
            warn!(order_id, %method, "Mock processor declined payment");
            return Ok(PaymentResult {
                success: false,
                payment_id: None,
                transaction_id: None,
                status: PaymentStatus::Failed,
                message: Some(PAYMENT_DECLINED_MESSAGE.to_string()),
                amount: None,
                signature: None,
            });
        }

        let payment_id = format!("pay_{}", Uuid::new_v4().simple());
        let signature = self.sign(order_id, &payment_id)?;
        debug!(order_id, payment_id = %payment_id, "Mock processor approved payment");

        Ok(PaymentResult {
            success: true,
            transaction_id: Some(format!("TXN{}", Utc::now().timestamp_millis())),
            payment_id: Some(payment_id),
            status: PaymentStatus::Success,
            message: None,
            amount: Some(amount),
            signature: Some(signature),
        })
    }

    /// hex(HMAC-SHA256(key, "{orderId}|{paymentId}")).
    pub fn sign(&self, order_id: &str, payment_id: &str) -> ClientResult<String> {
        let mut mac = self.mac()?;
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    pub fn verify(&self, request: &VerifyPaymentRequest) -> ClientResult<bool> {
        let Ok(expected) = hex::decode(&request.signature) else {
            return Ok(false);
        };
        let mut mac = self.mac()?;
        mac.update(format!("{}|{}", request.order_id, request.payment_id).as_bytes());
        Ok(mac.verify_slice(&expected).is_ok())
    }

    pub fn record(&self, record: PaymentRecord) -> Ack {
        debug!(order_id = %record.order_id, status = ?record.status, "Mock payment recorded");
        self.lock_payments().push(record);
        Ack {
            success: true,
            message: Some("Payment recorded".to_string()),
        }
    }

    /// Every recorded payment, oldest first.
    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.lock_payments().clone()
    }

    fn lock_payments(&self) -> MutexGuard<'_, Vec<PaymentRecord>> {
        self.payments.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn mac(&self) -> ClientResult<HmacSha256> {
        HmacSha256::new_from_slice(self.key_secret.as_bytes())
            .map_err(|e| ClientError::Internal(format!("Invalid payment key: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_order_uses_sentinel_key() {
        let processor = MockPaymentProcessor::new(0.95, Some(1), "key");
        let order = processor.create_order(376.29, "INR");
        assert!(order.is_mock());
        assert!(order.order_id.starts_with("order_"));
        assert_eq!(order.amount, 376.29);
    }

    #[test]
    fn test_rate_bounds_are_deterministic() {
        let always = MockPaymentProcessor::new(1.0, None, "key");
        let never = MockPaymentProcessor::new(0.0, None, "key");

        for _ in 0..50 {
            assert!(always.process("order_1", 10.0, PaymentMethod::Card).unwrap().success);
            let declined = never.process("order_1", 10.0, PaymentMethod::Card).unwrap();
            assert!(!declined.success);
            assert_eq!(declined.message.as_deref(), Some(PAYMENT_DECLINED_MESSAGE));
        }
    }

    #[test]
    fn test_injected_rng_at_default_rate() {
        use rand::rngs::mock::StepRng;

        // Draws 0.0, 0.25, 0.5, 0.75: all under the rate
        let processor =
            MockPaymentProcessor::with_rng(0.95, Box::new(StepRng::new(0, 1 << 62)), "key");
        for _ in 0..4 {
            assert!(processor.process("order_1", 1.0, PaymentMethod::Card).unwrap().success);
        }

        // Draws just below 1.0
        let processor =
            MockPaymentProcessor::with_rng(0.95, Box::new(StepRng::new(u64::MAX, 0)), "key");
        let declined = processor.process("order_1", 1.0, PaymentMethod::Card).unwrap();
        assert!(!declined.success);
        assert_eq!(declined.status, PaymentStatus::Failed);
    }

    #[test]
    fn test_same_seed_same_outcomes() {
        let outcomes = |seed| {
            let processor = MockPaymentProcessor::new(0.5, Some(seed), "key");
            (0..32)
                .map(|_| processor.process("order_1", 1.0, PaymentMethod::Card).unwrap().success)
                .collect::<Vec<_>>()
        };
        assert_eq!(outcomes(42), outcomes(42));
    }

    #[test]
    fn test_signature_verifies_only_for_its_payment() {
        let processor = MockPaymentProcessor::new(1.0, None, "key");
        let result = processor.process("order_9", 99.0, PaymentMethod::Card).unwrap();
        let payment_id = result.payment_id.unwrap();
        let signature = result.signature.unwrap();

        let valid = VerifyPaymentRequest {
            order_id: "order_9".to_string(),
            payment_id: payment_id.clone(),
            signature: signature.clone(),
        };
        assert!(processor.verify(&valid).unwrap());

        let tampered = VerifyPaymentRequest {
            order_id: "order_10".to_string(),
            ..valid
        };
        assert!(!processor.verify(&tampered).unwrap());

        let garbage = VerifyPaymentRequest {
            order_id: "order_9".to_string(),
            payment_id,
            signature: "not-hex".to_string(),
        };
        assert!(!processor.verify(&garbage).unwrap());
    }
}
