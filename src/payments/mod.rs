use async_trait::async_trait;

use crate::error::Result;

pub mod stripe_gateway;

pub use stripe_gateway::StripeGateway;

/// A payment-provider event after signature verification, reduced to
/// what the ledger cares about.
#[derive(Debug, Clone)]
pub enum PaymentEvent {
    /// A checkout finished. `billing_email` is the payer email the
    /// provider attached to the session, when it attached one.
    CheckoutCompleted { billing_email: Option<String> },
    /// Anything else. Acknowledged, never acted on.
    Ignored,
}

/// Port over the payment provider. Handlers receive an injected
/// implementation rather than reaching for a process-wide client, so
/// tests can substitute a fake.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted checkout session and return its redirect URL.
    async fn create_checkout_session(
        &self,
        email: &str,
        amount_cents: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String>;

    /// Verify a webhook delivery against the signing secret and decode
    /// it. Signature failures are errors; unhandled event types are not.
    fn verify_event(&self, payload: &str, signature: &str) -> Result<PaymentEvent>;
}

#[cfg(any(test, feature = "test-utils"))]
pub use fake_gateway::{FakePaymentGateway, FAKE_SIGNATURE};

#[cfg(any(test, feature = "test-utils"))]
mod fake_gateway {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{PaymentEvent, PaymentGateway};
    use crate::error::{AppError, Result};

    /// Signature accepted by the fake. Anything else is rejected the
    /// way a bad Stripe signature would be.
    pub const FAKE_SIGNATURE: &str = "fake-signature";

    pub struct FakePaymentGateway {
        /// (email, amount_cents) for every checkout session created.
        pub checkout_requests: Mutex<Vec<(String, i64)>>,
        event: Option<PaymentEvent>,
    }

    impl FakePaymentGateway {
        pub fn new() -> Self {
            Self {
                checkout_requests: Mutex::new(Vec::new()),
                event: None,
            }
        }

        pub fn with_event(event: PaymentEvent) -> Self {
            Self {
                checkout_requests: Mutex::new(Vec::new()),
                event: Some(event),
            }
        }
    }

    impl Default for FakePaymentGateway {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl PaymentGateway for FakePaymentGateway {
        async fn create_checkout_session(
            &self,
            email: &str,
            amount_cents: i64,
            _success_url: &str,
            _cancel_url: &str,
        ) -> Result<String> {
            self.checkout_requests
                .lock()
                .unwrap()
                .push((email.to_string(), amount_cents));
            Ok("https://checkout.test/session".to_string())
        }

        fn verify_event(&self, _payload: &str, signature: &str) -> Result<PaymentEvent> {
            if signature != FAKE_SIGNATURE {
                return Err(AppError::BadRequest("Invalid signature".to_string()));
            }
            Ok(self.event.clone().unwrap_or(PaymentEvent::Ignored))
        }
    }
}
