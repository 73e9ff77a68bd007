use async_trait::async_trait;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, Currency, EventObject, EventType, Webhook, WebhookError,
};

use crate::{
    error::{AppError, Result},
    payments::{PaymentEvent, PaymentGateway},
};

pub struct StripeGateway {
    client: Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(api_key: String, webhook_secret: String) -> Self {
        let client = Client::new(api_key);
        Self {
            client,
            webhook_secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        email: &str,
        amount_cents: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<String> {
        // Checkout session with inline price data; the payer email ties
        // the eventual completion event back to the ledger.
        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.success_url = Some(success_url);
        params.cancel_url = Some(cancel_url);
        params.customer_email = Some(email);

        params.line_items = Some(vec![CreateCheckoutSessionLineItems {
            price_data: Some(stripe::CreateCheckoutSessionLineItemsPriceData {
                currency: Currency::USD,
                unit_amount: Some(amount_cents),
                product_data: Some(stripe::CreateCheckoutSessionLineItemsPriceDataProductData {
                    name: "Tutoring Payment".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            quantity: Some(1),
            ..Default::default()
        }]);

        let session = CheckoutSession::create(&self.client, params)
            .await
            .map_err(|e| AppError::External(format!("Stripe error: {}", e)))?;

        session
            .url
            .ok_or_else(|| AppError::External("No checkout URL returned".to_string()))
    }

    fn verify_event(&self, payload: &str, signature: &str) -> Result<PaymentEvent> {
        let event = Webhook::construct_event(payload, signature, &self.webhook_secret)
            .map_err(|e| match e {
                WebhookError::BadSignature => AppError::BadRequest("Invalid signature".to_string()),
                _ => AppError::BadRequest(format!("Webhook error: {}", e)),
            })?;

        match event.type_ {
            EventType::CheckoutSessionCompleted => {
                if let EventObject::CheckoutSession(session) = event.data.object {
                    Ok(PaymentEvent::CheckoutCompleted {
                        billing_email: session.customer_email,
                    })
                } else {
                    Ok(PaymentEvent::Ignored)
                }
            }
            other => {
                tracing::debug!("Unhandled Stripe event type: {:?}", other);
                Ok(PaymentEvent::Ignored)
            }
        }
    }
}
