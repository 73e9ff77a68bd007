use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    payments::{PaymentEvent, PaymentGateway},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    /// Amount in cents.
    #[validate(range(min = 1, message = "Invalid amount"))]
    pub amount: i64,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Create a hosted checkout session for a tutee's outstanding balance.
/// Validation runs before any provider call.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let base_url = &state.settings.server.base_url;
    let success_url = format!("{}/dashboard/tutee?success=true", base_url);
    let cancel_url = format!("{}/dashboard/tutee?canceled=true", base_url);

    let url = state
        .payment_gateway
        .create_checkout_session(&request.email, request.amount, &success_url, &cancel_url)
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// Stripe webhook. A completed checkout flips every confirmed booking
/// billed to the payer's email to paid; everything else is acknowledged
/// and dropped. The response never reveals whether anything matched.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("No signature provided".to_string()))?;

    let event = state.payment_gateway.verify_event(&body, signature)?;

    match event {
        PaymentEvent::CheckoutCompleted {
            billing_email: Some(email),
        } => {
            state
                .service_context
                .booking_service
                .mark_paid(&email)
                .await?;
        }
        PaymentEvent::CheckoutCompleted {
            billing_email: None,
        } => {
            tracing::warn!("Checkout completed without a payer email");
        }
        PaymentEvent::Ignored => {}
    }

    Ok(Json(json!({ "received": true })))
}
