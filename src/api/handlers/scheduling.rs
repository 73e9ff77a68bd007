use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde_json::{json, Value};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
    scheduling::{self, CalEvent},
};

/// Cal.com webhook. Signature first, then decode, then dispatch to the
/// ledger. The acknowledgement is the same whether or not a mutation
/// happened, so an unauthenticated caller learns nothing about which
/// bookings exist.
pub async fn cal_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(scheduling::SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    if !scheduling::verify_signature(&state.settings.cal.webhook_secret, &body, signature) {
        tracing::warn!("Rejected Cal.com webhook: invalid signature");
        return Err(AppError::Unauthorized);
    }

    let booking_service = &state.service_context.booking_service;

    match scheduling::parse_event(&body)? {
        CalEvent::BookingCreated(payload) => {
            booking_service.create(payload.into_create_request()?).await?;
        }
        CalEvent::BookingCancelled { booking_id } => {
            match booking_service.cancel(&booking_id).await {
                Ok(()) => {}
                Err(AppError::NotFound(_)) => {
                    tracing::info!("Cancellation for unknown booking {}", booking_id);
                }
                Err(e) => return Err(e),
            }
        }
        CalEvent::BookingRescheduled {
            reschedule_id,
            booking,
        } => {
            booking_service
                .reschedule(&reschedule_id, booking.into_create_request()?)
                .await?;
        }
        CalEvent::Unrecognized(tag) => {
            tracing::debug!("Unhandled Cal.com event type: {}", tag);
        }
    }

    Ok(Json(json!({ "success": true })))
}
