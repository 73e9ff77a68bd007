use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    domain::CreateBookingRequest,
    error::{AppError, Result},
    repository::CreateOutcome,
};

/// Mutation envelope used by internal callers (and by operators poking
/// the ledger directly). Webhook ingestion goes through the service
/// layer, not through this endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingMutationRequest {
    #[serde(rename = "type")]
    pub mutation_type: String,
    pub booking_data: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct BookingMutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BookingRef {
    cal_booking_id: String,
}

pub async fn mutate(
    State(state): State<AppState>,
    Json(request): Json<BookingMutationRequest>,
) -> Result<(StatusCode, Json<BookingMutationResponse>)> {
    let booking_service = &state.service_context.booking_service;

    match request.mutation_type.as_str() {
        "create" => {
            let data: CreateBookingRequest = serde_json::from_value(request.booking_data)
                .map_err(|e| AppError::BadRequest(format!("Invalid booking data: {}", e)))?;

            let message = match booking_service.create(data).await? {
                CreateOutcome::Created(_) => None,
                CreateOutcome::AlreadyExists => Some("Booking already exists".to_string()),
            };

            Ok((
                StatusCode::OK,
                Json(BookingMutationResponse {
                    success: true,
                    message,
                }),
            ))
        }
        "cancel" => {
            let data: BookingRef = serde_json::from_value(request.booking_data)
                .map_err(|e| AppError::BadRequest(format!("Invalid booking data: {}", e)))?;

            match booking_service.cancel(&data.cal_booking_id).await {
                Ok(()) => Ok((
                    StatusCode::OK,
                    Json(BookingMutationResponse {
                        success: true,
                        message: None,
                    }),
                )),
                Err(AppError::NotFound(_)) => Ok((
                    StatusCode::NOT_FOUND,
                    Json(BookingMutationResponse {
                        success: false,
                        message: Some("Booking not found".to_string()),
                    }),
                )),
                Err(e) => Err(e),
            }
        }
        "delete" => {
            let data: BookingRef = serde_json::from_value(request.booking_data)
                .map_err(|e| AppError::BadRequest(format!("Invalid booking data: {}", e)))?;

            match booking_service.delete(&data.cal_booking_id).await {
                Ok(()) => Ok((
                    StatusCode::OK,
                    Json(BookingMutationResponse {
                        success: true,
                        message: None,
                    }),
                )),
                Err(AppError::NotFound(_)) => Ok((
                    StatusCode::NOT_FOUND,
                    Json(BookingMutationResponse {
                        success: false,
                        message: Some("Booking not found".to_string()),
                    }),
                )),
                Err(e) => Err(e),
            }
        }
        other => Err(AppError::BadRequest(format!(
            "Unknown booking type: {}",
            other
        ))),
    }
}
