use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Tutelage API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Booking and billing backend for a tutoring practice",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "auth": "/auth/login",
            "bookings": "/api/bookings",
            "billing": "/api/billing/owed",
            "admin": "/api/admin/tutees"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
