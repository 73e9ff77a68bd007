pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, payments::PaymentGateway, service::ServiceContext};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    payment_gateway: Arc<dyn PaymentGateway>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(service_context, payment_gateway, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // Auth routes
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        // API routes
        .nest("/api", api_routes(app_state.clone()))
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/billing", billing_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}

// Webhooks authenticate with provider signatures, not sessions.
fn webhook_routes() -> Router<AppState> {
    Router::new().route("/cal", post(handlers::scheduling::cal_webhook))
}

fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::bookings::mutate))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_tutor,
        ))
}

fn billing_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/owed", get(handlers::billing::owed))
        .route("/owed/stream", get(handlers::billing::owed_stream))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public webhook endpoint (no auth)
        .route("/webhook/stripe", post(handlers::payments::stripe_webhook))
        // Protected payment endpoints
        .merge(
            Router::new()
                .route("/checkout", post(handlers::payments::create_checkout))
                .route_layer(axum::middleware::from_fn_with_state(
                    state,
                    middleware::auth::require_auth,
                )),
        )
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tutees", get(handlers::billing::tutee_balances))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_tutor,
        ))
}
