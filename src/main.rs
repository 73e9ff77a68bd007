mod api;
mod auth;
mod config;
mod domain;
mod error;
mod payments;
mod repository;
mod scheduling;
mod service;

use std::sync::Arc;

use anyhow::Context;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Settings, service::ServiceContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in development; absent files are fine
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutelage=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration. Webhook and API secrets have no defaults, so
    // an incomplete environment stops the process here.
    let settings = Settings::new().context("Failed to load configuration")?;

    tracing::info!(
        "Starting Tutelage server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Initialize auth service
    let auth_service = Arc::new(auth::AuthService::new(db_pool.clone()));

    // Initialize repositories
    let booking_repo = Arc::new(repository::SqliteBookingRepository::new(db_pool.clone()));
    let account_repo = Arc::new(repository::SqliteAccountRepository::new(db_pool.clone()));

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        booking_repo,
        account_repo,
        auth_service,
        db_pool.clone(),
    ));

    // Payment gateway
    let payment_gateway = Arc::new(payments::StripeGateway::new(
        settings.stripe.secret_key.clone(),
        settings.stripe.webhook_secret.clone(),
    ));

    let app = api::create_app(service_context, payment_gateway, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
