pub mod billing_service;
pub mod booking_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::AuthService;
use crate::repository::*;

pub use billing_service::{AmountOwed, BillingService, TuteeBalance};
pub use booking_service::{BookingService, LedgerChange};

pub struct ServiceContext {
    pub booking_repo: Arc<dyn BookingRepository>,
    pub account_repo: Arc<dyn AccountRepository>,
    pub booking_service: Arc<BookingService>,
    pub billing_service: Arc<BillingService>,
    pub auth_service: Arc<AuthService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        account_repo: Arc<dyn AccountRepository>,
        auth_service: Arc<AuthService>,
        db_pool: SqlitePool,
    ) -> Self {
        let booking_service = Arc::new(BookingService::new(booking_repo.clone()));
        let billing_service = Arc::new(BillingService::new(booking_repo.clone()));

        Self {
            booking_repo,
            account_repo,
            booking_service,
            billing_service,
            auth_service,
            db_pool,
        }
    }
}
