use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod account_repository;
pub mod booking_repository;

pub use account_repository::SqliteAccountRepository;
pub use booking_repository::SqliteBookingRepository;

/// Outcome of an idempotent create. A uniqueness violation on the
/// Cal.com booking id is reported as `AlreadyExists`, never as an error.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Booking),
    AlreadyExists,
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a booking with status `Confirmed`. Duplicate
    /// `cal_booking_id` (including concurrent inserts racing on the
    /// uniqueness constraint) yields `AlreadyExists`.
    async fn create(&self, booking: CreateBookingRequest) -> Result<CreateOutcome>;
    async fn find_by_cal_id(&self, cal_booking_id: &str) -> Result<Option<Booking>>;
    /// Set status to `Cancelled`. Returns false when no row matched.
    async fn cancel(&self, cal_booking_id: &str) -> Result<bool>;
    /// Remove the row entirely. Returns false when no row matched.
    async fn delete(&self, cal_booking_id: &str) -> Result<bool>;
    /// Flip every `Confirmed` booking whose billing or organizer email
    /// matches to `Paid`, as a single conditional update. Returns the
    /// number of rows transitioned.
    async fn mark_paid_for_email(&self, email: &str) -> Result<u64>;
    async fn list_confirmed_for_attendee(&self, email: &str) -> Result<Vec<Booking>>;
    async fn list_confirmed(&self) -> Result<Vec<Booking>>;
}

#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn create(&self, account: CreateAccountRequest) -> Result<Account>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;
}
