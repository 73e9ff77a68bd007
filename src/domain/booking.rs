use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tutoring session as recorded in the ledger, correlated to the
/// Cal.com booking that created it via `cal_booking_id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub cal_booking_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub event_type: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub organizer_timezone: Option<String>,
    pub attendee_name: String,
    pub attendee_email: String,
    pub attendee_timezone: Option<String>,
    /// The email billed for this session. Usually the attendee, but a
    /// parent or other account holder may be billed instead.
    pub billing_email: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Only `Confirmed` bookings count toward amounts owed. `Paid` is
/// reached from `Confirmed` exclusively; cancelled bookings never
/// become paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub cal_booking_id: String,
    pub start_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub event_type: String,
    pub organizer_name: String,
    pub organizer_email: String,
    pub organizer_timezone: Option<String>,
    pub attendee_name: String,
    pub attendee_email: String,
    pub attendee_timezone: Option<String>,
    /// Defaults to the attendee email when absent.
    pub billing_email: Option<String>,
}
