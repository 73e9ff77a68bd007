use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStatus, CreateBookingRequest},
    error::{AppError, Result},
    repository::{BookingRepository, CreateOutcome},
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    cal_booking_id: String,
    start_time: NaiveDateTime,
    duration_minutes: i64,
    event_type: String,
    organizer_name: String,
    organizer_email: String,
    organizer_timezone: Option<String>,
    attendee_name: String,
    attendee_email: String,
    attendee_timezone: Option<String>,
    billing_email: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            cal_booking_id: row.cal_booking_id,
            start_time: DateTime::from_naive_utc_and_offset(row.start_time, Utc),
            duration_minutes: row.duration_minutes,
            event_type: row.event_type,
            organizer_name: row.organizer_name,
            organizer_email: row.organizer_email,
            organizer_timezone: row.organizer_timezone,
            attendee_name: row.attendee_name,
            attendee_email: row.attendee_email,
            attendee_timezone: row.attendee_timezone,
            billing_email: row.billing_email,
            status: Self::parse_status(&row.status)?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_status(s: &str) -> Result<BookingStatus> {
        match s {
            "Confirmed" => Ok(BookingStatus::Confirmed),
            "Cancelled" => Ok(BookingStatus::Cancelled),
            "Paid" => Ok(BookingStatus::Paid),
            _ => Err(AppError::Database(format!("Invalid booking status: {}", s))),
        }
    }

    fn status_to_str(status: &BookingStatus) -> &'static str {
        match status {
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Paid => "Paid",
        }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: CreateBookingRequest) -> Result<CreateOutcome> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let billing_email = booking
            .billing_email
            .clone()
            .unwrap_or_else(|| booking.attendee_email.clone());
        let start_naive = booking.start_time.naive_utc();
        let now = Utc::now().naive_utc();

        // ON CONFLICT DO NOTHING makes a duplicate id (including two
        // webhook deliveries racing on the insert) indistinguishable
        // from an ordinary already-exists no-op.
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                id, cal_booking_id, start_time, duration_minutes, event_type,
                organizer_name, organizer_email, organizer_timezone,
                attendee_name, attendee_email, attendee_timezone,
                billing_email, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(cal_booking_id) DO NOTHING
            "#,
        )
        .bind(&id_str)
        .bind(&booking.cal_booking_id)
        .bind(start_naive)
        .bind(booking.duration_minutes)
        .bind(&booking.event_type)
        .bind(&booking.organizer_name)
        .bind(&booking.organizer_email)
        .bind(&booking.organizer_timezone)
        .bind(&booking.attendee_name)
        .bind(&booking.attendee_email)
        .bind(&booking.attendee_timezone)
        .bind(&billing_email)
        .bind(Self::status_to_str(&BookingStatus::Confirmed))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(CreateOutcome::AlreadyExists);
        }

        let created = self.find_by_cal_id(&booking.cal_booking_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created booking".to_string())
        })?;

        Ok(CreateOutcome::Created(created))
    }

    async fn find_by_cal_id(&self, cal_booking_id: &str) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, cal_booking_id, start_time, duration_minutes, event_type,
                   organizer_name, organizer_email, organizer_timezone,
                   attendee_name, attendee_email, attendee_timezone,
                   billing_email, status, created_at, updated_at
            FROM bookings
            WHERE cal_booking_id = ?
            "#,
        )
        .bind(cal_booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn cancel(&self, cal_booking_id: &str) -> Result<bool> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, updated_at = ?
            WHERE cal_booking_id = ?
            "#,
        )
        .bind(Self::status_to_str(&BookingStatus::Cancelled))
        .bind(now)
        .bind(cal_booking_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, cal_booking_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE cal_booking_id = ?")
            .bind(cal_booking_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_paid_for_email(&self, email: &str) -> Result<u64> {
        let now = Utc::now().naive_utc();

        // Single conditional update: the status check and the write are
        // one statement, so racing payment confirmations for the same
        // email cannot double-transition a row.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?, updated_at = ?
            WHERE status = ? AND (billing_email = ? OR organizer_email = ?)
            "#,
        )
        .bind(Self::status_to_str(&BookingStatus::Paid))
        .bind(now)
        .bind(Self::status_to_str(&BookingStatus::Confirmed))
        .bind(email)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }

    async fn list_confirmed_for_attendee(&self, email: &str) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, cal_booking_id, start_time, duration_minutes, event_type,
                   organizer_name, organizer_email, organizer_timezone,
                   attendee_name, attendee_email, attendee_timezone,
                   billing_email, status, created_at, updated_at
            FROM bookings
            WHERE attendee_email = ? AND status = ?
            ORDER BY start_time ASC
            "#,
        )
        .bind(email)
        .bind(Self::status_to_str(&BookingStatus::Confirmed))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn list_confirmed(&self) -> Result<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, cal_booking_id, start_time, duration_minutes, event_type,
                   organizer_name, organizer_email, organizer_timezone,
                   attendee_name, attendee_email, attendee_timezone,
                   billing_email, status, created_at, updated_at
            FROM bookings
            WHERE status = ?
            ORDER BY start_time ASC
            "#,
        )
        .bind(Self::status_to_str(&BookingStatus::Confirmed))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }
}
