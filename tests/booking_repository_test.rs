use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use tutelage::{
    domain::{BookingStatus, CreateBookingRequest},
    repository::{BookingRepository, CreateOutcome, SqliteBookingRepository},
};

async fn test_pool() -> anyhow::Result<SqlitePool> {
    // One connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

fn booking_request(cal_id: &str, attendee: &str, duration: i64, event_type: &str) -> CreateBookingRequest {
    CreateBookingRequest {
        cal_booking_id: cal_id.to_string(),
        start_time: Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap(),
        duration_minutes: duration,
        event_type: event_type.to_string(),
        organizer_name: "Pat Tutor".to_string(),
        organizer_email: "pat@tutelage.test".to_string(),
        organizer_timezone: Some("America/New_York".to_string()),
        attendee_name: "Ana Attendee".to_string(),
        attendee_email: attendee.to_string(),
        attendee_timezone: Some("America/Chicago".to_string()),
        billing_email: None,
    }
}

#[tokio::test]
async fn test_create_is_idempotent() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool);

    let first = repo.create(booking_request("abc", "a@x.com", 60, "Regular Tutoring")).await?;
    assert!(matches!(first, CreateOutcome::Created(_)));

    // Same external id again: success, no second row
    let second = repo.create(booking_request("abc", "a@x.com", 90, "Regular Tutoring")).await?;
    assert!(matches!(second, CreateOutcome::AlreadyExists));

    let stored = repo.find_by_cal_id("abc").await?.expect("booking should exist");
    assert_eq!(stored.duration_minutes, 60);
    assert_eq!(stored.status, BookingStatus::Confirmed);
    // Billing email defaults to the attendee
    assert_eq!(stored.billing_email, "a@x.com");

    Ok(())
}

#[tokio::test]
async fn test_cancel_and_delete_report_missing_bookings() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool);

    assert!(!repo.cancel("ghost").await?);
    assert!(!repo.delete("ghost").await?);

    repo.create(booking_request("b1", "a@x.com", 60, "Regular Tutoring")).await?;

    assert!(repo.cancel("b1").await?);
    let cancelled = repo.find_by_cal_id("b1").await?.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    assert!(repo.delete("b1").await?);
    assert!(repo.find_by_cal_id("b1").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn test_mark_paid_targets_confirmed_rows_only() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool);

    repo.create(booking_request("p1", "a@x.com", 60, "Regular Tutoring")).await?;
    repo.create(booking_request("p2", "a@x.com", 90, "Regular Tutoring")).await?;
    repo.create(booking_request("p3", "b@x.com", 60, "Regular Tutoring")).await?;
    repo.create(booking_request("p4", "a@x.com", 120, "Regular Tutoring")).await?;
    repo.cancel("p4").await?;

    let updated = repo.mark_paid_for_email("a@x.com").await?;
    assert_eq!(updated, 2);

    assert_eq!(repo.find_by_cal_id("p1").await?.unwrap().status, BookingStatus::Paid);
    assert_eq!(repo.find_by_cal_id("p2").await?.unwrap().status, BookingStatus::Paid);
    // Someone else's booking and the cancelled one are untouched
    assert_eq!(repo.find_by_cal_id("p3").await?.unwrap().status, BookingStatus::Confirmed);
    assert_eq!(repo.find_by_cal_id("p4").await?.unwrap().status, BookingStatus::Cancelled);

    // Re-applying the same payment event changes nothing
    let again = repo.mark_paid_for_email("a@x.com").await?;
    assert_eq!(again, 0);

    Ok(())
}

#[tokio::test]
async fn test_mark_paid_matches_organizer_email_too() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool);

    repo.create(booking_request("q1", "kid@x.com", 60, "Regular Tutoring")).await?;

    // The organizer settles the bill rather than the attendee
    let updated = repo.mark_paid_for_email("pat@tutelage.test").await?;
    assert_eq!(updated, 1);
    assert_eq!(repo.find_by_cal_id("q1").await?.unwrap().status, BookingStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn test_confirmed_listings_exclude_other_statuses() -> anyhow::Result<()> {
    let pool = test_pool().await?;
    let repo = SqliteBookingRepository::new(pool);

    repo.create(booking_request("l1", "a@x.com", 60, "Regular Tutoring")).await?;
    repo.create(booking_request("l2", "a@x.com", 90, "SAT Prep")).await?;
    repo.create(booking_request("l3", "a@x.com", 60, "Regular Tutoring")).await?;
    repo.cancel("l3").await?;

    let confirmed = repo.list_confirmed_for_attendee("a@x.com").await?;
    assert_eq!(confirmed.len(), 2);

    repo.mark_paid_for_email("a@x.com").await?;
    let after_payment = repo.list_confirmed_for_attendee("a@x.com").await?;
    assert!(after_payment.is_empty());

    Ok(())
}
