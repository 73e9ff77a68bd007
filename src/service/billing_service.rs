use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::{
    domain::pricing,
    error::Result,
    repository::BookingRepository,
};

/// What a single tutee owes across their confirmed bookings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountOwed {
    pub total_owed: f64,
    pub booking_count: usize,
}

/// One row of the operator summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TuteeBalance {
    pub email: String,
    pub name: String,
    pub total_owed: f64,
    pub booking_count: usize,
}

/// Read side of the ledger. Only `Confirmed` bookings are priced: paid
/// and cancelled sessions stop counting toward what is owed.
pub struct BillingService {
    repo: Arc<dyn BookingRepository>,
}

impl BillingService {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        Self { repo }
    }

    pub async fn amount_owed_for_user(&self, email: &str) -> Result<AmountOwed> {
        let bookings = self.repo.list_confirmed_for_attendee(email).await?;

        let total_owed = bookings
            .iter()
            .map(|b| pricing::price(b.duration_minutes, &b.event_type))
            .sum();

        Ok(AmountOwed {
            total_owed,
            booking_count: bookings.len(),
        })
    }

    /// All tutees with confirmed bookings, grouped by attendee email and
    /// sorted by amount owed, largest first.
    pub async fn amount_owed_for_all_users(&self) -> Result<Vec<TuteeBalance>> {
        let bookings = self.repo.list_confirmed().await?;

        let mut by_email: HashMap<String, TuteeBalance> = HashMap::new();
        for booking in bookings {
            let entry = by_email
                .entry(booking.attendee_email.clone())
                .or_insert_with(|| TuteeBalance {
                    email: booking.attendee_email.clone(),
                    name: display_name(&booking.attendee_name, &booking.attendee_email),
                    total_owed: 0.0,
                    booking_count: 0,
                });
            entry.booking_count += 1;
            entry.total_owed += pricing::price(booking.duration_minutes, &booking.event_type);
        }

        let mut balances: Vec<TuteeBalance> = by_email.into_values().collect();
        balances.sort_by(|a, b| {
            b.total_owed
                .partial_cmp(&a.total_owed)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Ok(balances)
    }
}

fn display_name(attendee_name: &str, email: &str) -> String {
    if attendee_name.trim().is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        attendee_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{Booking, BookingStatus, CreateBookingRequest};
    use crate::repository::CreateOutcome;

    struct StubBookingRepository {
        bookings: Mutex<Vec<Booking>>,
    }

    impl StubBookingRepository {
        fn with_bookings(bookings: Vec<Booking>) -> Self {
            Self {
                bookings: Mutex::new(bookings),
            }
        }
    }

    #[async_trait]
    impl BookingRepository for StubBookingRepository {
        async fn create(&self, _booking: CreateBookingRequest) -> Result<CreateOutcome> {
            unimplemented!("read-only stub")
        }

        async fn find_by_cal_id(&self, cal_booking_id: &str) -> Result<Option<Booking>> {
            let bookings = self.bookings.lock().unwrap();
            Ok(bookings.iter().find(|b| b.cal_booking_id == cal_booking_id).cloned())
        }

        async fn cancel(&self, _cal_booking_id: &str) -> Result<bool> {
            unimplemented!("read-only stub")
        }

        async fn delete(&self, _cal_booking_id: &str) -> Result<bool> {
            unimplemented!("read-only stub")
        }

        async fn mark_paid_for_email(&self, email: &str) -> Result<u64> {
            let mut bookings = self.bookings.lock().unwrap();
            let mut count = 0;
            for b in bookings.iter_mut() {
                if b.status == BookingStatus::Confirmed
                    && (b.billing_email == email || b.organizer_email == email)
                {
                    b.status = BookingStatus::Paid;
                    count += 1;
                }
            }
            Ok(count)
        }

        async fn list_confirmed_for_attendee(&self, email: &str) -> Result<Vec<Booking>> {
            let bookings = self.bookings.lock().unwrap();
            Ok(bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Confirmed && b.attendee_email == email)
                .cloned()
                .collect())
        }

        async fn list_confirmed(&self) -> Result<Vec<Booking>> {
            let bookings = self.bookings.lock().unwrap();
            Ok(bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Confirmed)
                .cloned()
                .collect())
        }
    }

    fn booking(
        cal_id: &str,
        attendee: &str,
        duration: i64,
        event_type: &str,
        status: BookingStatus,
    ) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            cal_booking_id: cal_id.to_string(),
            start_time: now,
            duration_minutes: duration,
            event_type: event_type.to_string(),
            organizer_name: "Pat Tutor".to_string(),
            organizer_email: "pat@tutelage.test".to_string(),
            organizer_timezone: None,
            attendee_name: "".to_string(),
            attendee_email: attendee.to_string(),
            attendee_timezone: None,
            billing_email: attendee.to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn sums_confirmed_bookings_for_one_attendee() {
        let repo = Arc::new(StubBookingRepository::with_bookings(vec![
            booking("abc", "a@x.com", 60, "Regular Tutoring", BookingStatus::Confirmed),
        ]));
        let service = BillingService::new(repo);

        let owed = service.amount_owed_for_user("a@x.com").await.unwrap();
        assert_eq!(owed, AmountOwed { total_owed: 30.0, booking_count: 1 });
    }

    #[tokio::test]
    async fn excludes_paid_and_cancelled_bookings() {
        let repo = Arc::new(StubBookingRepository::with_bookings(vec![
            booking("b1", "a@x.com", 60, "Regular Tutoring", BookingStatus::Confirmed),
            booking("b2", "a@x.com", 90, "Regular Tutoring", BookingStatus::Paid),
            booking("b3", "a@x.com", 120, "Regular Tutoring", BookingStatus::Cancelled),
        ]));
        let service = BillingService::new(repo);

        let owed = service.amount_owed_for_user("a@x.com").await.unwrap();
        assert_eq!(owed, AmountOwed { total_owed: 30.0, booking_count: 1 });
    }

    #[tokio::test]
    async fn owed_drops_to_zero_once_everything_is_paid() {
        let repo = Arc::new(StubBookingRepository::with_bookings(vec![
            booking("b1", "a@x.com", 60, "Regular Tutoring", BookingStatus::Confirmed),
            booking("b2", "a@x.com", 90, "Regular Tutoring", BookingStatus::Confirmed),
        ]));
        let service = BillingService::new(repo.clone());

        let before = service.amount_owed_for_user("a@x.com").await.unwrap();
        assert_eq!(before, AmountOwed { total_owed: 75.0, booking_count: 2 });

        let updated = repo.mark_paid_for_email("a@x.com").await.unwrap();
        assert_eq!(updated, 2);

        let after = service.amount_owed_for_user("a@x.com").await.unwrap();
        assert_eq!(after, AmountOwed { total_owed: 0.0, booking_count: 0 });
    }

    #[tokio::test]
    async fn summary_groups_by_attendee_and_sorts_descending() {
        let repo = Arc::new(StubBookingRepository::with_bookings(vec![
            booking("c1", "a@x.com", 60, "Regular Tutoring", BookingStatus::Confirmed),
            booking("c2", "b@x.com", 60, "SAT Prep", BookingStatus::Confirmed),
            booking("c3", "b@x.com", 90, "Regular Tutoring", BookingStatus::Confirmed),
            booking("c4", "c@x.com", 60, "Regular Tutoring", BookingStatus::Cancelled),
        ]));
        let service = BillingService::new(repo);

        let balances = service.amount_owed_for_all_users().await.unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[0].email, "b@x.com");
        assert_eq!(balances[0].total_owed, 80.0);
        assert_eq!(balances[0].booking_count, 2);
        assert_eq!(balances[1].email, "a@x.com");
        assert_eq!(balances[1].total_owed, 30.0);
    }

    #[tokio::test]
    async fn summary_falls_back_to_email_local_part_for_names() {
        let repo = Arc::new(StubBookingRepository::with_bookings(vec![
            booking("d1", "jordan@x.com", 60, "Regular Tutoring", BookingStatus::Confirmed),
        ]));
        let service = BillingService::new(repo);

        let balances = service.amount_owed_for_all_users().await.unwrap();
        assert_eq!(balances[0].name, "jordan");
    }
}
