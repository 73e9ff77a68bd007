use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    domain::CreateBookingRequest,
    error::{AppError, Result},
    repository::{BookingRepository, CreateOutcome},
};

/// Notification published after every ledger mutation. Subscribers
/// re-run their read query on receipt; the notification itself carries
/// only enough to log.
#[derive(Debug, Clone)]
pub enum LedgerChange {
    BookingCreated { cal_booking_id: String },
    BookingCancelled { cal_booking_id: String },
    BookingDeleted { cal_booking_id: String },
    BookingsPaid { email: String, count: u64 },
}

/// The booking ledger state machine. All mutations funnel through here
/// so every write publishes a change notification.
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    changes: broadcast::Sender<LedgerChange>,
}

impl BookingService {
    pub fn new(repo: Arc<dyn BookingRepository>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self { repo, changes }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerChange> {
        self.changes.subscribe()
    }

    /// Insert a confirmed booking. Applying the same external id twice
    /// is a success no-op.
    pub async fn create(&self, request: CreateBookingRequest) -> Result<CreateOutcome> {
        let cal_booking_id = request.cal_booking_id.clone();
        let outcome = self.repo.create(request).await?;

        match &outcome {
            CreateOutcome::Created(booking) => {
                tracing::info!(
                    "Recorded booking {} ({} min, {})",
                    booking.cal_booking_id,
                    booking.duration_minutes,
                    booking.event_type
                );
                self.notify(LedgerChange::BookingCreated { cal_booking_id });
            }
            CreateOutcome::AlreadyExists => {
                tracing::debug!("Booking {} already exists, skipping", cal_booking_id);
            }
        }

        Ok(outcome)
    }

    pub async fn cancel(&self, cal_booking_id: &str) -> Result<()> {
        if !self.repo.cancel(cal_booking_id).await? {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        tracing::info!("Cancelled booking {}", cal_booking_id);
        self.notify(LedgerChange::BookingCancelled {
            cal_booking_id: cal_booking_id.to_string(),
        });
        Ok(())
    }

    pub async fn delete(&self, cal_booking_id: &str) -> Result<()> {
        if !self.repo.delete(cal_booking_id).await? {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }

        tracing::info!("Deleted booking {}", cal_booking_id);
        self.notify(LedgerChange::BookingDeleted {
            cal_booking_id: cal_booking_id.to_string(),
        });
        Ok(())
    }

    /// A reschedule replaces the superseded booking with a fresh one
    /// under the new external id. The delete tolerates a missing old
    /// record (the provider may reschedule a booking we never saw).
    /// There is no compensation if the create fails after the delete.
    pub async fn reschedule(
        &self,
        old_cal_booking_id: &str,
        replacement: CreateBookingRequest,
    ) -> Result<CreateOutcome> {
        match self.delete(old_cal_booking_id).await {
            Ok(()) => {}
            Err(AppError::NotFound(_)) => {
                tracing::info!(
                    "Reschedule: no existing booking {} to remove",
                    old_cal_booking_id
                );
            }
            Err(e) => return Err(e),
        }

        self.create(replacement).await
    }

    /// Flip every confirmed booking billed to `email` (billing or
    /// organizer address) to paid. Zero matches is a no-op, not an
    /// error.
    pub async fn mark_paid(&self, email: &str) -> Result<u64> {
        let count = self.repo.mark_paid_for_email(email).await?;

        if count > 0 {
            tracing::info!("Marked {} booking(s) paid for {}", count, email);
            self.notify(LedgerChange::BookingsPaid {
                email: email.to_string(),
                count,
            });
        } else {
            tracing::debug!("No confirmed bookings to mark paid for {}", email);
        }

        Ok(count)
    }

    fn notify(&self, change: LedgerChange) {
        // Nobody listening is fine.
        let _ = self.changes.send(change);
    }
}
