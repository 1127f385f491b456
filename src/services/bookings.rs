//! Seat booking: creation, cancellation and the read views built on them.
//!
//! The service validates and prices a request; the repository owns the
//! atomic write and the no-double-booking guarantee.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::BookingConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Booking, NewBooking};
use crate::repository::{BookingRepository, EventRepository};

#[derive(Clone)]
pub struct BookingService {
    repo: Arc<dyn BookingRepository>,
    events: Arc<dyn EventRepository>,
    pricing: BookingConfig,
}

impl BookingService {
    pub fn new(
        repo: Arc<dyn BookingRepository>,
        events: Arc<dyn EventRepository>,
        pricing: BookingConfig,
    ) -> Self {
        Self { repo, events, pricing }
    }

    pub async fn list(&self, user_id: Uuid) -> AppResult<Vec<Booking>> {
        self.repo.list_by_user(user_id).await
    }

    /// Books `seats` on `event_id` for `user_id`.
    ///
    /// An empty request is a `Conflict`, a blank label is `Invalid`, and a
    /// missing event surfaces the event lookup's `NotFound` as is.
    pub async fn create(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: Vec<String>,
    ) -> AppResult<Booking> {
        let seats = normalize_seats(seats)?;

        self.events.get(event_id).await?;

        let booking = NewBooking {
            user_id,
            event_id,
            total_price: total_price(seats.len(), self.pricing.unit_price)?,
            currency: self.pricing.currency.clone(),
            seats,
        };

        let created = self.repo.create(booking).await?;
        info!(
            booking_id = %created.id,
            event_id = %event_id,
            seats = created.seats.len(),
            "booking created"
        );
        Ok(created)
    }

    pub async fn cancel(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        self.repo.cancel(id, user_id).await?;
        info!(booking_id = %id, "booking canceled");
        Ok(())
    }

    /// Labels held by active bookings only.
    pub async fn list_seats_by_event(&self, event_id: Uuid) -> AppResult<Vec<String>> {
        self.repo.occupied_seats(event_id).await
    }
}

/// Turns a raw request into a sorted set of labels.
fn normalize_seats(seats: Vec<String>) -> AppResult<Vec<String>> {
    if seats.is_empty() {
        return Err(AppError::Conflict);
    }
    if seats.iter().any(|seat| seat.trim().is_empty()) {
        return Err(AppError::Invalid);
    }
    let unique: BTreeSet<String> = seats.into_iter().collect();
    Ok(unique.into_iter().collect())
}

fn total_price(seat_count: usize, unit_price: i64) -> AppResult<i64> {
    i64::try_from(seat_count)
        .ok()
        .and_then(|count| count.checked_mul(unit_price))
        .ok_or(AppError::Invalid)
}
