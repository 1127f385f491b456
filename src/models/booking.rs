use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Canceled,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BookingStatus::Active),
            "canceled" => Ok(BookingStatus::Canceled),
            other => Err(anyhow::anyhow!("unknown booking status {other:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: BookingStatus,
    /// Minor currency units.
    pub total_price: i64,
    pub currency: String,
    /// Sorted, unique within the booking.
    pub seats: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A priced booking ready to be persisted. `seats` is already
/// deduplicated and sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub total_price: i64,
    pub currency: String,
    pub seats: Vec<String>,
}

// Header row as stored; seats live in booking_seats
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub status: String,
    pub total_price: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingRow {
    pub fn into_booking(self, seats: Vec<String>) -> anyhow::Result<Booking> {
        Ok(Booking {
            id: self.id,
            user_id: self.user_id,
            event_id: self.event_id,
            status: self.status.parse()?,
            total_price: self.total_price,
            currency: self.currency,
            seats,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
