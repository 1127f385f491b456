use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Booking, BookingRow, BookingStatus, NewBooking};
use crate::repository::BookingRepository;

const BOOKING_COLUMNS: &str =
    "id, user_id, event_id, status, total_price, currency, created_at, updated_at";

#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn seats_for(&self, booking_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<String>>> {
        // COLLATE "C" keeps the order bytewise regardless of the database locale
        let rows = sqlx::query_as::<_, (Uuid, String)>(
            r#"
            SELECT booking_id, seat_label
            FROM booking_seats
            WHERE booking_id = ANY($1)
            ORDER BY seat_label COLLATE "C"
            "#,
        )
        .bind(booking_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut seats: HashMap<Uuid, Vec<String>> = HashMap::with_capacity(booking_ids.len());
        for (booking_id, label) in rows {
            seats.entry(booking_id).or_default().push(label);
        }
        Ok(seats)
    }
}

// Header plus seat rows, on an already-open transaction. The event row is
// share-locked first so it cannot be deleted before commit.
async fn insert_booking(conn: &mut PgConnection, booking: &NewBooking) -> sqlx::Result<BookingRow> {
    sqlx::query_scalar::<_, i32>("SELECT 1 FROM events WHERE id = $1 FOR SHARE")
        .bind(booking.event_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "INSERT INTO bookings (user_id, event_id, status, total_price, currency)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {BOOKING_COLUMNS}"
    ))
    .bind(booking.user_id)
    .bind(booking.event_id)
    .bind(BookingStatus::Active.as_str())
    .bind(booking.total_price)
    .bind(&booking.currency)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        "INSERT INTO booking_seats (booking_id, event_id, seat_label)
         SELECT $1, $2, label FROM UNNEST($3::text[]) AS label",
    )
    .bind(row.id)
    .bind(booking.event_id)
    .bind(&booking.seats)
    .execute(&mut *conn)
    .await?;

    Ok(row)
}

async fn cancel_booking(conn: &mut PgConnection, id: Uuid, user_id: Uuid) -> sqlx::Result<bool> {
    let updated = sqlx::query(
        "UPDATE bookings
         SET status = $3, updated_at = clock_timestamp()
         WHERE id = $1 AND user_id = $2 AND status = $4",
    )
    .bind(id)
    .bind(user_id)
    .bind(BookingStatus::Canceled.as_str())
    .bind(BookingStatus::Active.as_str())
    .execute(&mut *conn)
    .await?;

    if updated.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("UPDATE booking_seats SET active = false WHERE booking_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(true)
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS}
             FROM bookings
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut seats = self.seats_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let labels = seats.remove(&row.id).unwrap_or_default();
                row.into_booking(labels).map_err(AppError::Internal)
            })
            .collect()
    }

    async fn create(&self, booking: NewBooking) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let row = match insert_booking(&mut tx, &booking).await {
            Ok(row) => row,
            Err(e) => {
                // Roll back before reporting so no half-written booking survives
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("failed to roll back booking insert: {:?}", rollback_err);
                }
                debug!(event_id = %booking.event_id, "booking insert rejected: {:?}", e);
                return Err(e.into());
            }
        };

        tx.commit().await?;
        row.into_booking(booking.seats).map_err(AppError::Internal)
    }

    async fn cancel(&self, id: Uuid, user_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        match cancel_booking(&mut tx, id, user_id).await {
            Ok(true) => {
                tx.commit().await?;
                Ok(())
            }
            Ok(false) => {
                tx.rollback().await?;
                Err(AppError::NotFound)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("failed to roll back booking cancel {}: {:?}", id, rollback_err);
                }
                Err(e.into())
            }
        }
    }

    async fn occupied_seats(&self, event_id: Uuid) -> AppResult<Vec<String>> {
        let seats = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT seat_label COLLATE "C" AS seat_label
            FROM booking_seats
            WHERE event_id = $1 AND active
            ORDER BY 1
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seats)
    }
}
