use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::controllers::{json_body, parse_id, Items};
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", delete(cancel_booking))
        .route("/events/{id}/occupied-seats", get(occupied_seats))
}

/* ---------- BOOKINGS ---------- */

// A missing seat list is an empty request, which the allocator rejects
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
    #[serde(default)]
    pub seats: Vec<String>,
}

// GET /api/bookings
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let bookings = state.bookings.list(user.user_id).await?;
    Ok(Json(Items::from(bookings)))
}

// POST /api/bookings
async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let booking = state
        .bookings
        .create(user.user_id, req.event_id, req.seats)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

// DELETE /api/bookings/{id}
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.bookings.cancel(parse_id(&id)?, user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- SEATS ---------- */

// GET /api/events/{id}/occupied-seats
async fn occupied_seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let seats = state.bookings.list_seats_by_event(parse_id(&id)?).await?;
    Ok(Json(Items::from(seats)))
}
