use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::controllers::{not_blank, parse_id, valid_body, Items};
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::EventInput;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).put(update_event).delete(delete_event),
        )
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub description: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub venue_id: Uuid,
    #[serde(default)]
    pub published: bool,
}

impl From<EventPayload> for EventInput {
    fn from(payload: EventPayload) -> Self {
        EventInput {
            title: payload.title,
            description: payload.description,
            start_at: payload.start_at,
            end_at: payload.end_at,
            venue_id: payload.venue_id,
            published: payload.published,
        }
    }
}

// GET /api/events
async fn list_events(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let events = state.events.list().await?;
    Ok(Json(Items::from(events)))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let event = state.events.get(parse_id(&id)?).await?;
    Ok(Json(event))
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let input = valid_body(payload)?.into();
    let event = state.events.create(input).await?;
    tracing::info!(event_id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

// PUT /api/events/{id}
async fn update_event(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<EventPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let input = valid_body(payload)?.into();
    let event = state.events.update(id, input).await?;
    Ok(Json(event))
}

// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.events.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
