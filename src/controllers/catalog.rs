//! Venues and categories.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::controllers::{not_blank, parse_id, valid_body, Items};
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::VenueInput;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/venues", get(list_venues).post(create_venue))
        .route(
            "/venues/{id}",
            get(get_venue).put(update_venue).delete(delete_venue),
        )
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VenuePayload {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub address: String,
}

impl From<VenuePayload> for VenueInput {
    fn from(payload: VenuePayload) -> Self {
        VenueInput {
            name: payload.name,
            address: payload.address,
        }
    }
}

/* ---------- VENUES ---------- */

async fn list_venues(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    Ok(Json(Items::from(state.venues.list().await?)))
}

async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.venues.get(parse_id(&id)?).await?))
}

async fn create_venue(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    payload: Result<Json<VenuePayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let venue = state.venues.create(valid_body(payload)?.into()).await?;
    tracing::info!(venue_id = %venue.id, "venue created");
    Ok((StatusCode::CREATED, Json(venue)))
}

async fn update_venue(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<VenuePayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let venue = state.venues.update(id, valid_body(payload)?.into()).await?;
    Ok(Json(venue))
}

async fn delete_venue(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.venues.delete(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* ---------- CATEGORIES ---------- */

async fn list_categories(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    Ok(Json(Items::from(state.categories.list().await?)))
}

async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.categories.get(parse_id(&id)?).await?))
}
