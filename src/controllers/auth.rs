use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::controllers::json_body;
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::User;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/profile", get(profile))
}

// Blank fields are the service's call (conflict on register, unauthorized on login)
#[derive(Debug, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let body = json_body(payload)?;
    let (user, token) = state.auth.register(&body.email, &body.password).await?;
    tracing::info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AuthPayload>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let body = json_body(payload)?;
    let (user, token) = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(AuthResponse { token, user }))
}

// GET /api/profile
async fn profile(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> AppResult<impl IntoResponse> {
    Ok(Json(state.auth.get_user(user.user_id).await?))
}
