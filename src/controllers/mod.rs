pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod events;

use axum::{
    extract::rejection::JsonRejection,
    http::{header::HeaderName, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use std::any::Any as PanicPayload;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::AUTH_TOKEN_HEADER;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(catalog::routes())
        .merge(auth::routes())
        .merge(bookings::routes())
}

/// The complete application: health check, `/api` routes and the HTTP
/// layers.
pub fn router(state: Arc<AppState>) -> Router {
    let request_timeout = state.config.app.request_timeout;
    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", routes())
        .with_state(state);
    with_layers(app, request_timeout)
}

// A panicking handler fails its own request with a 500
fn with_layers(app: Router, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(AUTH_TOKEN_HEADER),
        ]);

    app.layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// List responses are wrapped as `{"items": [...]}`.
#[derive(Debug, Serialize)]
pub struct Items<T> {
    pub items: Vec<T>,
}

impl<T> From<Vec<T>> for Items<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

pub(crate) fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("invalid id"))
}

/// Unwraps a JSON body; a malformed one is a plain "invalid payload".
pub(crate) fn json_body<T: DeserializeOwned>(
    payload: Result<Json<T>, JsonRejection>,
) -> AppResult<T> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!("rejected body: {}", rejection.body_text());
        AppError::BadRequest("invalid payload")
    })?;
    Ok(body)
}

/// [`json_body`] plus field validation, failing the same way.
pub(crate) fn valid_body<T: DeserializeOwned + Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> AppResult<T> {
    let body = json_body(payload)?;
    body.validate()
        .map_err(|_| AppError::BadRequest("invalid payload"))?;
    Ok(body)
}

pub(crate) fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("blank"));
    }
    Ok(())
}
