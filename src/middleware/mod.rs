use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// The caller of a protected route, resolved from its session token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
}

// Bearer token first, then the custom header
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.split_once(' ')?;
            scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
        })
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get(AUTH_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|token| !token.is_empty())
    })
}

impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        let user_id = state.auth.validate_token(token)?;
        Ok(AuthUser { user_id })
    }
}
