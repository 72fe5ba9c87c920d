use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::auth::session::{verify_token, Session};
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

/// Extractor for any authenticated caller. Missing, malformed or expired
/// credentials all reject with 401.
pub struct CurrentUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header.strip_prefix("Bearer ").ok_or(AppError::Unauthorized)?;
        let session = verify_token(token, &state.config.jwt_secret).ok_or(AppError::Unauthorized)?;
        Ok(CurrentUser(session))
    }
}

/// Extractor for admin-only routes: authenticated and `role = admin`,
/// otherwise 403 (or 401 when there is no valid session at all).
pub struct AdminUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(session) = CurrentUser::from_request_parts(parts, state).await?;
        if session.role != Role::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(session))
    }
}
