use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::extract::{AdminUser, CurrentUser};
use crate::auth::password;
use crate::auth::session::issue_token;
use crate::errors::AppError;
use crate::models::user::{Role, User};
use crate::response::{ok, ApiResponse};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/auth/login
///
/// Both an unknown email and a wrong password answer with the same generic
/// 401, so the response never discloses which part was wrong.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    let mut v = Validator::new();
    let email = v.require("email", req.email.as_deref());
    let plain = v.require("password", req.password.as_deref());
    v.finish()?;
    let (email, plain) = (email.unwrap(), plain.unwrap());

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    let user = user.ok_or(AppError::InvalidCredentials)?;

    if !password::verify(&plain, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = issue_token(user.id, user.role, &state.config.jwt_secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("token signing failed: {e}")))?;

    Ok(ok(LoginResponse { token, user }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(session.user_id)
        .fetch_optional(&state.db)
        .await?;
    // token outlived its account
    let user = user.ok_or(AppError::Unauthorized)?;
    Ok(ok(user))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// POST /api/auth/users — admin creates another account.
pub async fn handle_create_user(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let mut v = Validator::new();
    let email = v.require("email", req.email.as_deref());
    v.email("email", email.as_deref());
    let plain = v.require("password", req.password.as_deref());
    if let Some(p) = plain.as_deref() {
        if p.chars().count() < 8 {
            v.push("password", "password must be at least 8 characters");
        }
    }
    let role: Option<Role> = v.parse_enum("role", req.role.as_deref().or(Some("user")));
    v.finish()?;

    let hash = password::hash(&plain.unwrap())?;
    let user: User = sqlx::query_as(
        "INSERT INTO users (email, password_hash, role) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(email.unwrap())
    .bind(&hash)
    .bind(role.unwrap())
    .fetch_one(&state.db)
    .await
    .map_err(|e| AppError::from_insert(e, "user"))?;

    Ok(ok(user))
}
