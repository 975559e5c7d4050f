/// Authentication endpoints
///
/// - `POST /v1/auth/register` - Create an account
/// - `POST /v1/auth/login` - Exchange credentials for a session token
/// - `POST /v1/auth/logout` - Revoke the presented session token
/// - `GET /v1/auth/me` - The caller's profile

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::auth::{bearer_token, AuthContext},
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasktracker_shared::models::user::User;
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Strength rules are enforced by the account service
    #[validate(length(max = 1024, message = "Password must be at most 1024 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
}

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,

    /// Opaque session token for `Authorization: Bearer`
    pub token: String,

    pub token_type: String,

    pub expires_at: DateTime<Utc>,
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth/register
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.com",
///   "password": "Corr3ct!Horse",
///   "name": "Ada Lovelace"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Email already registered (case-insensitive)
/// - `422 Unprocessable Entity`: Malformed input or weak password
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    req.validate()?;

    let user_id = state
        .accounts
        .register(&req.email, &req.password, &req.name)
        .await?;

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id })))
}

/// Login endpoint
///
/// Unknown email and wrong password produce the same
/// `401 Unauthorized` response.
///
/// # Response
///
/// ```json
/// {
///   "user_id": "uuid",
///   "token": "tts_...",
///   "token_type": "Bearer",
///   "expires_at": "2025-01-02T10:00:00Z"
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state
        .accounts
        .authenticate(&req.email, &req.password)
        .await?;

    Ok(Json(LoginResponse {
        user_id: session.user_id,
        token: session.token,
        token_type: "Bearer".to_string(),
        expires_at: session.expires_at,
    }))
}

/// Logout endpoint
///
/// Always `204 No Content` once a bearer token is presented, including
/// for tokens that are already revoked or expired.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<StatusCode> {
    let token = bearer_token(&headers)?;
    state.accounts.logout(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<User>> {
    let user = state.accounts.profile(auth.user_id).await.map_err(|err| match err {
        // Session outlived its account
        tasktracker_shared::error::CoreError::NotFound => {
            ApiError::Unauthorized("Invalid or expired session".to_string())
        }
        other => other.into(),
    })?;

    Ok(Json(user))
}
