// Admin authentication, session, and account endpoints

use crate::admin::{CreateAdmin, SessionContext, SessionSummary, UpdateAdmin};
use crate::api::middleware::{bearer_token, client_ip};
use crate::api::routes::AppState;
use crate::db::schema::AdminUser;
use crate::errors::{AppError, Result};
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use uuid::Uuid;

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAdminRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub is_permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Distinguishes an absent `expires_at` (leave unchanged) from an explicit
/// null (clear the expiry).
fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct UpdateAdminRequest {
    pub password: Option<String>,
    pub status: Option<String>,
    pub is_permanent: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

// ============================================================================
// Authentication & sessions
// ============================================================================

/// POST /v1/admin/login
///
/// The response is the only place the raw session token ever appears.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let success = state
        .admin
        .authenticate(
            req.username.as_deref(),
            req.password.as_deref(),
            &client_ip(&headers),
            user_agent(&headers),
        )
        .await?;

    Ok(Json(json!({
        "token": success.token,
        "admin": success.admin,
        "session": success.session,
    })))
}

/// POST /v1/admin/logout
///
/// Always succeeds, whether or not the token matched a live session.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>> {
    let removed = match bearer_token(&headers) {
        Some(token) => {
            let token = token.to_string();
            state.admin.logout(&token).await?
        }
        None => 0,
    };

    Ok(Json(json!({
        "message": "Logged out",
        "sessions_removed": removed,
    })))
}

/// GET /v1/admin/session
pub async fn introspect(
    Extension(context): Extension<SessionContext>,
) -> Result<Json<SessionContext>> {
    Ok(Json(context))
}

/// GET /v1/admin/sessions
pub async fn list_sessions(State(state): State<AppState>) -> Result<Json<Vec<SessionSummary>>> {
    let sessions = state.admin.list_sessions().await?;
    Ok(Json(sessions))
}

/// DELETE /v1/admin/sessions
///
/// Clears every session, the caller's included.
pub async fn clear_sessions(State(state): State<AppState>) -> Result<Json<Value>> {
    let cleared = state.admin.clear_sessions().await?;
    Ok(Json(json!({ "sessions_cleared": cleared })))
}

// ============================================================================
// Admin accounts
// ============================================================================

/// POST /v1/admin/admins
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<(StatusCode, Json<AdminUser>)> {
    let username = req
        .username
        .ok_or_else(|| AppError::Validation("username is required".to_string()))?;
    let password = req
        .password
        .ok_or_else(|| AppError::Validation("password is required".to_string()))?;

    let admin = state
        .admin
        .create_admin(
            &context.admin,
            CreateAdmin {
                username,
                password,
                is_permanent: req.is_permanent,
                expires_at: req.expires_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(admin)))
}

/// GET /v1/admin/admins
pub async fn list_admins(State(state): State<AppState>) -> Result<Json<Vec<AdminUser>>> {
    let admins = state.admin.list_admins().await?;
    Ok(Json(admins))
}

/// GET /v1/admin/admins/:id
pub async fn get_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUser>> {
    let admin = state.admin.get_admin(id).await?;
    Ok(Json(admin))
}

/// PUT /v1/admin/admins/:id
pub async fn update_admin(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAdminRequest>,
) -> Result<Json<AdminUser>> {
    let admin = state
        .admin
        .update_admin(
            &context.admin,
            id,
            UpdateAdmin {
                password: req.password,
                status: req.status,
                is_permanent: req.is_permanent,
                expires_at: req.expires_at,
            },
        )
        .await?;

    Ok(Json(admin))
}

/// DELETE /v1/admin/admins/:id
pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.admin.delete_admin(&context.admin, id).await?;

    Ok(Json(json!({
        "deleted": true,
        "admin_id": id,
    })))
}
