// Access key endpoints

use crate::admin::SessionContext;
use crate::api::middleware::client_ip;
use crate::api::routes::AppState;
use crate::errors::{AppError, Result};
use crate::keys::{CreatedKey, KeyReport};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub user_id: Option<String>,
    pub hours: Option<i64>,
}

/// POST /v1/keys
///
/// Self-service key creation.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<CreatedKey>)> {
    let user_id = req
        .user_id
        .as_deref()
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;

    let created = state
        .keys
        .create(user_id, req.hours, Some(client_ip(&headers)), None)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /v1/admin/keys
///
/// Key creation through the authenticated admin path; records the issuer.
pub async fn create_issued(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    headers: HeaderMap,
    Json(req): Json<CreateKeyRequest>,
) -> Result<(StatusCode, Json<CreatedKey>)> {
    let user_id = req
        .user_id
        .as_deref()
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;

    let created = state
        .keys
        .create(
            user_id,
            req.hours,
            Some(client_ip(&headers)),
            Some(context.admin.id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /v1/keys/:id/validate
///
/// Validity check that counts the use when the key is valid. An expired key
/// is reported with code 410 in the body, not as an HTTP error.
pub async fn validate(
    State(state): State<AppState>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<KeyReport>> {
    let report = state.keys.validate(key_id).await?;
    Ok(Json(report))
}

/// GET /v1/keys/:id
///
/// Inspection without the usage side effect.
pub async fn info(
    State(state): State<AppState>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<KeyReport>> {
    let report = state.keys.info(key_id).await?;
    Ok(Json(report))
}

/// GET /v1/users/:user_id/keys
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<KeyReport>>> {
    let reports = state.keys.list_for_user(&user_id).await?;
    Ok(Json(reports))
}

/// DELETE /v1/admin/keys/:id
pub async fn remove(
    State(state): State<AppState>,
    Extension(context): Extension<SessionContext>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<Value>> {
    state.keys.delete(key_id).await?;

    tracing::info!("Access key {} deleted by {}", key_id, context.admin.username);

    Ok(Json(json!({
        "deleted": true,
        "key_id": key_id,
    })))
}
