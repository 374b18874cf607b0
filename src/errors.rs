use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::keys::remaining::TimeRemaining;

/// Data about the already-active key returned with a duplicate-key conflict.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ActiveKeyConflict {
    pub key_id: uuid::Uuid,
    pub user_id: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
    pub time_remaining: TimeRemaining,
}

/// Application-wide error type
#[derive(Debug)]
pub enum AppError {
    // Store errors
    Database(sqlx::Error),
    DatabaseMigration(sqlx::migrate::MigrateError),
    Redis(redis::RedisError),
    StoreUnavailable,

    // Key lifecycle errors
    KeyNotFound,
    DuplicateActiveKey(Box<ActiveKeyConflict>),
    Conflict(String),

    // Admin account errors
    AdminNotFound,
    UsernameTaken,
    PermanentAdminProtected,
    SelfActionForbidden,

    // Authentication errors
    Unauthorized,
    RateLimited { retry_after_seconds: u64 },

    // Validation errors
    Validation(String),

    // Configuration errors
    Configuration(String),

    // Internal errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::DatabaseMigration(e) => write!(f, "Database migration error: {}", e),
            AppError::Redis(e) => write!(f, "Redis error: {}", e),
            AppError::StoreUnavailable => write!(f, "Store unavailable"),
            AppError::KeyNotFound => write!(f, "Access key not found"),
            AppError::DuplicateActiveKey(conflict) => write!(
                f,
                "User {} already has an active key ({})",
                conflict.user_id, conflict.key_id
            ),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::AdminNotFound => write!(f, "Admin not found"),
            AppError::UsernameTaken => write!(f, "Username already taken"),
            AppError::PermanentAdminProtected => {
                write!(f, "Permanent admin accounts cannot be modified this way")
            }
            AppError::SelfActionForbidden => {
                write!(f, "Admins cannot disable or delete their own account")
            }
            AppError::Unauthorized => write!(f, "Unauthorized"),
            AppError::RateLimited { .. } => write!(f, "Too many login attempts"),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Convert from various error types
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseMigration(err)
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err)
    }
}

// Implement IntoResponse for Axum
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, mut body) = match &self {
            AppError::Database(_) | AppError::DatabaseMigration(_) => {
                tracing::error!("Database error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::Redis(_) => {
                tracing::error!("Redis error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::StoreUnavailable => {
                tracing::error!("Store call exceeded its deadline");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Store unavailable, retry later" }),
                )
            }
            AppError::KeyNotFound => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Access key not found" }),
            ),
            AppError::DuplicateActiveKey(conflict) => (
                StatusCode::CONFLICT,
                json!({
                    "error": "User already has an active key",
                    "existing_key": conflict,
                }),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::AdminNotFound => {
                (StatusCode::NOT_FOUND, json!({ "error": "Admin not found" }))
            }
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                json!({ "error": "Username already taken" }),
            ),
            AppError::PermanentAdminProtected => (
                StatusCode::CONFLICT,
                json!({ "error": "Permanent admin accounts cannot be modified this way" }),
            ),
            AppError::SelfActionForbidden => (
                StatusCode::CONFLICT,
                json!({ "error": "Admins cannot disable or delete their own account" }),
            ),
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" }))
            }
            AppError::RateLimited {
                retry_after_seconds,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Too many login attempts",
                    "retry_after_seconds": retry_after_seconds,
                }),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Configuration(_) => {
                tracing::error!("Configuration error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
            AppError::Internal(_) => {
                tracing::error!("Internal error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        if let Some(obj) = body.as_object_mut() {
            obj.insert("status".to_string(), json!(status.as_u16()));
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;
