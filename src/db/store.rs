// The narrow persistence interface the engines talk to.
//
// The engines never see a connection pool; they see this trait plus a
// per-call deadline. Check-then-act sequences in the engines are not atomic,
// so the store-level uniqueness rules (one ACTIVE key per user, unique
// session token hash, case-insensitive unique username) are the enforcement
// point and implementations surface violations as typed conflicts.

use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use crate::db::schema::{AccessKey, AdminSession, AdminUser};

/// Insert payload for an access key. The engine picks the id and timestamps;
/// the store sets status ACTIVE and a zero usage count.
#[derive(Debug, Clone)]
pub struct NewAccessKey {
    pub key_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub created_by: Option<Uuid>,
}

/// Insert payload for an admin account. The store owns id generation.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub username: String,
    pub password_hash: String,
    pub status: String,
    pub is_permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an admin session. The store owns id generation and
/// initializes `last_seen_at` to `created_at`.
#[derive(Debug, Clone)]
pub struct NewAdminSession {
    pub admin_user_id: Uuid,
    pub session_token_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Partial update for an admin account. `expires_at` distinguishes
/// "leave alone" (None) from "set to this value, possibly null" (Some).
#[derive(Debug, Clone, Default)]
pub struct AdminUpdate {
    pub password_hash: Option<String>,
    pub status: Option<String>,
    pub is_permanent: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

/// Read-side key counts. `active` uses the same predicate as validation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct KeyStats {
    pub total: i64,
    pub active: i64,
    pub expired: i64,
    pub recent: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity probe for readiness checks.
    async fn ping(&self) -> Result<()>;

    // ------------------------------------------------------------------
    // Access keys
    // ------------------------------------------------------------------

    /// Insert a new key. Fails with a conflict when the user already holds a
    /// row with status ACTIVE (the partial-unique backstop for concurrent
    /// creates).
    async fn insert_key(&self, new: NewAccessKey) -> Result<AccessKey>;

    async fn find_key(&self, key_id: Uuid) -> Result<Option<AccessKey>>;

    /// The user's ACTIVE-status row, if any. Expiry is not filtered here;
    /// the engine decides what a stale row means.
    async fn find_active_key_for_user(&self, user_id: &str) -> Result<Option<AccessKey>>;

    /// Atomically increment `usage_count` and stamp `last_accessed_at`,
    /// returning the updated row.
    async fn record_key_usage(&self, key_id: Uuid, now: DateTime<Utc>)
        -> Result<Option<AccessKey>>;

    /// Lazy expiry write-back: demote a stale ACTIVE row to EXPIRED.
    async fn mark_key_expired(&self, key_id: Uuid) -> Result<()>;

    /// Every key ever issued to the user, newest first.
    async fn list_keys_for_user(&self, user_id: &str) -> Result<Vec<AccessKey>>;

    /// Hard delete. Returns false when no row existed.
    async fn delete_key(&self, key_id: Uuid) -> Result<bool>;

    async fn key_stats(&self, now: DateTime<Utc>, recent_since: DateTime<Utc>)
        -> Result<KeyStats>;

    // ------------------------------------------------------------------
    // Admin users
    // ------------------------------------------------------------------

    /// Insert a new admin. Fails with `UsernameTaken` on a (case-insensitive)
    /// duplicate username.
    async fn insert_admin(&self, new: NewAdminUser) -> Result<AdminUser>;

    async fn find_admin(&self, id: Uuid) -> Result<Option<AdminUser>>;

    /// Case-insensitive username lookup.
    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>>;

    async fn list_admins(&self) -> Result<Vec<AdminUser>>;

    async fn update_admin(
        &self,
        id: Uuid,
        update: AdminUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminUser>>;

    /// Hard delete. Removes the admin's sessions and nulls `created_by` on
    /// keys it issued; admins it created are left untouched.
    async fn delete_admin(&self, id: Uuid) -> Result<bool>;

    async fn touch_admin_login(&self, id: Uuid, now: DateTime<Utc>) -> Result<()>;

    // ------------------------------------------------------------------
    // Admin sessions
    // ------------------------------------------------------------------

    async fn insert_session(&self, new: NewAdminSession) -> Result<AdminSession>;

    async fn find_session_by_token_hash(&self, hash: &str) -> Result<Option<AdminSession>>;

    async fn touch_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<()>;

    async fn delete_session(&self, id: Uuid) -> Result<bool>;

    /// Delete every session carrying this token hash (normally one).
    async fn delete_sessions_by_token_hash(&self, hash: &str) -> Result<u64>;

    async fn list_sessions(&self) -> Result<Vec<AdminSession>>;

    /// Delete every session, the caller's included. Returns the count.
    async fn clear_sessions(&self) -> Result<u64>;
}

/// Bound a store call by the configured deadline. A timeout surfaces as a
/// retryable store-unavailable error instead of hanging the request.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::StoreUnavailable),
    }
}
