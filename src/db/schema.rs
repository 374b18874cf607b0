// Database schema types shared by the Postgres and in-memory stores

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// Access Key
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AccessKey {
    pub key_id: Uuid,
    pub user_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub usage_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub ip_address: Option<String>,
    pub created_by: Option<Uuid>,
}

impl AccessKey {
    /// The business-sense "active" predicate: status ACTIVE and not yet past
    /// expiry. The stored status column alone is never trusted for this.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == KeyStatus::Active.as_str() && self.expires_at > now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    Active,
    Expired,
    Revoked,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "ACTIVE",
            KeyStatus::Expired => "EXPIRED",
            KeyStatus::Revoked => "REVOKED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(KeyStatus::Active),
            "EXPIRED" => Some(KeyStatus::Expired),
            "REVOKED" => Some(KeyStatus::Revoked),
            _ => None,
        }
    }
}

// ============================================================================
// Admin User
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    /// Never serialized into responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: String,
    pub is_permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl AdminUser {
    /// An admin can authenticate iff ACTIVE and not past its own expiry.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == AdminStatus::Active.as_str()
            && self.expires_at.map_or(true, |exp| exp > now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminStatus {
    Active,
    Disabled,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Active => "ACTIVE",
            AdminStatus::Disabled => "DISABLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(AdminStatus::Active),
            "DISABLED" => Some(AdminStatus::Disabled),
            _ => None,
        }
    }
}

// ============================================================================
// Admin Session
// ============================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminSession {
    pub id: Uuid,
    pub admin_user_id: Uuid,
    /// One-way hash of the bearer token; the raw token is never persisted.
    #[serde(skip_serializing)]
    pub session_token_hash: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl AdminSession {
    /// A session is usable iff not revoked and not past expiry.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}
