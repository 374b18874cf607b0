// Key lifecycle engine: creation with single-active-key enforcement, lazy
// expiry, usage accounting, and hard deletion.

use crate::clock::Clock;
use crate::config::KeysConfig;
use crate::db::schema::AccessKey;
use crate::db::store::{with_deadline, NewAccessKey, Store};
use crate::errors::{ActiveKeyConflict, AppError, Result};
use crate::keys::remaining::TimeRemaining;
use crate::keys::validation;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Response payload for a successful key creation.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedKey {
    pub key_id: Uuid,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub valid_for_hours: i64,
}

/// Snapshot of a key with its effective validity computed at read time.
#[derive(Debug, Clone, Serialize)]
pub struct KeyReport {
    pub valid: bool,
    /// 200 when valid, 410 when expired or not ACTIVE.
    pub code: u16,
    pub key_id: Uuid,
    pub user_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub time_remaining: TimeRemaining,
    pub usage_count: i64,
}

impl KeyReport {
    fn from_key(key: &AccessKey, now: DateTime<Utc>) -> Self {
        let valid = key.is_active(now);
        Self {
            valid,
            code: if valid { 200 } else { 410 },
            key_id: key.key_id,
            user_id: key.user_id.clone(),
            status: key.status.clone(),
            created_at: key.created_at,
            expires_at: key.expires_at,
            last_accessed_at: key.last_accessed_at,
            time_remaining: TimeRemaining::between(key.expires_at, now),
            usage_count: key.usage_count,
        }
    }
}

pub struct KeyLifecycle {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    config: KeysConfig,
    call_timeout: Duration,
}

impl KeyLifecycle {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        config: KeysConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            config,
            call_timeout,
        }
    }

    fn conflict(existing: &AccessKey, now: DateTime<Utc>) -> AppError {
        AppError::DuplicateActiveKey(Box::new(ActiveKeyConflict {
            key_id: existing.key_id,
            user_id: existing.user_id.clone(),
            expires_at: existing.expires_at,
            time_remaining: TimeRemaining::between(existing.expires_at, now),
        }))
    }

    /// Issue a new key for a user. Fails with a conflict carrying the
    /// existing key's details when the user already holds an active one.
    pub async fn create(
        &self,
        user_id: &str,
        hours: Option<i64>,
        ip_address: Option<String>,
        created_by: Option<Uuid>,
    ) -> Result<CreatedKey> {
        let user_id = validation::sanitize_user_id(user_id)?;
        let hours = validation::validate_hours(hours, &self.config)?;
        let now = self.clock.now();

        let existing = with_deadline(
            self.call_timeout,
            self.store.find_active_key_for_user(&user_id),
        )
        .await?;
        if let Some(existing) = existing {
            if existing.expires_at > now {
                return Err(Self::conflict(&existing, now));
            }
            // The ACTIVE row outlived its expiry; demote it so the
            // one-active-per-user constraint accepts the new insert.
            with_deadline(self.call_timeout, self.store.mark_key_expired(existing.key_id))
                .await?;
        }

        let new = NewAccessKey {
            key_id: Uuid::new_v4(),
            user_id: user_id.clone(),
            created_at: now,
            expires_at: now + ChronoDuration::hours(hours),
            ip_address,
            created_by,
        };

        match with_deadline(self.call_timeout, self.store.insert_key(new)).await {
            Ok(key) => Ok(CreatedKey {
                key_id: key.key_id,
                user_id: key.user_id,
                expires_at: key.expires_at,
                valid_for_hours: hours,
            }),
            Err(AppError::Conflict(msg)) => {
                // Lost a concurrent create; report the winner's key.
                let winner = with_deadline(
                    self.call_timeout,
                    self.store.find_active_key_for_user(&user_id),
                )
                .await?;
                match winner {
                    Some(existing) => Err(Self::conflict(&existing, now)),
                    None => Err(AppError::Conflict(msg)),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Validate a key and, when it is valid, count the use.
    pub async fn validate(&self, key_id: Uuid) -> Result<KeyReport> {
        let now = self.clock.now();
        let key = with_deadline(self.call_timeout, self.store.find_key(key_id))
            .await?
            .ok_or(AppError::KeyNotFound)?;

        if !key.is_active(now) {
            return Ok(KeyReport::from_key(&key, now));
        }

        let updated = with_deadline(self.call_timeout, self.store.record_key_usage(key_id, now))
            .await?
            .ok_or(AppError::KeyNotFound)?;
        Ok(KeyReport::from_key(&updated, now))
    }

    /// Same shape as validate, without the usage side effect.
    pub async fn info(&self, key_id: Uuid) -> Result<KeyReport> {
        let now = self.clock.now();
        let key = with_deadline(self.call_timeout, self.store.find_key(key_id))
            .await?
            .ok_or(AppError::KeyNotFound)?;
        Ok(KeyReport::from_key(&key, now))
    }

    /// Every key ever issued to the user, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<KeyReport>> {
        let user_id = validation::sanitize_user_id(user_id)?;
        let now = self.clock.now();
        let keys = with_deadline(self.call_timeout, self.store.list_keys_for_user(&user_id))
            .await?;
        Ok(keys.iter().map(|k| KeyReport::from_key(k, now)).collect())
    }

    /// Hard delete. The second call for the same id reports NotFound.
    pub async fn delete(&self, key_id: Uuid) -> Result<()> {
        let deleted = with_deadline(self.call_timeout, self.store.delete_key(key_id)).await?;
        if !deleted {
            return Err(AppError::KeyNotFound);
        }
        Ok(())
    }
}
