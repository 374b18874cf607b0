// In-process store used as the default test backend. It enforces the same
// uniqueness rules as the Postgres migrations (one ACTIVE key per user,
// unique session token hash, case-insensitive unique username) so the
// concurrent-create and bootstrap race properties can be exercised without a
// database.

use crate::db::schema::{AccessKey, AdminSession, AdminUser, KeyStatus};
use crate::db::store::{
    AdminUpdate, KeyStats, NewAccessKey, NewAdminSession, NewAdminUser, Store,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    keys: HashMap<Uuid, AccessKey>,
    admins: HashMap<Uuid, AdminUser>,
    sessions: HashMap<Uuid, AdminSession>,
}

#[derive(Default)]
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_key(&self, new: NewAccessKey) -> Result<AccessKey> {
        let mut inner = self.inner.write().unwrap();

        if inner.keys.contains_key(&new.key_id) {
            return Err(AppError::Internal("Duplicate key id generated".to_string()));
        }
        let has_active = inner
            .keys
            .values()
            .any(|k| k.user_id == new.user_id && k.status == KeyStatus::Active.as_str());
        if has_active {
            return Err(AppError::Conflict(
                "User already has an active key".to_string(),
            ));
        }

        let key = AccessKey {
            key_id: new.key_id,
            user_id: new.user_id,
            status: KeyStatus::Active.as_str().to_string(),
            created_at: new.created_at,
            expires_at: new.expires_at,
            usage_count: 0,
            last_accessed_at: None,
            ip_address: new.ip_address,
            created_by: new.created_by,
        };
        inner.keys.insert(key.key_id, key.clone());
        Ok(key)
    }

    async fn find_key(&self, key_id: Uuid) -> Result<Option<AccessKey>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.keys.get(&key_id).cloned())
    }

    async fn find_active_key_for_user(&self, user_id: &str) -> Result<Option<AccessKey>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .keys
            .values()
            .find(|k| k.user_id == user_id && k.status == KeyStatus::Active.as_str())
            .cloned())
    }

    async fn record_key_usage(
        &self,
        key_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessKey>> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.keys.get_mut(&key_id).map(|key| {
            key.usage_count += 1;
            key.last_accessed_at = Some(now);
            key.clone()
        }))
    }

    async fn mark_key_expired(&self, key_id: Uuid) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(key) = inner.keys.get_mut(&key_id) {
            key.status = KeyStatus::Expired.as_str().to_string();
        }
        Ok(())
    }

    async fn list_keys_for_user(&self, user_id: &str) -> Result<Vec<AccessKey>> {
        let inner = self.inner.read().unwrap();
        let mut keys: Vec<AccessKey> = inner
            .keys
            .values()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn delete_key(&self, key_id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.keys.remove(&key_id).is_some())
    }

    async fn key_stats(
        &self,
        now: DateTime<Utc>,
        recent_since: DateTime<Utc>,
    ) -> Result<KeyStats> {
        let inner = self.inner.read().unwrap();
        let keys = inner.keys.values();

        let mut stats = KeyStats {
            total: 0,
            active: 0,
            expired: 0,
            recent: 0,
        };
        for key in keys {
            stats.total += 1;
            if key.is_active(now) {
                stats.active += 1;
            }
            if key.expires_at <= now || key.status == KeyStatus::Expired.as_str() {
                stats.expired += 1;
            }
            if key.created_at > recent_since {
                stats.recent += 1;
            }
        }
        Ok(stats)
    }

    async fn insert_admin(&self, new: NewAdminUser) -> Result<AdminUser> {
        let mut inner = self.inner.write().unwrap();

        let taken = inner
            .admins
            .values()
            .any(|a| a.username.to_lowercase() == new.username.to_lowercase());
        if taken {
            return Err(AppError::UsernameTaken);
        }

        let admin = AdminUser {
            id: Uuid::new_v4(),
            username: new.username,
            password_hash: new.password_hash,
            status: new.status,
            is_permanent: new.is_permanent,
            expires_at: new.expires_at,
            last_login_at: None,
            created_at: new.created_at,
            updated_at: new.created_at,
            created_by: new.created_by,
        };
        inner.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn find_admin(&self, id: Uuid) -> Result<Option<AdminUser>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.admins.get(&id).cloned())
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .admins
            .values()
            .find(|a| a.username.to_lowercase() == username.to_lowercase())
            .cloned())
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>> {
        let inner = self.inner.read().unwrap();
        let mut admins: Vec<AdminUser> = inner.admins.values().cloned().collect();
        admins.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(admins)
    }

    async fn update_admin(
        &self,
        id: Uuid,
        update: AdminUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminUser>> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.admins.get_mut(&id).map(|admin| {
            if let Some(hash) = update.password_hash {
                admin.password_hash = hash;
            }
            if let Some(status) = update.status {
                admin.status = status;
            }
            if let Some(permanent) = update.is_permanent {
                admin.is_permanent = permanent;
            }
            if let Some(expires_at) = update.expires_at {
                admin.expires_at = expires_at;
            }
            admin.updated_at = now;
            admin.clone()
        }))
    }

    async fn delete_admin(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        if inner.admins.remove(&id).is_none() {
            return Ok(false);
        }
        inner.sessions.retain(|_, s| s.admin_user_id != id);
        for key in inner.keys.values_mut() {
            if key.created_by == Some(id) {
                key.created_by = None;
            }
        }
        Ok(true)
    }

    async fn touch_admin_login(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(admin) = inner.admins.get_mut(&id) {
            admin.last_login_at = Some(now);
        }
        Ok(())
    }

    async fn insert_session(&self, new: NewAdminSession) -> Result<AdminSession> {
        let mut inner = self.inner.write().unwrap();

        let duplicate = inner
            .sessions
            .values()
            .any(|s| s.session_token_hash == new.session_token_hash);
        if duplicate {
            return Err(AppError::Internal(
                "Duplicate session token generated".to_string(),
            ));
        }

        let session = AdminSession {
            id: Uuid::new_v4(),
            admin_user_id: new.admin_user_id,
            session_token_hash: new.session_token_hash,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            created_at: new.created_at,
            last_seen_at: new.created_at,
            expires_at: new.expires_at,
            revoked_at: None,
        };
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session_by_token_hash(&self, hash: &str) -> Result<Option<AdminSession>> {
        let inner = self.inner.read().unwrap();
        Ok(inner
            .sessions
            .values()
            .find(|s| s.session_token_hash == hash)
            .cloned())
    }

    async fn touch_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        if let Some(session) = inner.sessions.get_mut(&id) {
            session.last_seen_at = now;
        }
        Ok(())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().unwrap();
        Ok(inner.sessions.remove(&id).is_some())
    }

    async fn delete_sessions_by_token_hash(&self, hash: &str) -> Result<u64> {
        let mut inner = self.inner.write().unwrap();
        let before = inner.sessions.len();
        inner.sessions.retain(|_, s| s.session_token_hash != hash);
        Ok((before - inner.sessions.len()) as u64)
    }

    async fn list_sessions(&self) -> Result<Vec<AdminSession>> {
        let inner = self.inner.read().unwrap();
        let mut sessions: Vec<AdminSession> = inner.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn clear_sessions(&self) -> Result<u64> {
        let mut inner = self.inner.write().unwrap();
        let count = inner.sessions.len() as u64;
        inner.sessions.clear();
        Ok(count)
    }
}
