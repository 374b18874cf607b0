// Postgres-backed store: a thin trait shim over the per-table query modules.

use crate::db::schema::{AccessKey, AdminSession, AdminUser};
use crate::db::store::{
    AdminUpdate, KeyStats, NewAccessKey, NewAdminSession, NewAdminUser, Store,
};
use crate::db::{admins, keys, sessions};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_key(&self, new: NewAccessKey) -> Result<AccessKey> {
        keys::insert(&self.pool, &new).await
    }

    async fn find_key(&self, key_id: Uuid) -> Result<Option<AccessKey>> {
        keys::get(&self.pool, key_id).await
    }

    async fn find_active_key_for_user(&self, user_id: &str) -> Result<Option<AccessKey>> {
        keys::get_active_for_user(&self.pool, user_id).await
    }

    async fn record_key_usage(
        &self,
        key_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<AccessKey>> {
        keys::record_usage(&self.pool, key_id, now).await
    }

    async fn mark_key_expired(&self, key_id: Uuid) -> Result<()> {
        keys::mark_expired(&self.pool, key_id).await
    }

    async fn list_keys_for_user(&self, user_id: &str) -> Result<Vec<AccessKey>> {
        keys::list_for_user(&self.pool, user_id).await
    }

    async fn delete_key(&self, key_id: Uuid) -> Result<bool> {
        keys::delete(&self.pool, key_id).await
    }

    async fn key_stats(
        &self,
        now: DateTime<Utc>,
        recent_since: DateTime<Utc>,
    ) -> Result<KeyStats> {
        keys::stats(&self.pool, now, recent_since).await
    }

    async fn insert_admin(&self, new: NewAdminUser) -> Result<AdminUser> {
        admins::insert(&self.pool, &new).await
    }

    async fn find_admin(&self, id: Uuid) -> Result<Option<AdminUser>> {
        admins::get(&self.pool, id).await
    }

    async fn find_admin_by_username(&self, username: &str) -> Result<Option<AdminUser>> {
        admins::get_by_username(&self.pool, username).await
    }

    async fn list_admins(&self) -> Result<Vec<AdminUser>> {
        admins::list(&self.pool).await
    }

    async fn update_admin(
        &self,
        id: Uuid,
        update: AdminUpdate,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminUser>> {
        admins::update(&self.pool, id, &update, now).await
    }

    async fn delete_admin(&self, id: Uuid) -> Result<bool> {
        admins::delete(&self.pool, id).await
    }

    async fn touch_admin_login(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        admins::touch_login(&self.pool, id, now).await
    }

    async fn insert_session(&self, new: NewAdminSession) -> Result<AdminSession> {
        sessions::insert(&self.pool, &new).await
    }

    async fn find_session_by_token_hash(&self, hash: &str) -> Result<Option<AdminSession>> {
        sessions::get_by_token_hash(&self.pool, hash).await
    }

    async fn touch_session(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        sessions::touch(&self.pool, id, now).await
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool> {
        sessions::delete(&self.pool, id).await
    }

    async fn delete_sessions_by_token_hash(&self, hash: &str) -> Result<u64> {
        sessions::delete_by_token_hash(&self.pool, hash).await
    }

    async fn list_sessions(&self) -> Result<Vec<AdminSession>> {
        sessions::list(&self.pool).await
    }

    async fn clear_sessions(&self) -> Result<u64> {
        sessions::clear(&self.pool).await
    }
}
