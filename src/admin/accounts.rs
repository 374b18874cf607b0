// Admin account CRUD. Guards live here: permanent admins cannot be
// disabled, deleted, or demoted, and an admin cannot disable or delete
// itself through the authenticated path.

use crate::admin::engine::AdminEngine;
use crate::auth::password;
use crate::db::schema::{AdminStatus, AdminUser};
use crate::db::store::{with_deadline, AdminUpdate, NewAdminUser, Store};
use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Payload for creating an admin account.
#[derive(Debug, Clone)]
pub struct CreateAdmin {
    pub username: String,
    pub password: String,
    pub is_permanent: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update for an admin account. `expires_at` distinguishes "leave
/// alone" (None) from "set, possibly to null" (Some).
#[derive(Debug, Clone, Default)]
pub struct UpdateAdmin {
    pub password: Option<String>,
    pub status: Option<String>,
    pub is_permanent: Option<bool>,
    pub expires_at: Option<Option<DateTime<Utc>>>,
}

impl AdminEngine {
    /// Create a new admin account on behalf of `actor`.
    pub async fn create_admin(&self, actor: &AdminUser, req: CreateAdmin) -> Result<AdminUser> {
        let username = req.username.trim();
        if username.chars().count() < self.config.username_min_length {
            return Err(AppError::Validation(format!(
                "Username must be at least {} characters",
                self.config.username_min_length
            )));
        }
        password::check_password_policy(&req.password, &self.config)?;

        let now = self.now();
        let new = NewAdminUser {
            username: username.to_string(),
            password_hash: password::hash_password(&req.password)?,
            status: AdminStatus::Active.as_str().to_string(),
            is_permanent: req.is_permanent,
            expires_at: req.expires_at,
            created_by: Some(actor.id),
            created_at: now,
        };
        let admin = with_deadline(self.call_timeout, self.store().insert_admin(new)).await?;

        tracing::info!("Admin {} created by {}", admin.username, actor.username);

        Ok(admin)
    }

    pub async fn get_admin(&self, id: Uuid) -> Result<AdminUser> {
        with_deadline(self.call_timeout, self.store().find_admin(id))
            .await?
            .ok_or(AppError::AdminNotFound)
    }

    pub async fn list_admins(&self) -> Result<Vec<AdminUser>> {
        with_deadline(self.call_timeout, self.store().list_admins()).await
    }

    /// Apply a partial update. Status changes away from ACTIVE and clearing
    /// the permanent flag are rejected for permanent admins; an admin cannot
    /// change its own status.
    pub async fn update_admin(
        &self,
        actor: &AdminUser,
        id: Uuid,
        req: UpdateAdmin,
    ) -> Result<AdminUser> {
        let target = self.get_admin(id).await?;

        if let Some(status) = req.status.as_deref() {
            if AdminStatus::from_str(status).is_none() {
                return Err(AppError::Validation(format!(
                    "Unknown admin status: {}",
                    status
                )));
            }
            if status != AdminStatus::Active.as_str() {
                if target.is_permanent {
                    return Err(AppError::PermanentAdminProtected);
                }
                if actor.id == target.id {
                    return Err(AppError::SelfActionForbidden);
                }
            }
        }
        if target.is_permanent && req.is_permanent == Some(false) {
            return Err(AppError::PermanentAdminProtected);
        }

        let password_hash = match req.password.as_deref() {
            Some(new_password) => {
                password::check_password_policy(new_password, &self.config)?;
                Some(password::hash_password(new_password)?)
            }
            None => None,
        };

        let update = AdminUpdate {
            password_hash,
            status: req.status,
            is_permanent: req.is_permanent,
            expires_at: req.expires_at,
        };
        let updated = with_deadline(
            self.call_timeout,
            self.store().update_admin(id, update, self.now()),
        )
        .await?
        .ok_or(AppError::AdminNotFound)?;

        tracing::info!("Admin {} updated by {}", updated.username, actor.username);

        Ok(updated)
    }

    /// Hard delete an admin. Its sessions go with it; keys it issued live on
    /// with a nulled issuer. Permanent admins and the actor itself are off
    /// limits.
    pub async fn delete_admin(&self, actor: &AdminUser, id: Uuid) -> Result<()> {
        if actor.id == id {
            return Err(AppError::SelfActionForbidden);
        }
        let target = self.get_admin(id).await?;
        if target.is_permanent {
            return Err(AppError::PermanentAdminProtected);
        }

        let deleted = with_deadline(self.call_timeout, self.store().delete_admin(id)).await?;
        if !deleted {
            return Err(AppError::AdminNotFound);
        }

        tracing::info!("Admin {} deleted by {}", target.username, actor.username);

        Ok(())
    }
}
