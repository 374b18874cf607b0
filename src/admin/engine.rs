// Admin credential and session engine: login with per-IP attempt limiting,
// bearer-session authentication, logout, bulk session operations, and the
// one-shot bootstrap of the configured root account.

use crate::auth::{password, token};
use crate::clock::Clock;
use crate::config::AdminConfig;
use crate::db::schema::{AdminSession, AdminStatus, AdminUser};
use crate::db::store::{with_deadline, NewAdminSession, NewAdminUser, Store};
use crate::errors::{AppError, Result};
use crate::rate_limit::LoginLimiter;
use chrono::Duration as ChronoDuration;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Returned from a successful login. The raw token appears here and nowhere
/// else; only its hash is stored.
#[derive(Debug, Serialize)]
pub struct LoginSuccess {
    pub token: String,
    pub admin: AdminUser,
    pub session: AdminSession,
}

/// The authenticated context attached to admin requests.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub admin: AdminUser,
    pub session: AdminSession,
}

/// A session annotated with its owner's username for listings.
#[derive(Debug, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: AdminSession,
    pub username: Option<String>,
}

pub struct AdminEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    limiter: Arc<dyn LoginLimiter>,
    pub(crate) config: AdminConfig,
    pub(crate) call_timeout: Duration,
    bootstrapped: OnceCell<()>,
}

impl AdminEngine {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        limiter: Arc<dyn LoginLimiter>,
        config: AdminConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            limiter,
            config,
            call_timeout,
            bootstrapped: OnceCell::new(),
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Authenticate an operator and open a session. The failure modes that
    /// reveal account existence all collapse into one generic Unauthorized.
    pub async fn authenticate(
        &self,
        username: Option<&str>,
        pass: Option<&str>,
        ip: &str,
        user_agent: Option<String>,
    ) -> Result<LoginSuccess> {
        let decision = self.limiter.check(ip).await?;
        if !decision.allowed {
            return Err(AppError::RateLimited {
                retry_after_seconds: decision.retry_after_seconds,
            });
        }

        let username = username
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| AppError::Validation("Username is required".to_string()))?;
        let pass = pass
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::Validation("Password is required".to_string()))?;

        let now = self.clock.now();
        let admin = with_deadline(self.call_timeout, self.store.find_admin_by_username(username))
            .await?;
        let admin = match admin {
            Some(admin) if admin.is_usable(now) => admin,
            _ => {
                tracing::warn!(ip = %ip, "Failed login attempt");
                return Err(AppError::Unauthorized);
            }
        };

        if !password::verify_password(pass, &admin.password_hash)? {
            tracing::warn!(ip = %ip, "Failed login attempt");
            return Err(AppError::Unauthorized);
        }

        let raw_token = token::generate_token();
        let session = with_deadline(
            self.call_timeout,
            self.store.insert_session(NewAdminSession {
                admin_user_id: admin.id,
                session_token_hash: token::hash_token(&raw_token),
                ip_address: Some(ip.to_string()),
                user_agent,
                created_at: now,
                expires_at: now + ChronoDuration::hours(self.config.session_ttl_hours),
            }),
        )
        .await?;

        with_deadline(self.call_timeout, self.store.touch_admin_login(admin.id, now)).await?;

        if let Err(e) = self.limiter.clear(ip).await {
            tracing::debug!("Failed to reset login limiter for {}: {}", ip, e);
        }

        tracing::info!("Admin {} logged in from {}", admin.username, ip);

        Ok(LoginSuccess {
            token: raw_token,
            admin,
            session,
        })
    }

    /// Resolve a presented bearer token into an authenticated context.
    /// Discovering an expired or revoked row removes it best-effort.
    pub async fn require_auth(&self, raw_token: &str) -> Result<SessionContext> {
        let hash = token::hash_token(raw_token);
        let now = self.clock.now();

        let session = with_deadline(self.call_timeout, self.store.find_session_by_token_hash(&hash))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !session.is_usable(now) {
            if let Err(e) = self.store.delete_session(session.id).await {
                tracing::debug!("Failed to remove stale session {}: {}", session.id, e);
            }
            return Err(AppError::Unauthorized);
        }

        let admin = with_deadline(self.call_timeout, self.store.find_admin(session.admin_user_id))
            .await?
            .filter(|a| a.is_usable(now))
            .ok_or(AppError::Unauthorized)?;

        with_deadline(self.call_timeout, self.store.touch_session(session.id, now)).await?;

        Ok(SessionContext { admin, session })
    }

    /// Remove every session carrying this token. Always succeeds so callers
    /// cannot probe whether a token was live.
    pub async fn logout(&self, raw_token: &str) -> Result<u64> {
        let hash = token::hash_token(raw_token);
        let removed = with_deadline(
            self.call_timeout,
            self.store.delete_sessions_by_token_hash(&hash),
        )
        .await?;
        Ok(removed)
    }

    /// All sessions, newest first, with owner usernames resolved.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>> {
        let sessions = with_deadline(self.call_timeout, self.store.list_sessions()).await?;

        let owners = futures::future::try_join_all(sessions.iter().map(|s| {
            let store = Arc::clone(&self.store);
            let admin_id = s.admin_user_id;
            async move { store.find_admin(admin_id).await }
        }))
        .await?;

        Ok(sessions
            .into_iter()
            .zip(owners)
            .map(|(session, owner)| SessionSummary {
                session,
                username: owner.map(|a| a.username),
            })
            .collect())
    }

    /// Delete every session, the caller's included. Returns the count.
    pub async fn clear_sessions(&self) -> Result<u64> {
        let cleared = with_deadline(self.call_timeout, self.store.clear_sessions()).await?;
        tracing::info!("Cleared {} admin sessions", cleared);
        Ok(cleared)
    }

    /// Seed the configured root admin once per process. A concurrent first
    /// request racing this relies on the store's username uniqueness as the
    /// backstop; losing that race counts as success.
    pub async fn bootstrap(&self) -> Result<()> {
        self.bootstrapped
            .get_or_try_init(|| async {
                let (username, pass) = match (
                    self.config.root_username.as_deref(),
                    self.config.root_password.as_deref(),
                ) {
                    (Some(u), Some(p)) => (u, p),
                    _ => return Ok(()),
                };

                let existing =
                    with_deadline(self.call_timeout, self.store.find_admin_by_username(username))
                        .await?;
                if existing.is_some() {
                    return Ok(());
                }

                let now = self.clock.now();
                let new = NewAdminUser {
                    username: username.to_string(),
                    password_hash: password::hash_password(pass)?,
                    status: AdminStatus::Active.as_str().to_string(),
                    is_permanent: true,
                    expires_at: None,
                    created_by: None,
                    created_at: now,
                };
                match with_deadline(self.call_timeout, self.store.insert_admin(new)).await {
                    Ok(admin) => {
                        tracing::info!("Bootstrapped permanent admin {}", admin.username);
                        Ok(())
                    }
                    Err(AppError::UsernameTaken) => Ok(()),
                    Err(e) => Err(e),
                }
            })
            .await
            .map(|_| ())
    }
}
