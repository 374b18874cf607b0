use crate::errors::{AppError, Result};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub keys: KeysConfig,
    pub admin: AdminConfig,
    pub login_limit: LoginLimitConfig,
    pub stats: StatsConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub idle_timeout_seconds: u64,
    /// Deadline applied to every store call made by the engines.
    pub call_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeysConfig {
    /// Validity applied when a create request omits `hours`.
    pub default_hours: i64,
    /// Upper bound on requested validity; out-of-range requests are rejected.
    pub max_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub session_ttl_hours: i64,
    /// Bootstrap credentials; when set and no such admin exists, a permanent
    /// admin is seeded at startup.
    pub root_username: Option<String>,
    pub root_password: Option<String>,
    pub username_min_length: usize,
    pub password_min_length: usize,
    pub password_require_uppercase: bool,
    pub password_require_lowercase: bool,
    pub password_require_digit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginLimitConfig {
    /// "memory" (single instance) or "redis" (shared across instances).
    pub backend: String,
    pub window_seconds: i64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    pub recent_window_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        // Determine environment
        let environment = env::var("KEYWARDEN_ENV").unwrap_or_else(|_| "development".to_string());

        // Build configuration
        let config = config::Config::builder()
            // Start with default config
            .add_source(config::File::with_name("config/default"))
            // Add environment-specific config
            .add_source(
                config::File::with_name(&format!("config/{}", environment)).required(false),
            )
            // Add environment variables with prefix KEYWARDEN
            // e.g., KEYWARDEN__SERVER__PORT=8080
            .add_source(
                config::Environment::with_prefix("KEYWARDEN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::Configuration(e.to_string()))?;

        // Deserialize into our Config struct
        config
            .try_deserialize()
            .map_err(|e| AppError::Configuration(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Configuration("Invalid port number".to_string()));
        }

        if self.database.url.is_empty() {
            return Err(AppError::Configuration(
                "Database URL is required".to_string(),
            ));
        }

        if self.keys.max_hours < 1 {
            return Err(AppError::Configuration(
                "keys.max_hours must be at least 1".to_string(),
            ));
        }
        if self.keys.default_hours < 1 || self.keys.default_hours > self.keys.max_hours {
            return Err(AppError::Configuration(
                "keys.default_hours must be within 1..=keys.max_hours".to_string(),
            ));
        }

        if self.admin.session_ttl_hours < 1 {
            return Err(AppError::Configuration(
                "admin.session_ttl_hours must be at least 1".to_string(),
            ));
        }
        if self.admin.password_min_length < 8 {
            return Err(AppError::Configuration(
                "Password min length must be at least 8".to_string(),
            ));
        }
        if self.admin.root_username.is_some() != self.admin.root_password.is_some() {
            return Err(AppError::Configuration(
                "root_username and root_password must be set together".to_string(),
            ));
        }

        if self.login_limit.window_seconds < 1 || self.login_limit.max_attempts == 0 {
            return Err(AppError::Configuration(
                "Login limit window and max attempts must be positive".to_string(),
            ));
        }
        match self.login_limit.backend.as_str() {
            "memory" => {}
            "redis" => {
                if self.redis.is_none() {
                    return Err(AppError::Configuration(
                        "Redis config is required for the redis login limit backend".to_string(),
                    ));
                }
            }
            other => {
                return Err(AppError::Configuration(format!(
                    "Unknown login limit backend: {}",
                    other
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/keywarden_test".to_string(),
                max_connections: 5,
                min_connections: 1,
                acquire_timeout_seconds: 5,
                idle_timeout_seconds: 300,
                call_timeout_seconds: 5,
            },
            redis: None,
            keys: KeysConfig {
                default_hours: 24,
                max_hours: 168,
            },
            admin: AdminConfig {
                session_ttl_hours: 24,
                root_username: None,
                root_password: None,
                username_min_length: 3,
                password_min_length: 8,
                password_require_uppercase: true,
                password_require_lowercase: true,
                password_require_digit: true,
            },
            login_limit: LoginLimitConfig {
                backend: "memory".to_string(),
                window_seconds: 900,
                max_attempts: 10,
            },
            stats: StatsConfig {
                recent_window_hours: 24,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: "pretty".to_string(),
            },
        }
    }

    #[test]
    fn test_config_validation() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_hours_must_fit_max() {
        let mut config = test_config();
        config.keys.default_hours = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_redis_backend_requires_redis_config() {
        let mut config = test_config();
        config.login_limit.backend = "redis".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_root_credentials_set_together() {
        let mut config = test_config();
        config.admin.root_username = Some("root".to_string());
        assert!(config.validate().is_err());

        config.admin.root_password = Some("Sup3rSecret".to_string());
        assert!(config.validate().is_ok());
    }
}
