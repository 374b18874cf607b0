// Password hashing with Argon2id
use crate::config::AdminConfig;
use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};

/// Hash a password using Argon2id with OWASP recommended parameters
///
/// Parameters (OWASP 2023):
/// - Memory: 19 MiB (19456 KiB)
/// - Iterations: 2
/// - Parallelism: 1
/// - Output length: 32 bytes
pub fn hash_password(password: &str) -> Result<String> {
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }

    // OWASP recommended parameters for Argon2id
    let params = Params::new(
        19456,    // m_cost (memory): 19 MiB
        2,        // t_cost (iterations)
        1,        // p_cost (parallelism)
        Some(32), // output length
    )
    .map_err(|e| AppError::Internal(format!("Failed to create Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a hash using constant-time comparison
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Failed to parse password hash: {}", e)))?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => {
            tracing::error!("Password verification error: {}", e);
            Err(AppError::Internal(format!(
                "Password verification error: {}",
                e
            )))
        }
    }
}

/// Enforce the configured password policy server-side.
pub fn check_password_policy(password: &str, config: &AdminConfig) -> Result<()> {
    if password.len() < config.password_min_length {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            config.password_min_length
        )));
    }
    if config.password_require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::Validation(
            "Password must contain an uppercase letter".to_string(),
        ));
    }
    if config.password_require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::Validation(
            "Password must contain a lowercase letter".to_string(),
        ));
    }
    if config.password_require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "Password must contain a digit".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AdminConfig {
        AdminConfig {
            session_ttl_hours: 24,
            root_username: None,
            root_password: None,
            username_min_length: 3,
            password_min_length: 8,
            password_require_uppercase: true,
            password_require_lowercase: true,
            password_require_digit: true,
        }
    }

    #[test]
    fn test_hash_password() {
        let password = "test_Password_123";
        let hash = hash_password(password).unwrap();

        // Hash should be a valid PHC string
        assert!(hash.starts_with("$argon2id$"));

        // Hash should be different each time (due to random salt)
        let hash2 = hash_password(password).unwrap();
        assert_ne!(hash, hash2);
    }

    #[test]
    fn test_verify_password_success() {
        let password = "test_Password_123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_failure() {
        let password = "test_Password_123";
        let hash = hash_password(password).unwrap();

        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_empty_password() {
        let result = hash_password("");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), AppError::Validation(_)));
    }

    #[test]
    fn test_policy_rejections() {
        let config = policy();
        assert!(check_password_policy("short1A", &config).is_err());
        assert!(check_password_policy("alllowercase1", &config).is_err());
        assert!(check_password_policy("ALLUPPERCASE1", &config).is_err());
        assert!(check_password_policy("NoDigitsHere", &config).is_err());
        assert!(check_password_policy("Acceptable1", &config).is_ok());
    }
}
