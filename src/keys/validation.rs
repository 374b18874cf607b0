// Input validation for key operations

use crate::config::KeysConfig;
use crate::errors::{AppError, Result};

const USER_ID_MAX_CHARS: usize = 255;

/// Sanitize a caller-supplied user identifier: strip markup-significant
/// characters, trim whitespace, cap the length. Empty after cleaning is a
/// validation error.
pub fn sanitize_user_id(raw: &str) -> Result<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }

    Ok(cleaned.chars().take(USER_ID_MAX_CHARS).collect())
}

/// Resolve the requested validity in hours. Omitted falls back to the
/// configured default; out-of-range is rejected rather than clamped so the
/// caller learns about it.
pub fn validate_hours(hours: Option<i64>, config: &KeysConfig) -> Result<i64> {
    match hours {
        None => Ok(config.default_hours),
        Some(h) if (1..=config.max_hours).contains(&h) => Ok(h),
        Some(_) => Err(AppError::Validation(format!(
            "hours must be between 1 and {}",
            config.max_hours
        ))),
    }
}
