// Remaining-validity breakdown, a pure function of two timestamps.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRemaining {
    pub expired: bool,
    pub hours: i64,
    pub minutes: i64,
}

impl TimeRemaining {
    /// Break the span from `now` to `expires_at` into whole hours and
    /// leftover minutes; a non-positive span is the expired marker.
    pub fn between(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let seconds = (expires_at - now).num_seconds();
        if seconds <= 0 {
            return Self {
                expired: true,
                hours: 0,
                minutes: 0,
            };
        }
        Self {
            expired: false,
            hours: seconds / 3600,
            minutes: (seconds % 3600) / 60,
        }
    }
}
