pub mod health;
pub mod tracing;

pub use self::health::{HealthChecker, HealthStatus};
pub use self::tracing::init_tracing;
