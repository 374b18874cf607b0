pub mod engine;
pub mod remaining;
pub mod validation;

pub use engine::{CreatedKey, KeyLifecycle, KeyReport};
pub use remaining::TimeRemaining;
