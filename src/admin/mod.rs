pub mod accounts;
pub mod engine;

pub use accounts::{CreateAdmin, UpdateAdmin};
pub use engine::{AdminEngine, LoginSuccess, SessionContext, SessionSummary};
