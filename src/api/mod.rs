pub mod admin;
pub mod health;
pub mod keys;
pub mod middleware;
pub mod routes;
pub mod stats;

pub use routes::{create_router, AppState};
