pub mod admins;
pub mod keys;
pub mod memory;
pub mod pool;
pub mod postgres;
pub mod schema;
pub mod sessions;
pub mod store;

pub use memory::MemStore;
pub use pool::{create_pool, run_migrations};
pub use postgres::PgStore;
pub use store::{with_deadline, Store};
