pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{with_deadline, DatabaseManager, StorageError};
pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;
pub use store::IdentityStore;
