pub mod auth;
pub mod authz;
pub mod config;
pub mod context;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;

pub use context::AppContext;
pub use handlers::router;
