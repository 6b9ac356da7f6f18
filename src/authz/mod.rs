//! Role/authority authorization: request permission checks and menu
//! visibility, both evaluated in-process over authorities fetched from
//! the store.

pub mod engine;
pub mod menu;
pub mod pattern;

use thiserror::Error;

use crate::database::StorageError;

pub use engine::AuthorizationEngine;
pub use menu::{MenuItem, MenuVisibilityResolver};
pub use pattern::{wildcard_match, MatchMode};

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid menu site: {0}")]
    InvalidSite(String),
}
