use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::manager::StorageError;
use super::models::{Authority, DelegationToken};

/// Store boundary shared by every component. Implementations return
/// typed records; business rules stay with the callers.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Durably record a freshly signed token as one unit of work
    async fn insert_token(&self, token: &DelegationToken) -> Result<(), StorageError>;

    async fn find_token(&self, token_id: Uuid) -> Result<Option<DelegationToken>, StorageError>;

    /// Atomically flip `consumed` from false to true. Returns `true` only
    /// for the single caller whose transition took effect; a missing or
    /// already-consumed row yields `false`.
    async fn consume_token(&self, token_id: Uuid, consumed_at: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Authorities reachable through the user's active role bindings in a tenant
    async fn authorities_for_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<Authority>, StorageError>;

    /// SHOW/DISABLE authorities whose url starts with `url_prefix`,
    /// reachable through the user's active role bindings
    async fn menu_authorities_for_user(
        &self,
        user_id: &str,
        tenant_id: &str,
        url_prefix: &str,
    ) -> Result<Vec<Authority>, StorageError>;

    async fn ping(&self) -> Result<(), StorageError>;
}
