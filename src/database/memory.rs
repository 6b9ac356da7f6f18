use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::StorageError;
use super::models::{
    Audit, Authority, AuthorityMethod, DelegationToken, Role, RoleAuthorityBinding, UserRoleBinding,
};
use super::store::IdentityStore;

#[derive(Default)]
struct MemoryState {
    tokens: HashMap<Uuid, DelegationToken>,
    roles: HashMap<Uuid, Role>,
    authorities: HashMap<Uuid, Authority>,
    user_roles: Vec<UserRoleBinding>,
    role_authorities: Vec<RoleAuthorityBinding>,
}

/// In-process identity store for tests and local runs. Supports an
/// artificial per-call latency and an outage switch so deadline and
/// fail-closed paths can be exercised without a database.
#[derive(Default)]
pub struct MemoryIdentityStore {
    state: RwLock<MemoryState>,
    latency: RwLock<Option<Duration>>,
    unavailable: AtomicBool,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.write().await = latency;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn add_role(&self, tenant_id: &str, name: &str) -> Uuid {
        let role = Role {
            role_id: Uuid::new_v4(),
            name: name.to_string(),
            is_default: false,
            tenant_id: tenant_id.to_string(),
        };
        let role_id = role.role_id;
        self.state.write().await.roles.insert(role_id, role);
        role_id
    }

    /// Panics on an unparseable method; seeding data is trusted
    pub async fn add_authority(&self, tenant_id: &str, name: &str, url_pattern: &str, method: &str) -> Uuid {
        let method = AuthorityMethod::parse(method)
            .unwrap_or_else(|| panic!("invalid authority method '{}'", method));
        let authority = Authority {
            authority_id: Uuid::new_v4(),
            name: name.to_string(),
            url_pattern: url_pattern.to_string(),
            method,
            tenant_id: tenant_id.to_string(),
        };
        let authority_id = authority.authority_id;
        self.state.write().await.authorities.insert(authority_id, authority);
        authority_id
    }

    pub async fn bind_user_role(&self, user_id: &str, role_id: Uuid, active: bool) {
        let mut state = self.state.write().await;
        if let Some(binding) = state
            .user_roles
            .iter_mut()
            .find(|b| b.user_id == user_id && b.role_id == role_id)
        {
            binding.active = active;
            binding.audit.modified_at = Utc::now();
            return;
        }
        state.user_roles.push(UserRoleBinding {
            user_id: user_id.to_string(),
            role_id,
            active,
            audit: Audit::created_by("seed"),
        });
    }

    pub async fn bind_role_authority(&self, role_id: Uuid, authority_id: Uuid, active: bool) {
        let mut state = self.state.write().await;
        if let Some(binding) = state
            .role_authorities
            .iter_mut()
            .find(|b| b.role_id == role_id && b.authority_id == authority_id)
        {
            binding.active = active;
            binding.audit.modified_at = Utc::now();
            return;
        }
        state.role_authorities.push(RoleAuthorityBinding {
            role_id,
            authority_id,
            active,
            audit: Audit::created_by("seed"),
        });
    }

    async fn enter(&self) -> Result<(), StorageError> {
        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    fn reachable(state: &MemoryState, user_id: &str, tenant_id: &str) -> Vec<Authority> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        let roles = state
            .user_roles
            .iter()
            .filter(|b| b.active && b.user_id == user_id)
            .filter_map(|b| state.roles.get(&b.role_id))
            .filter(|r| r.tenant_id == tenant_id);

        for role in roles {
            let authorities = state
                .role_authorities
                .iter()
                .filter(|b| b.active && b.role_id == role.role_id)
                .filter_map(|b| state.authorities.get(&b.authority_id))
                .filter(|a| a.tenant_id == tenant_id);

            for authority in authorities {
                if seen.insert(authority.authority_id) {
                    out.push(authority.clone());
                }
            }
        }
        out
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn insert_token(&self, token: &DelegationToken) -> Result<(), StorageError> {
        self.enter().await?;
        let mut state = self.state.write().await;
        if state.tokens.contains_key(&token.token_id) {
            return Err(StorageError::Conflict(format!(
                "duplicate token id {}",
                token.token_id
            )));
        }
        state.tokens.insert(token.token_id, token.clone());
        Ok(())
    }

    async fn find_token(&self, token_id: Uuid) -> Result<Option<DelegationToken>, StorageError> {
        self.enter().await?;
        Ok(self.state.read().await.tokens.get(&token_id).cloned())
    }

    async fn consume_token(&self, token_id: Uuid, consumed_at: DateTime<Utc>) -> Result<bool, StorageError> {
        self.enter().await?;
        // Check and set under one write guard
        let mut state = self.state.write().await;
        match state.tokens.get_mut(&token_id) {
            Some(token) if !token.consumed => {
                token.consumed = true;
                token.consumed_at = Some(consumed_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn authorities_for_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<Authority>, StorageError> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(Self::reachable(&state, user_id, tenant_id))
    }

    async fn menu_authorities_for_user(
        &self,
        user_id: &str,
        tenant_id: &str,
        url_prefix: &str,
    ) -> Result<Vec<Authority>, StorageError> {
        self.enter().await?;
        let state = self.state.read().await;
        Ok(Self::reachable(&state, user_id, tenant_id)
            .into_iter()
            .filter(|a| matches!(a.method, AuthorityMethod::Show | AuthorityMethod::Disable))
            .filter(|a| a.url_pattern.starts_with(url_prefix))
            .collect())
    }

    async fn ping(&self) -> Result<(), StorageError> {
        self.enter().await
    }
}
