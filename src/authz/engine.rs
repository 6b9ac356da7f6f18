use std::time::Duration;
use tracing::{debug, error, warn};

use super::pattern::{is_literal_prefix_widening, wildcard_match, MatchMode};
use super::AuthzError;
use crate::database::models::Authority;
use crate::database::{with_deadline, IdentityStore};

/// Decides whether a principal may perform `(method, path)` in a tenant.
/// Any matching authority grants access; no match denies.
pub struct AuthorizationEngine<'a> {
    store: &'a dyn IdentityStore,
    mode: MatchMode,
    timeout: Duration,
}

impl<'a> AuthorizationEngine<'a> {
    pub fn new(store: &'a dyn IdentityStore, mode: MatchMode, timeout: Duration) -> Self {
        Self { store, mode, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn is_authorized(
        &self,
        user_id: &str,
        tenant_id: &str,
        method: &str,
        path: &str,
    ) -> Result<bool, AuthzError> {
        let authorities = with_deadline(self.timeout, self.store.authorities_for_user(user_id, tenant_id)).await?;

        match find_grant(&authorities, method, path, self.mode) {
            Some(authority) => {
                if let Some(widened) = widening_only_grant(&authorities, method, path, self.mode) {
                    warn!(
                        "Literal pattern '{}' (authority '{}') granted {} {} by prefix match",
                        widened.url_pattern, widened.name, method, path
                    );
                }
                debug!("Granted {} {} to '{}' in tenant '{}' via '{}'", method, path, user_id, tenant_id, authority.name);
                Ok(true)
            }
            None => {
                debug!("Denied {} {} to '{}' in tenant '{}'", method, path, user_id, tenant_id);
                Ok(false)
            }
        }
    }

    /// Fail-closed form: store faults deny
    pub async fn allows(&self, user_id: &str, tenant_id: &str, method: &str, path: &str) -> bool {
        match self.is_authorized(user_id, tenant_id, method, path).await {
            Ok(allowed) => allowed,
            Err(e) => {
                error!("Authorization lookup failed for '{}' in tenant '{}', denying: {}", user_id, tenant_id, e);
                false
            }
        }
    }
}

/// First authority whose method and url pattern both admit the request
pub fn find_grant<'a>(authorities: &'a [Authority], method: &str, path: &str, mode: MatchMode) -> Option<&'a Authority> {
    authorities
        .iter()
        .find(|a| a.method.grants(method) && wildcard_match(&a.url_pattern, path, mode))
}

/// The grant to flag when every authority admitting the request is a
/// literal pattern that only matched as a prefix
pub fn widening_only_grant<'a>(
    authorities: &'a [Authority],
    method: &str,
    path: &str,
    mode: MatchMode,
) -> Option<&'a Authority> {
    if mode != MatchMode::AnchoredPrefix {
        return None;
    }
    let mut grants = authorities
        .iter()
        .filter(|a| a.method.grants(method) && wildcard_match(&a.url_pattern, path, mode))
        .peekable();
    let first = *grants.peek()?;
    grants
        .all(|a| is_literal_prefix_widening(&a.url_pattern, path))
        .then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::AuthorityMethod;
    use crate::database::{MemoryIdentityStore, StorageError};
    use uuid::Uuid;

    fn authority(url: &str, method: AuthorityMethod) -> Authority {
        Authority {
            authority_id: Uuid::new_v4(),
            name: format!("{} {}", method, url),
            url_pattern: url.into(),
            method,
            tenant_id: "t1".into(),
        }
    }

    #[test]
    fn verb_and_pattern_must_both_match() {
        let set = vec![authority("/users/*", AuthorityMethod::Verb("GET".into()))];
        let prefix = MatchMode::AnchoredPrefix;
        assert!(find_grant(&set, "GET", "/users/5", prefix).is_some());
        assert!(find_grant(&set, "GET", "/users/5/groups", prefix).is_some());
        assert!(find_grant(&set, "POST", "/users/5", prefix).is_none());
        assert!(find_grant(&set, "GET", "/groups/5", prefix).is_none());
    }

    #[test]
    fn all_sentinel_matches_any_verb() {
        let set = vec![authority("/reports/*", AuthorityMethod::All)];
        assert!(find_grant(&set, "DELETE", "/reports/1", MatchMode::AnchoredPrefix).is_some());
    }

    #[test]
    fn menu_sentinels_grant_nothing() {
        let set = vec![
            authority("/users/*", AuthorityMethod::Show),
            authority("/users/*", AuthorityMethod::Disable),
        ];
        assert!(find_grant(&set, "GET", "/users/5", MatchMode::AnchoredPrefix).is_none());
    }

    #[test]
    fn widening_is_flagged_only_without_another_grant() {
        let literal = authority("/users", AuthorityMethod::Verb("GET".into()));
        let wildcard = authority("/users*", AuthorityMethod::Verb("GET".into()));
        let prefix = MatchMode::AnchoredPrefix;

        let only_literal = vec![literal.clone()];
        let flagged = widening_only_grant(&only_literal, "GET", "/usersXYZ", prefix);
        assert_eq!(flagged.map(|a| a.authority_id), Some(literal.authority_id));

        let literal_first = vec![literal.clone(), wildcard.clone()];
        assert!(widening_only_grant(&literal_first, "GET", "/usersXYZ", prefix).is_none());
        let wildcard_first = vec![wildcard, literal.clone()];
        assert!(widening_only_grant(&wildcard_first, "GET", "/usersXYZ", prefix).is_none());

        assert!(widening_only_grant(&only_literal, "GET", "/users", prefix).is_none());
        assert!(widening_only_grant(&only_literal, "GET", "/usersXYZ", MatchMode::FullString).is_none());
    }

    #[test]
    fn empty_set_denies() {
        assert!(find_grant(&[], "GET", "/", MatchMode::AnchoredPrefix).is_none());
    }

    #[tokio::test]
    async fn store_failure_is_an_error_and_allows_denies() {
        let store = MemoryIdentityStore::new();
        let role = store.add_role("t1", "admin").await;
        let all = store.add_authority("t1", "everything", "*", "ALL").await;
        store.bind_user_role("alice", role, true).await;
        store.bind_role_authority(role, all, true).await;

        let engine = AuthorizationEngine::new(&store, MatchMode::AnchoredPrefix, Duration::from_secs(1));
        assert!(engine.allows("alice", "t1", "GET", "/x").await);

        store.set_unavailable(true);
        assert!(matches!(
            engine.is_authorized("alice", "t1", "GET", "/x").await,
            Err(AuthzError::Storage(StorageError::Unavailable(_)))
        ));
        assert!(!engine.allows("alice", "t1", "GET", "/x").await);
    }

    #[tokio::test]
    async fn timeout_denies() {
        let store = MemoryIdentityStore::new();
        store.set_latency(Some(Duration::from_millis(200))).await;
        let engine = AuthorizationEngine::new(&store, MatchMode::AnchoredPrefix, Duration::from_secs(5))
            .with_timeout(Duration::from_millis(20));

        assert!(matches!(
            engine.is_authorized("alice", "t1", "GET", "/x").await,
            Err(AuthzError::Storage(StorageError::Timeout(_)))
        ));
    }
}
