use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

use super::pattern::{wildcard_match, MatchMode};
use super::AuthzError;
use crate::database::models::{Authority, AuthorityMethod};
use crate::database::{with_deadline, IdentityStore};

const MENU_ROOT: &str = "SIDE_MENU";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub url: String,
    pub method: AuthorityMethod,
}

impl MenuItem {
    pub fn is_disabled(&self) -> bool {
        self.method == AuthorityMethod::Disable
    }
}

/// Derives side-menu affordances for a site. A DISABLE entry always
/// suppresses a SHOW entry with the same url.
pub struct MenuVisibilityResolver<'a> {
    store: &'a dyn IdentityStore,
    mode: MatchMode,
    timeout: Duration,
}

impl<'a> MenuVisibilityResolver<'a> {
    pub fn new(store: &'a dyn IdentityStore, mode: MatchMode, timeout: Duration) -> Self {
        Self { store, mode, timeout }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn resolve_menu(&self, user_id: &str, tenant_id: &str, site: &str) -> Result<Vec<MenuItem>, AuthzError> {
        validate_site(site)?;

        let prefix = format!("{}/{}/", MENU_ROOT, site);
        let authorities = with_deadline(
            self.timeout,
            self.store.menu_authorities_for_user(user_id, tenant_id, &prefix),
        )
        .await?;

        let items = resolve(&authorities, site, self.mode);
        debug!("Resolved {} menu items on site '{}' for '{}' in tenant '{}'", items.len(), site, user_id, tenant_id);
        Ok(items)
    }
}

/// Menu scope pattern for a site
pub fn site_pattern(site: &str) -> String {
    format!("{}/{}/*", MENU_ROOT, site)
}

fn validate_site(site: &str) -> Result<(), AuthzError> {
    if site.is_empty() || site.contains('/') || site.contains('*') {
        return Err(AuthzError::InvalidSite(site.to_string()));
    }
    Ok(())
}

/// DISABLE entries first, then SHOW entries whose url is not disabled,
/// returned together ordered by name
pub fn resolve(authorities: &[Authority], site: &str, mode: MatchMode) -> Vec<MenuItem> {
    let scope = site_pattern(site);
    let in_scope = |a: &&Authority| wildcard_match(&scope, &a.url_pattern, mode);

    let disabled: Vec<&Authority> = authorities
        .iter()
        .filter(in_scope)
        .filter(|a| a.method == AuthorityMethod::Disable)
        .collect();
    let disabled_urls: HashSet<&str> = disabled.iter().map(|a| a.url_pattern.as_str()).collect();

    let shown = authorities
        .iter()
        .filter(in_scope)
        .filter(|a| a.method == AuthorityMethod::Show)
        .filter(|a| !disabled_urls.contains(a.url_pattern.as_str()));

    let mut items: Vec<MenuItem> = disabled
        .into_iter()
        .chain(shown)
        .map(|a| MenuItem {
            name: a.name.clone(),
            url: a.url_pattern.clone(),
            method: a.method.clone(),
        })
        .collect();

    items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.url.cmp(&b.url)));
    items.dedup();
    items
}
