use std::sync::Arc;
use std::time::Duration;

use crate::auth::{KeyError, SigningKeys, TokenConsumptionLedger, TokenIssuer, TokenVerifier};
use crate::authz::{AuthorizationEngine, MenuVisibilityResolver};
use crate::config::AppConfig;
use crate::database::IdentityStore;

/// Process-wide state, constructed once at startup and read-only after.
/// Cloning only bumps a reference count.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: AppConfig,
    keys: SigningKeys,
    store: Arc<dyn IdentityStore>,
}

impl AppContext {
    pub fn new(config: AppConfig, keys: SigningKeys, store: Arc<dyn IdentityStore>) -> Result<Self, KeyError> {
        if config.is_production() && keys.is_ephemeral() {
            return Err(KeyError::NotConfigured("ephemeral signing keys are refused in production"));
        }

        Ok(Self {
            inner: Arc::new(ContextInner { config, keys, store }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn keys(&self) -> &SigningKeys {
        &self.inner.keys
    }

    pub fn store(&self) -> &dyn IdentityStore {
        self.inner.store.as_ref()
    }

    fn store_timeout(&self) -> Duration {
        self.inner.config.database.statement_timeout()
    }

    pub fn issuer(&self) -> TokenIssuer<'_> {
        TokenIssuer::new(&self.inner.keys, self.store(), &self.inner.config.tokens, self.store_timeout())
    }

    pub fn verifier(&self) -> TokenVerifier<'_> {
        TokenVerifier::new(&self.inner.keys, &self.inner.config.tokens)
    }

    pub fn ledger(&self) -> TokenConsumptionLedger<'_> {
        TokenConsumptionLedger::new(self.store(), self.store_timeout())
    }

    pub fn authorizer(&self) -> AuthorizationEngine<'_> {
        AuthorizationEngine::new(self.store(), self.inner.config.authz.pattern_match, self.store_timeout())
    }

    pub fn menu(&self) -> MenuVisibilityResolver<'_> {
        MenuVisibilityResolver::new(self.store(), self.inner.config.authz.pattern_match, self.store_timeout())
    }
}
