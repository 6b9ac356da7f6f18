use chrono::{Duration as ChronoDuration, SubsecRound, Utc};
use jsonwebtoken::{encode, Header};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::error::{KeyError, TokenError};
use super::keys::SigningKeys;
use super::DelegationClaims;
use crate::config::TokenConfig;
use crate::database::models::DelegationToken;
use crate::database::{with_deadline, IdentityStore};

/// Input for a single issuance
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub issuer_id: String,
    pub tenant_id: String,
    pub subject_id: String,
    pub type_code: String,
    pub scope: Vec<String>,
}

impl IssueRequest {
    fn validate(&self) -> Result<(), TokenError> {
        let required = [
            ("issuer", &self.issuer_id),
            ("tenant", &self.tenant_id),
            ("subject", &self.subject_id),
            ("type", &self.type_code),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(TokenError::InvalidRequest(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }
}

/// Mints delegation tokens. A token is only handed back once its row is
/// durably recorded; a failed insert means no token exists anywhere.
pub struct TokenIssuer<'a> {
    keys: &'a SigningKeys,
    store: &'a dyn IdentityStore,
    config: &'a TokenConfig,
    timeout: Duration,
}

impl<'a> TokenIssuer<'a> {
    pub fn new(keys: &'a SigningKeys, store: &'a dyn IdentityStore, config: &'a TokenConfig, timeout: Duration) -> Self {
        Self {
            keys,
            store,
            config,
            timeout,
        }
    }

    /// Override the store deadline for this call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn issue(&self, request: &IssueRequest) -> Result<String, TokenError> {
        request.validate()?;

        // Whole seconds so the row mirrors the claims exactly
        let issued_at = Utc::now().trunc_subsecs(0);
        let ttl = self.config.ttl_minutes;
        let expires_at = ChronoDuration::try_minutes(ttl)
            .filter(|_| TokenConfig::valid_ttl(ttl))
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or(TokenError::InvalidTtl(ttl))?;

        let claims = DelegationClaims {
            iss: self.config.issuer.clone(),
            sub: request.subject_id.clone(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4(),
            issuer_user_id: request.issuer_id.clone(),
            tenant_id: request.tenant_id.clone(),
            token_type: request.type_code.clone(),
            scope: request.scope.clone(),
        };

        let signed_value = encode(&Header::new(self.keys.algorithm()), &claims, self.keys.encoding_key())
            .map_err(|e| KeyError::Signing(e.to_string()))?;

        let record = DelegationToken {
            token_id: claims.jti,
            type_code: claims.token_type.clone(),
            tenant_id: claims.tenant_id.clone(),
            subject_user_id: claims.sub.clone(),
            issuer_user_id: claims.issuer_user_id.clone(),
            issued_at,
            expires_at,
            scope: claims.scope.clone(),
            signed_value,
            consumed: false,
            consumed_at: None,
        };

        with_deadline(self.timeout, self.store.insert_token(&record)).await?;

        info!(
            "Issued {} token {} for subject '{}' in tenant '{}'",
            record.type_code, record.token_id, record.subject_user_id, record.tenant_id
        );
        Ok(record.signed_value)
    }
}
