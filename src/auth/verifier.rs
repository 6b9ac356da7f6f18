use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use tracing::debug;
use uuid::Uuid;

use super::error::{TokenError, ValidationReason};
use super::keys::SigningKeys;
use super::DelegationClaims;
use crate::config::TokenConfig;

/// Checks signature, algorithm, issuer, tenant binding and expiry.
/// Never looks at the consumed flag: a token may be introspected many
/// times before it is consumed once.
pub struct TokenVerifier<'a> {
    keys: &'a SigningKeys,
    config: &'a TokenConfig,
}

impl<'a> TokenVerifier<'a> {
    pub fn new(keys: &'a SigningKeys, config: &'a TokenConfig) -> Self {
        Self { keys, config }
    }

    /// `true` only for a well-formed, correctly signed, unexpired token
    /// bound to `expected_tenant`
    pub fn introspect(&self, token: &str, expected_tenant: &str) -> bool {
        match self.verify(token, expected_tenant) {
            Ok(_) => true,
            Err(e) => {
                debug!("Token introspection inactive for tenant '{}': {}", expected_tenant, e);
                false
            }
        }
    }

    pub fn verify(&self, token: &str, expected_tenant: &str) -> Result<DelegationClaims, TokenError> {
        let header = decode_header(token).map_err(|_| ValidationReason::Malformed)?;
        if header.alg != self.keys.algorithm() {
            return Err(ValidationReason::AlgorithmMismatch.into());
        }

        let mut validation = Validation::new(self.keys.algorithm());
        validation.leeway = 0;
        validation.set_issuer(&[self.config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<DelegationClaims>(token, self.keys.decoding_key(), &validation)
            .map_err(|e| reason_for(e.kind()))?;

        if data.claims.tenant_id != expected_tenant {
            return Err(ValidationReason::TenantMismatch.into());
        }

        Ok(data.claims)
    }

    /// Token id of a token that verifies for `expected_tenant`
    pub fn token_id(&self, token: &str, expected_tenant: &str) -> Result<Uuid, TokenError> {
        self.verify(token, expected_tenant).map(|claims| claims.jti)
    }
}

fn reason_for(kind: &ErrorKind) -> ValidationReason {
    match kind {
        ErrorKind::ExpiredSignature => ValidationReason::Expired,
        ErrorKind::InvalidSignature => ValidationReason::BadSignature,
        ErrorKind::InvalidAlgorithm => ValidationReason::AlgorithmMismatch,
        ErrorKind::InvalidIssuer => ValidationReason::WrongIssuer,
        _ => ValidationReason::Malformed,
    }
}
