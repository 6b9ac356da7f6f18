//! Delegation tokens: short-lived signed credentials that authorize one
//! follow-up action (password reset, invite acceptance).
//!
//! A token moves `Issued -> Consumed` exactly once. Expiry is checked only
//! by introspection and is independent of that state.

pub mod error;
pub mod issuer;
pub mod keys;
pub mod ledger;
pub mod verifier;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::{KeyError, TokenError, ValidationReason};
pub use issuer::{IssueRequest, TokenIssuer};
pub use keys::SigningKeys;
pub use ledger::TokenConsumptionLedger;
pub use verifier::TokenVerifier;

/// Claims carried by every delegation token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationClaims {
    /// Constant issuer identity of this service
    pub iss: String,
    /// Subject user the token acts for
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
    /// User who requested issuance
    #[serde(rename = "uid")]
    pub issuer_user_id: String,
    #[serde(rename = "tid")]
    pub tenant_id: String,
    #[serde(rename = "typ")]
    pub token_type: String,
    #[serde(default)]
    pub scope: Vec<String>,
}
