use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::database::StorageError;

/// Signing material could not be loaded or used
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Failed to read key file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid key material: {0}")]
    Invalid(String),

    #[error("Private and public key do not form a pair")]
    Mismatch,

    #[error("Signing keys not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Key generation failed: {0}")]
    Generation(String),

    #[error("Signing failed: {0}")]
    Signing(String),
}

/// Why a presented token was judged inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationReason {
    #[error("token is malformed")]
    Malformed,
    #[error("unexpected signing algorithm")]
    AlgorithmMismatch,
    #[error("signature does not verify")]
    BadSignature,
    #[error("issuer is not recognised")]
    WrongIssuer,
    #[error("token belongs to another tenant")]
    TenantMismatch,
    #[error("token has expired")]
    Expired,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Token rejected: {0}")]
    Validation(ValidationReason),

    #[error("Token {0} was already consumed or does not exist")]
    ConsumptionConflict(Uuid),

    #[error("Invalid token request: {0}")]
    InvalidRequest(String),

    #[error("Token lifetime of {0} minutes is not usable")]
    InvalidTtl(i64),
}

impl From<ValidationReason> for TokenError {
    fn from(reason: ValidationReason) -> Self {
        TokenError::Validation(reason)
    }
}
