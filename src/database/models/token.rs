use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Persisted delegation token; mirrors every claim of the signed value
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DelegationToken {
    pub token_id: Uuid,
    pub type_code: String,
    pub tenant_id: String,
    pub subject_user_id: String,
    pub issuer_user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub scope: Vec<String>,
    pub signed_value: String,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
    Issued,
    Consumed,
}

impl DelegationToken {
    pub fn state(&self) -> TokenState {
        if self.consumed {
            TokenState::Consumed
        } else {
            TokenState::Issued
        }
    }
}
