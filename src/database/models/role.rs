use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub role_id: Uuid,
    pub name: String,
    pub is_default: bool,
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
}

impl Audit {
    pub fn created_by(actor: impl Into<String>) -> Self {
        let actor = actor.into();
        let now = Utc::now();
        Self {
            created_by: actor.clone(),
            created_at: now,
            modified_by: actor,
            modified_at: now,
        }
    }
}

/// Binding toggled via `active` rather than deleted while referenced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRoleBinding {
    pub user_id: String,
    pub role_id: Uuid,
    pub active: bool,
    pub audit: Audit,
}
