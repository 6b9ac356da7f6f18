use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::role::Audit;
use crate::database::StorageError;

/// Method column of an authority. `ALL` matches any verb; `SHOW` and
/// `DISABLE` only ever drive menu visibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum AuthorityMethod {
    Verb(String),
    All,
    Show,
    Disable,
}

impl AuthorityMethod {
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_ascii_uppercase();
        match upper.as_str() {
            "" => None,
            "ALL" => Some(AuthorityMethod::All),
            "SHOW" => Some(AuthorityMethod::Show),
            "DISABLE" => Some(AuthorityMethod::Disable),
            verb if verb.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(AuthorityMethod::Verb(verb.to_string()))
            }
            _ => None,
        }
    }

    /// Whether this authority grants the given request verb
    pub fn grants(&self, method: &str) -> bool {
        match self {
            AuthorityMethod::All => true,
            // Stored verbs are upper-cased on parse; request verbs compare as-is
            AuthorityMethod::Verb(verb) => verb == method,
            AuthorityMethod::Show | AuthorityMethod::Disable => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AuthorityMethod::Verb(verb) => verb,
            AuthorityMethod::All => "ALL",
            AuthorityMethod::Show => "SHOW",
            AuthorityMethod::Disable => "DISABLE",
        }
    }
}

impl fmt::Display for AuthorityMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AuthorityMethod> for String {
    fn from(method: AuthorityMethod) -> Self {
        method.as_str().to_string()
    }
}

impl TryFrom<String> for AuthorityMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AuthorityMethod::parse(&value).ok_or_else(|| format!("unrecognised authority method '{}'", value))
    }
}

/// Raw authority row as selected from the store
#[derive(Debug, Clone, FromRow)]
pub struct AuthorityRow {
    pub authority_id: Uuid,
    pub name: String,
    pub url_pattern: String,
    pub method: String,
    pub tenant_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub authority_id: Uuid,
    pub name: String,
    pub url_pattern: String,
    pub method: AuthorityMethod,
    pub tenant_id: String,
}

impl TryFrom<AuthorityRow> for Authority {
    type Error = StorageError;

    fn try_from(row: AuthorityRow) -> Result<Self, Self::Error> {
        let method = AuthorityMethod::parse(&row.method).ok_or_else(|| {
            StorageError::Decode(format!(
                "authority {} has unrecognised method '{}'",
                row.authority_id, row.method
            ))
        })?;

        Ok(Authority {
            authority_id: row.authority_id,
            name: row.name,
            url_pattern: row.url_pattern,
            method,
            tenant_id: row.tenant_id,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAuthorityBinding {
    pub role_id: Uuid,
    pub authority_id: Uuid,
    pub active: bool,
    pub audit: Audit,
}
