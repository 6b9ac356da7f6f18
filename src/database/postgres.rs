use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::manager::StorageError;
use super::models::{Authority, AuthorityRow, DelegationToken};
use super::store::IdentityStore;

/// Postgres-backed identity store
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

const AUTHORITIES_FOR_USER: &str = r#"
    SELECT DISTINCT a.authority_id, a.name, a.url_pattern, a.method, a.tenant_id
    FROM user_role_bindings ur
    JOIN roles r
      ON r.role_id = ur.role_id
     AND r.tenant_id = $2
    JOIN role_authority_bindings ra
      ON ra.role_id = r.role_id
     AND ra.active = true
    JOIN authorities a
      ON a.authority_id = ra.authority_id
     AND a.tenant_id = $2
    WHERE ur.user_id = $1
      AND ur.active = true
"#;

const MENU_AUTHORITIES_FOR_USER: &str = r#"
    SELECT DISTINCT a.authority_id, a.name, a.url_pattern, a.method, a.tenant_id
    FROM user_role_bindings ur
    JOIN roles r
      ON r.role_id = ur.role_id
     AND r.tenant_id = $2
    JOIN role_authority_bindings ra
      ON ra.role_id = r.role_id
     AND ra.active = true
    JOIN authorities a
      ON a.authority_id = ra.authority_id
     AND a.tenant_id = $2
    WHERE ur.user_id = $1
      AND ur.active = true
      AND upper(a.method) IN ('SHOW', 'DISABLE')
      AND a.url_pattern LIKE $3 ESCAPE '\'
"#;

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode_authorities(rows: Vec<AuthorityRow>) -> Result<Vec<Authority>, StorageError> {
        rows.into_iter().map(Authority::try_from).collect()
    }
}

/// Escape LIKE metacharacters so the prefix is matched literally
fn like_prefix(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn insert_token(&self, token: &DelegationToken) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO delegation_tokens (
                token_id, type_code, tenant_id, subject_user_id, issuer_user_id,
                issued_at, expires_at, scope, signed_value, consumed, consumed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, false, NULL)
            "#,
        )
        .bind(token.token_id)
        .bind(&token.type_code)
        .bind(&token.tenant_id)
        .bind(&token.subject_user_id)
        .bind(&token.issuer_user_id)
        .bind(token.issued_at)
        .bind(token.expires_at)
        .bind(&token.scope)
        .bind(&token.signed_value)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StorageError::Conflict(format!("token id {} already recorded", token.token_id));
                }
            }
            StorageError::from(e)
        })?;

        tx.commit().await?;
        debug!("Recorded delegation token {}", token.token_id);
        Ok(())
    }

    async fn find_token(&self, token_id: Uuid) -> Result<Option<DelegationToken>, StorageError> {
        let token = sqlx::query_as::<_, DelegationToken>(
            r#"
            SELECT token_id, type_code, tenant_id, subject_user_id, issuer_user_id,
                   issued_at, expires_at, scope, signed_value, consumed, consumed_at
            FROM delegation_tokens
            WHERE token_id = $1
            "#,
        )
        .bind(token_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn consume_token(&self, token_id: Uuid, consumed_at: DateTime<Utc>) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE delegation_tokens
            SET consumed = true, consumed_at = $2
            WHERE token_id = $1
              AND consumed = false
            "#,
        )
        .bind(token_id)
        .bind(consumed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn authorities_for_user(&self, user_id: &str, tenant_id: &str) -> Result<Vec<Authority>, StorageError> {
        let rows = sqlx::query_as::<_, AuthorityRow>(AUTHORITIES_FOR_USER)
            .bind(user_id)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Self::decode_authorities(rows)
    }

    async fn menu_authorities_for_user(
        &self,
        user_id: &str,
        tenant_id: &str,
        url_prefix: &str,
    ) -> Result<Vec<Authority>, StorageError> {
        let rows = sqlx::query_as::<_, AuthorityRow>(MENU_AUTHORITIES_FOR_USER)
            .bind(user_id)
            .bind(tenant_id)
            .bind(like_prefix(url_prefix))
            .fetch_all(&self.pool)
            .await?;

        Self::decode_authorities(rows)
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
