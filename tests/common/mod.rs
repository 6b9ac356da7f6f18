#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use tenant_iam::auth::{IssueRequest, SigningKeys};
use tenant_iam::config::AppConfig;
use tenant_iam::database::MemoryIdentityStore;
use tenant_iam::AppContext;

/// Context over an in-memory store with throwaway keys
pub struct Fixture {
    pub ctx: AppContext,
    pub store: Arc<MemoryIdentityStore>,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let mut config = AppConfig::development();
        config.api.enable_request_logging = false;
        Self::with_keys(config, SigningKeys::ephemeral_insecure()?)
    }

    pub fn with_keys(config: AppConfig, keys: SigningKeys) -> Result<Self> {
        let store = Arc::new(MemoryIdentityStore::new());
        let ctx = AppContext::new(config, keys, store.clone())?;
        Ok(Self { ctx, store })
    }

    /// Bind a fresh role holding `authorities` (name, url pattern, method) to a user
    pub async fn grant(&self, tenant: &str, user: &str, authorities: &[(&str, &str, &str)]) {
        let role = self.store.add_role(tenant, &format!("role-{}", user)).await;
        self.store.bind_user_role(user, role, true).await;
        for (name, url, method) in authorities {
            let authority = self.store.add_authority(tenant, name, url, method).await;
            self.store.bind_role_authority(role, authority, true).await;
        }
    }

    pub async fn issue(&self, tenant: &str, subject: &str) -> Result<String> {
        let request = IssueRequest {
            issuer_id: "admin".to_string(),
            tenant_id: tenant.to_string(),
            subject_id: subject.to_string(),
            type_code: "PASSWORD_RESET".to_string(),
            scope: vec!["password:write".to_string()],
        };
        Ok(self.ctx.issuer().issue(&request).await?)
    }

    pub fn app(&self) -> Router {
        tenant_iam::router(self.ctx.clone())
    }
}

pub fn request(method: &str, uri: &str, principal: Option<(&str, &str)>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((user, tenant)) = principal {
        builder = builder.header("x-user-id", user).header("x-tenant-id", tenant);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}
