use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Caller identity as asserted by the upstream identity provider
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub tenant_id: String,
}

/// Extracts the principal from gateway headers and injects it into the request
pub async fn principal_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = extract_principal(request.headers()).map_err(ApiError::unauthorized)?;

    tracing::debug!("Request principal: '{}' in tenant '{}'", principal.user_id, principal.tenant_id);
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn extract_principal(headers: &HeaderMap) -> Result<Principal, String> {
    Ok(Principal {
        user_id: header_value(headers, USER_HEADER)?,
        tenant_id: header_value(headers, TENANT_HEADER)?,
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<String, String> {
    let value = headers
        .get(name)
        .ok_or_else(|| format!("Missing {} header", name))?
        .to_str()
        .map_err(|_| format!("Invalid {} header format", name))?
        .trim();

    if value.is_empty() {
        return Err(format!("Empty {} header", name));
    }
    Ok(value.to_string())
}
