use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::principal::Principal;
use crate::context::AppContext;
use crate::error::ApiError;

/// Runs the authorization engine for the request method and path before
/// any handler. Denials and store faults both stop the request.
pub async fn authorize_middleware(
    State(ctx): State<AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Principal required before authorization"))?;

    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    let allowed = ctx
        .authorizer()
        .is_authorized(&principal.user_id, &principal.tenant_id, &method, &path)
        .await?;

    if !allowed {
        tracing::warn!(
            "Authorization denied: '{}' in tenant '{}' may not {} {}",
            principal.user_id, principal.tenant_id, method, path
        );
        return Err(ApiError::forbidden(format!("Not permitted to {} {}", method, path)));
    }

    Ok(next.run(request).await)
}
