use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::IssueRequest;
use crate::context::AppContext;
use crate::middleware::{ApiResponse, ApiResult, Principal};

#[derive(Debug, Deserialize)]
pub struct IssueBody {
    pub subject: String,
    #[serde(rename = "type")]
    pub type_code: String,
    #[serde(default)]
    pub scope: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct IssueResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenBody {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct IntrospectResponse {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    pub consumed: bool,
}

/// POST /api/tokens - issue a delegation token on behalf of the caller
pub async fn issue(
    State(ctx): State<AppContext>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<IssueBody>,
) -> ApiResult<IssueResponse> {
    let request = IssueRequest {
        issuer_id: principal.user_id,
        tenant_id: principal.tenant_id,
        subject_id: body.subject,
        type_code: body.type_code,
        scope: body.scope,
    };

    let token = ctx.issuer().issue(&request).await?;
    Ok(ApiResponse::created(IssueResponse { token }))
}

/// POST /api/tokens/introspect - inactive tokens are a normal answer, not an error
pub async fn introspect(
    State(ctx): State<AppContext>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<TokenBody>,
) -> ApiResult<IntrospectResponse> {
    let active = ctx.verifier().introspect(&body.token, &principal.tenant_id);
    Ok(ApiResponse::success(IntrospectResponse { active }))
}

/// POST /api/tokens/consume - single use; a replay answers 409
pub async fn consume(
    State(ctx): State<AppContext>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<TokenBody>,
) -> ApiResult<ConsumeResponse> {
    let token_id = ctx.verifier().token_id(&body.token, &principal.tenant_id)?;
    ctx.ledger().consume(token_id).await?;
    Ok(ApiResponse::success(ConsumeResponse { consumed: true }))
}
