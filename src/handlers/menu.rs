use axum::extract::{Extension, Path, State};

use crate::authz::MenuItem;
use crate::context::AppContext;
use crate::middleware::{ApiResponse, ApiResult, Principal};

/// GET /api/menu/:site
pub async fn resolve(
    State(ctx): State<AppContext>,
    Extension(principal): Extension<Principal>,
    Path(site): Path<String>,
) -> ApiResult<Vec<MenuItem>> {
    let items = ctx
        .menu()
        .resolve_menu(&principal.user_id, &principal.tenant_id, &site)
        .await?;
    Ok(ApiResponse::success(items))
}
