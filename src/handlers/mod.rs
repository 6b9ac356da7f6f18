pub mod health;
pub mod menu;
pub mod tokens;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::{authorize_middleware, principal_middleware};

/// Full HTTP surface. Every `/api` route passes the principal and
/// authorization middleware before its handler runs.
pub fn router(ctx: AppContext) -> Router {
    let api: Router<AppContext> = Router::new()
        .route("/api/tokens", post(tokens::issue))
        .route("/api/tokens/introspect", post(tokens::introspect))
        .route("/api/tokens/consume", post(tokens::consume))
        .route("/api/menu/:site", get(menu::resolve))
        // Layers run outermost-last: principal first, then authorization
        .route_layer(middleware::from_fn_with_state(ctx.clone(), authorize_middleware))
        .route_layer(middleware::from_fn(principal_middleware));

    let mut app = Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .with_state(ctx.clone());

    if ctx.config().api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }
    app
}
