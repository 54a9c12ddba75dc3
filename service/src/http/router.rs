use core::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    routing::{self, IntoMakeService, get},
};
use tower::ServiceBuilder;
use tower_http::{
    ServiceBuilderExt as _, request_id::MakeRequestUuid, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::{app::AppState, http::api};

/// Scans of slow network storage can take a while.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Builds the router with all routes, state and middleware applied.
///
/// `/version` is served both at the root and under `/api/1.0`.
pub fn create_router(app_state: AppState) -> Router {
    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .propagate_x_request_id()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            REQUEST_TIMEOUT,
        ));

    Router::new()
        .route("/version", get(api::get_version))
        .nest("/api/1.0", api::routes())
        .with_state(app_state)
        .fallback(routing::any(|req: Request<Body>| async move {
            tracing::warn!(method = %req.method(), uri = %req.uri(), "Unhandled request");
            StatusCode::NOT_FOUND
        }))
        .layer(middleware_stack)
}

pub(crate) fn create_app(app_state: AppState) -> IntoMakeService<Router<()>> {
    create_router(app_state).into_make_service()
}
