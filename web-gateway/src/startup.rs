use axum::{Router, middleware::from_fn_with_state, routing::get, routing::post};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler},
    content::chapter_handler,
};
use crate::middleware::route_guard;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/chapters/:chapter", get(chapter_handler))
        .layer(from_fn_with_state(state.clone(), route_guard))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .with_state(state)
}
