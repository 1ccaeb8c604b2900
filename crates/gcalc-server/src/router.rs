//! Router assembly for the gcalc HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{get, post};
use axum::Router;
use gcalc_session::ExpressionCompiler;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
pub fn build_router<C: ExpressionCompiler + 'static>(state: AppState<C>) -> Router {
    Router::new()
        // Equations
        .route(
            "/equations",
            get(handlers::equations::list_equations::<C>)
                .post(handlers::equations::create_equation::<C>),
        )
        .route(
            "/equations/{id}",
            get(handlers::equations::get_equation::<C>)
                .put(handlers::equations::edit_equation::<C>)
                .delete(handlers::equations::delete_equation::<C>),
        )
        .route(
            "/equations/{id}/visibility",
            post(handlers::equations::toggle_visibility::<C>),
        )
        .route(
            "/equations/{id}/refresh",
            post(handlers::equations::refresh_equation::<C>),
        )
        // Rendering
        .route(
            "/viewport",
            get(handlers::render::get_viewport::<C>).put(handlers::render::update_viewport::<C>),
        )
        .route("/frame", get(handlers::render::latest_frame::<C>))
        // Offline inspection
        .route("/scan", post(handlers::scan::scan))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
