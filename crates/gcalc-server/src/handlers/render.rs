//! Viewport and frame handlers.

use axum::extract::State;
use axum::Json;
use gcalc_session::ExpressionCompiler;

use crate::error::ApiError;
use crate::schema::frame::FrameResponse;
use crate::schema::viewport::{ViewportRequest, ViewportResponse};
use crate::state::AppState;

/// `GET /viewport`
pub async fn get_viewport<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
) -> Json<ViewportResponse> {
    Json(ViewportResponse::from(*state.viewport.borrow()))
}

/// Pans, zooms, resets or replaces the viewport. The next frame picks it up.
///
/// `PUT /viewport`
pub async fn update_viewport<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
    Json(req): Json<ViewportRequest>,
) -> Result<Json<ViewportResponse>, ApiError> {
    let mut applied = true;
    state.viewport.send_if_modified(|viewport| {
        let before = *viewport;
        applied = req.apply(viewport);
        *viewport != before
    });
    if !applied {
        return Err(ApiError::BadRequest(
            "viewport mantissa must be 1, 2 or 5 and footprint positive".to_string(),
        ));
    }

    let viewport = *state.viewport.borrow();
    tracing::debug!("viewport now {:?}", viewport);
    Ok(Json(ViewportResponse::from(viewport)))
}

/// The most recent frame presented by the render loop.
///
/// `GET /frame`
pub async fn latest_frame<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
) -> Result<Json<FrameResponse>, ApiError> {
    let frames = state.frames.borrow();
    match frames.as_ref() {
        Some(frame) => Ok(Json(FrameResponse::from(frame))),
        None => Err(ApiError::Unavailable("no frame presented yet".to_string())),
    }
}
