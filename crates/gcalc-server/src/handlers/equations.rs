//! Equation handlers (list, create, edit, delete, visibility, refresh).

use axum::extract::{Path, State};
use axum::Json;
use gcalc_core::{EquationId, EquationView};
use gcalc_session::ExpressionCompiler;

use crate::error::ApiError;
use crate::schema::equations::{
    DeleteEquationResponse, EditEquationRequest, EditEquationResponse, EquationListResponse,
};
use crate::state::AppState;

/// Lists all equations with the defined names.
///
/// `GET /equations`
pub async fn list_equations<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
) -> Json<EquationListResponse> {
    let listing = state.session.listing().await;
    Json(EquationListResponse {
        equations: listing.equations,
        functions: listing.functions,
        variables: listing.variables,
    })
}

/// Appends an empty equation.
///
/// `POST /equations`
pub async fn create_equation<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
) -> Result<Json<EquationView>, ApiError> {
    Ok(Json(state.session.create().await?))
}

/// `GET /equations/{id}`
pub async fn get_equation<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<u32>,
) -> Result<Json<EquationView>, ApiError> {
    Ok(Json(state.session.view(EquationId(id)).await?))
}

/// Replaces an equation's text and runs the edit protocol.
///
/// `PUT /equations/{id}`
pub async fn edit_equation<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<u32>,
    Json(req): Json<EditEquationRequest>,
) -> Result<Json<EditEquationResponse>, ApiError> {
    let id = EquationId(id);
    let report = state.session.edit(id, req.text, req.hint).await?;
    let equation = state.session.view(id).await?;
    Ok(Json(EditEquationResponse::new(equation, &report)))
}

/// Re-runs the edit protocol on the current text.
///
/// `POST /equations/{id}/refresh`
pub async fn refresh_equation<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<u32>,
) -> Result<Json<EditEquationResponse>, ApiError> {
    let id = EquationId(id);
    let report = state.session.refresh(id).await?;
    let equation = state.session.view(id).await?;
    Ok(Json(EditEquationResponse::new(equation, &report)))
}

/// `DELETE /equations/{id}`
pub async fn delete_equation<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<u32>,
) -> Result<Json<DeleteEquationResponse>, ApiError> {
    let report = state.session.delete(EquationId(id)).await?;
    Ok(Json(DeleteEquationResponse::from(&report)))
}

/// Shows or hides an equation's curve.
///
/// `POST /equations/{id}/visibility`
pub async fn toggle_visibility<C: ExpressionCompiler + 'static>(
    State(state): State<AppState<C>>,
    Path(id): Path<u32>,
) -> Result<Json<EquationView>, ApiError> {
    Ok(Json(state.session.toggle_visibility(EquationId(id)).await?))
}
