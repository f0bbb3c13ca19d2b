//! Axum route handlers for the Applications API.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::errors::AppError;
use crate::models::application::{
    Application, ApplicationDetail, ApplicationFilter, CreateApplicationInput,
    UpdateApplicationInput,
};
use crate::routes::ApiResponse;
use crate::state::AppState;

/// GET /applications
pub async fn handle_list(
    State(state): State<AppState>,
    query: Result<Query<ApplicationFilter>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<Application>>>, AppError> {
    let Query(filter) = query?;
    let applications = state.store.list(&filter).await?;
    Ok(ApiResponse::json(applications))
}

/// GET /applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    let Path(id) = path?;
    let application = state.store.get(id).await?.ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::json(application))
}

/// GET /applications/:id/detail
pub async fn handle_get_detail(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ApiResponse<ApplicationDetail>>, AppError> {
    let Path(id) = path?;
    let detail = state
        .store
        .get_detail(id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::json(detail))
}

/// POST /applications
pub async fn handle_create(
    State(state): State<AppState>,
    payload: Result<Json<CreateApplicationInput>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Application>>), AppError> {
    let Json(input) = payload?;
    let application = state.store.create(input).await?;
    Ok((StatusCode::CREATED, ApiResponse::json(application)))
}

/// PUT /applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateApplicationInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Application>>, AppError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let application = state
        .store
        .update(id, input)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(ApiResponse::json(application))
}

/// DELETE /applications/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    if state.store.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Application {id} not found"))
}
