use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use reqwest::Url;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::application::{Application, ApplicationStatus};
use crate::routes::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub url: Option<String>,
    pub status: Option<String>,
}

/// POST /applications/import
pub async fn handle_import(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Application>>), AppError> {
    let Json(req) = payload?;
    let url = validate_url(req.url.as_deref())?;
    let requested_status = req
        .status
        .as_deref()
        .map(str::parse::<ApplicationStatus>)
        .transpose()?;

    let application = state
        .importer
        .import_from_link(url.as_str(), requested_status)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::json(application)))
}

fn validate_url(raw: Option<&str>) -> Result<Url, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Validation("url is required".to_string()))?;

    let url = Url::parse(raw)
        .map_err(|e| AppError::Validation(format!("url '{raw}' is invalid: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::Validation(
            "url must use http or https".to_string(),
        ));
    }
    Ok(url)
}
