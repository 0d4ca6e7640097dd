use axum::{
    extract::{Json, Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState, error::AppError, middleware::CurrentUser, utils::success_to_api_response,
};

use super::model::{CreateVetRequest, Veterinarian, validate_new_vet};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub location: Option<String>,
    pub limit: Option<i64>,
}

/// Full directory, or a substring search when `location` is given.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let vets = match query.location.as_deref().map(str::trim) {
        Some(location) if !location.is_empty() => {
            Veterinarian::search_nearby(&state.pool, location, query.limit).await?
        }
        _ => Veterinarian::list_all(&state.pool).await?,
    };

    Ok((StatusCode::OK, success_to_api_response(vets)))
}

#[axum::debug_handler]
pub async fn nearby(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let location = query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| AppError::Validation("Missing required parameter 'location'".into()))?;

    let vets = Veterinarian::search_nearby(&state.pool, location, query.limit).await?;
    Ok((StatusCode::OK, success_to_api_response(vets)))
}

#[axum::debug_handler]
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let vet = Veterinarian::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Veterinarian not found".into()))?;

    Ok((StatusCode::OK, success_to_api_response(vet)))
}

/// Any authenticated account may add directory entries; there is no
/// ownership or uniqueness check on them.
#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    _user: CurrentUser,
    payload: Result<Json<CreateVetRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    validate_new_vet(&req)?;

    let vet = Veterinarian::create(&state.pool, req).await?;
    Ok((StatusCode::CREATED, success_to_api_response(vet)))
}
