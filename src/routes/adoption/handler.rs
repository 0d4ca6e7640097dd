use axum::{
    extract::{Json, Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState, error::AppError, middleware::CurrentUser, upload, utils::success_to_api_response,
};

use super::model::{AdoptableAnimal, ListingStatus, NewListing};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ListingStatus,
}

#[axum::debug_handler]
pub async fn list_available(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let animals = AdoptableAnimal::list_available(&state.pool).await?;
    Ok((StatusCode::OK, success_to_api_response(animals)))
}

#[axum::debug_handler]
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let animal = AdoptableAnimal::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal not found".into()))?;

    Ok((StatusCode::OK, success_to_api_response(animal)))
}

#[axum::debug_handler]
pub async fn list_mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require_ngo()?;

    let animals = AdoptableAnimal::list_by_ngo(&state.pool, &user.account_id).await?;
    Ok((StatusCode::OK, success_to_api_response(animals)))
}

#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    user.require_ngo()?;

    let (fields, photo) = upload::collect_form(
        &state.config.upload_dir,
        state.config.max_upload_bytes,
        multipart,
    )
    .await?;

    let listing = match NewListing::from_fields(&fields) {
        Ok(listing) => listing,
        Err(e) => {
            if let Some(stored) = &photo {
                upload::discard(stored).await;
            }
            return Err(e);
        }
    };

    let photo_url = photo.map(|stored| stored.url_path);
    let animal = AdoptableAnimal::create(&state.pool, listing, &user.account_id, photo_url).await?;
    tracing::info!("new adoption listing {} by {}", animal.id, user.account_id);

    Ok((StatusCode::CREATED, success_to_api_response(animal)))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    user.require_ngo()?;
    let Json(req) = payload.map_err(|_| AppError::Validation("Invalid status".into()))?;

    let animal = AdoptableAnimal::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal not found".into()))?;
    if animal.listed_by != user.account_id {
        return Err(AppError::Forbidden(
            "Only the listing NGO may update this animal".into(),
        ));
    }

    let updated = AdoptableAnimal::update_status(&state.pool, &id, req.status)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal not found".into()))?;

    Ok((StatusCode::OK, success_to_api_response(updated)))
}

#[axum::debug_handler]
pub async fn delete(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require_ngo()?;

    let animal = AdoptableAnimal::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal not found".into()))?;
    if animal.listed_by != user.account_id {
        return Err(AppError::Forbidden(
            "Only the listing NGO may delete this animal".into(),
        ));
    }

    AdoptableAnimal::delete(&state.pool, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
