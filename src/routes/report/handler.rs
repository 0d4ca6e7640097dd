use axum::{
    extract::{Json, Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::AppError,
    middleware::CurrentUser,
    routes::auth::model::Role,
    upload,
    utils::success_to_api_response,
};

use super::model::{NewReport, ReportStatus, ReportedAnimal};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ReportStatus,
}

/// NGOs see every case; individuals only their own.
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let animals = match user.role {
        Role::Ngo => ReportedAnimal::list_all(&state.pool).await?,
        Role::Individual => {
            ReportedAnimal::list_by_reporter(&state.pool, &user.account_id).await?
        }
    };

    Ok((StatusCode::OK, success_to_api_response(animals)))
}

#[axum::debug_handler]
pub async fn get_by_id(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let animal = ReportedAnimal::find_by_id(&state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal not found".into()))?;

    if user.role != Role::Ngo && animal.reported_by != user.account_id {
        return Err(AppError::Forbidden(
            "You may only view your own reports".into(),
        ));
    }

    Ok((StatusCode::OK, success_to_api_response(animal)))
}

#[axum::debug_handler]
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    user.require_individual()?;

    let (fields, photo) = upload::collect_form(
        &state.config.upload_dir,
        state.config.max_upload_bytes,
        multipart,
    )
    .await?;

    // The photo is already on disk at this point; a rejected payload must not
    // leave it orphaned.
    let report = match NewReport::from_fields(&fields) {
        Ok(report) => report,
        Err(e) => {
            if let Some(stored) = &photo {
                upload::discard(stored).await;
            }
            return Err(e);
        }
    };

    let photo_url = photo.map(|stored| stored.url_path);
    let animal =
        ReportedAnimal::create(&state.pool, report, &user.account_id, photo_url).await?;
    tracing::info!("new reported case {} by {}", animal.id, user.account_id);

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

    let animal = ReportedAnimal::update_status(&state.pool, &id, req.status, &user.account_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Animal not found".into()))?;

    Ok((StatusCode::OK, success_to_api_response(animal)))
}
