use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    AppState,
    error::AppError,
    middleware::CurrentUser,
    session::{SESSION_COOKIE, Session},
    utils::success_to_api_response,
};

use super::model::{Account, LoginRequest, RegisterRequest, validate_registration};

fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;
    validate_registration(&req)?;

    let role = req.role;
    let account = Account::create(&state.pool, req).await?;
    tracing::info!("registered {} account {}", role.as_str(), account.id);

    let session =
        Session::create(&state.redis, &account.id, role, state.config.session_ttl_secs).await?;

    Ok((
        jar.add(session_cookie(session.session_id)),
        (StatusCode::CREATED, success_to_api_response(account)),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    // One generic rejection for unknown user and wrong password alike.
    let invalid = || AppError::Auth("Invalid username or password".into());

    let account = Account::find_by_username(&state.pool, &req.username)
        .await
        .map_err(AppError::from)?
        .ok_or_else(invalid)?;

    let verified = crate::utils::verify_password(&req.password, &account.password_hash)
        .map_err(|e| AppError::Storage(format!("password verification failed: {}", e)))?;
    if !verified {
        return Err(invalid());
    }

    let session = Session::create(
        &state.redis,
        &account.id,
        account.role(),
        state.config.session_ttl_secs,
    )
    .await?;

    Ok((
        jar.add(session_cookie(session.session_id)),
        (StatusCode::OK, success_to_api_response(account)),
    ))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    Session::destroy(&state.redis, &user.session_id).await?;

    Ok((
        jar.remove(expired_session_cookie()),
        (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "success": true })),
        ),
    ))
}

#[axum::debug_handler]
pub async fn current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let account = Account::find_by_id(&state.pool, &user.account_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Auth("Session account no longer exists".into()))?;

    Ok((StatusCode::OK, success_to_api_response(account)))
}
