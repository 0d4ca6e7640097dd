use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    error::AppError,
    routes::auth::model::Role,
    session::{SESSION_COOKIE, Session},
};

/// The authenticated principal, resolved from the session cookie. Handlers
/// that take this as an argument are session-gated; handlers that don't are
/// public.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub account_id: String,
    pub role: Role,
    pub session_id: String,
}

impl CurrentUser {
    pub fn require_ngo(&self) -> Result<(), AppError> {
        match self.role {
            Role::Ngo => Ok(()),
            _ => Err(AppError::Forbidden("NGO access required".into())),
        }
    }

    pub fn require_individual(&self) -> Result<(), AppError> {
        match self.role {
            Role::Individual => Ok(()),
            _ => Err(AppError::Forbidden(
                "Only individual accounts can perform this action".into(),
            )),
        }
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| AppError::Auth("Not authenticated".into()))?;

        let session = Session::fetch(&state.redis, &session_id)
            .await?
            .ok_or_else(|| AppError::Auth("Session expired or invalid".into()))?;

        // Sliding expiry; a failed refresh only shortens the session.
        if let Err(e) =
            Session::touch(&state.redis, &session_id, state.config.session_ttl_secs).await
        {
            tracing::warn!("failed to refresh session ttl: {}", e);
        }

        Ok(CurrentUser {
            account_id: session.account_id,
            role: session.role,
            session_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            account_id: "acc-1".into(),
            role,
            session_id: "sid-1".into(),
        }
    }

    #[test]
    fn role_gates_reject_the_other_role() {
        assert!(user(Role::Ngo).require_ngo().is_ok());
        assert!(user(Role::Individual).require_ngo().is_err());
        assert!(user(Role::Individual).require_individual().is_ok());
        assert!(user(Role::Ngo).require_individual().is_err());
    }
}
