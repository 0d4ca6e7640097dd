use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, error::AppError, middleware::CurrentUser, utils::success_to_api_response,
};

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverseGeocodeResponse {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub in_service_region: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Soft region check: results outside the service region are annotated, not
/// rejected.
fn region_note(
    display_name: &str,
    state_field: Option<&str>,
    region: &str,
) -> (bool, Option<String>) {
    let in_region = state_field == Some(region) || display_name.contains(region);
    if in_region {
        (true, None)
    } else {
        (
            false,
            Some(format!("This location may be outside {}", region)),
        )
    }
}

/// Resolves device coordinates to a street address via the configured
/// third-party geocoder.
#[axum::debug_handler]
pub async fn reverse(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ReverseQuery>,
) -> Result<impl IntoResponse, AppError> {
    let url = format!(
        "{}/reverse?format=json&lat={}&lon={}&zoom=18&addressdetails=1",
        state.config.geocoder_base_url.trim_end_matches('/'),
        query.latitude,
        query.longitude
    );

    let data: serde_json::Value = reqwest::get(&url)
        .await
        .map_err(|e| AppError::Storage(format!("geocoder request failed: {}", e)))?
        .json()
        .await
        .map_err(|e| AppError::Storage(format!("geocoder returned invalid payload: {}", e)))?;

    if data.get("error").is_some() {
        return Err(AppError::Validation(
            "Could not resolve the given coordinates".into(),
        ));
    }

    let display_name = data
        .get("display_name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::Storage("geocoder returned no address".into()))?;
    let state_field = data
        .get("address")
        .and_then(|a| a.get("state"))
        .and_then(|v| v.as_str());

    let (in_service_region, note) =
        region_note(display_name, state_field, &state.config.service_region);

    Ok((
        StatusCode::OK,
        success_to_api_response(ReverseGeocodeResponse {
            address: display_name.to_string(),
            latitude: query.latitude,
            longitude: query.longitude,
            in_service_region,
            note,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_state_is_in_region() {
        let (ok, note) = region_note("12 MG Road, Pune", Some("Maharashtra"), "Maharashtra");
        assert!(ok);
        assert!(note.is_none());
    }

    #[test]
    fn display_name_match_also_counts() {
        let (ok, _) = region_note("Pune, Maharashtra, India", None, "Maharashtra");
        assert!(ok);
    }

    #[test]
    fn elsewhere_gets_an_annotation_not_an_error() {
        let (ok, note) = region_note("Connaught Place, Delhi", Some("Delhi"), "Maharashtra");
        assert!(!ok);
        assert_eq!(
            note.as_deref(),
            Some("This location may be outside Maharashtra")
        );
    }
}
