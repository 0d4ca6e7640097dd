use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

const DEFAULT_SEARCH_LIMIT: i64 = 10;
const MAX_SEARCH_LIMIT: i64 = 50;

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Veterinarian {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: String,
    pub services: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVetRequest {
    pub name: String,
    pub address: String,
    pub location: String,
    pub phone: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Comma-separated on the wire, stored as a list.
    #[serde(default)]
    pub services: Option<String>,
}

pub fn validate_new_vet(req: &CreateVetRequest) -> Result<(), AppError> {
    for (value, label) in [
        (&req.name, "name"),
        (&req.address, "address"),
        (&req.location, "location"),
        (&req.phone, "phone"),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required field '{}'",
                label
            )));
        }
    }
    Ok(())
}

pub fn parse_services(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `%location%` with LIKE metacharacters escaped, for case-insensitive
/// substring matching against the address and location columns.
fn like_pattern(location: &str) -> String {
    let escaped = location
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, MAX_SEARCH_LIMIT)
}

impl Veterinarian {
    pub async fn create(pool: &PgPool, req: CreateVetRequest) -> Result<Self, sqlx::Error> {
        let services = parse_services(req.services.as_deref());

        sqlx::query_as::<_, Veterinarian>(
            r#"
            INSERT INTO veterinarians (
                id, name, address, location, latitude, longitude,
                phone, services, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id, name, address, location, latitude, longitude,
                      phone, services, created_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(req.name.trim())
        .bind(req.address.trim())
        .bind(req.location.trim())
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(req.phone.trim())
        .bind(&services)
        .fetch_one(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Veterinarian>(
            r#"
            SELECT id, name, address, location, latitude, longitude,
                   phone, services, created_at
            FROM veterinarians
            ORDER BY name
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Veterinarian>(
            r#"
            SELECT id, name, address, location, latitude, longitude,
                   phone, services, created_at
            FROM veterinarians
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Substring matching over address and location, not geospatial distance.
    pub async fn search_nearby(
        pool: &PgPool,
        location: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Veterinarian>(
            r#"
            SELECT id, name, address, location, latitude, longitude,
                   phone, services, created_at
            FROM veterinarians
            WHERE address ILIKE $1 OR location ILIKE $1
            ORDER BY name
            LIMIT $2
            "#,
        )
        .bind(like_pattern(location))
        .bind(clamp_limit(limit))
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateVetRequest {
        CreateVetRequest {
            name: "Dr. Joshi's Clinic".into(),
            address: "12 MG Road".into(),
            location: "Pune".into(),
            phone: "+91 9000000000".into(),
            latitude: None,
            longitude: None,
            services: None,
        }
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        assert!(validate_new_vet(&request()).is_ok());

        let mut req = request();
        req.phone = "   ".into();
        assert!(validate_new_vet(&req).is_err());
    }

    #[test]
    fn services_split_on_commas_and_trim() {
        assert_eq!(
            parse_services(Some("surgery, vaccination ,, x-ray ")),
            vec!["surgery", "vaccination", "x-ray"]
        );
        assert!(parse_services(Some("")).is_empty());
        assert!(parse_services(None).is_empty());
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern(" Pune "), "%Pune%");
        assert_eq!(like_pattern("100%_zone"), "%100\\%\\_zone%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 10);
        assert_eq!(clamp_limit(Some(25)), 25);
        assert_eq!(clamp_limit(Some(500)), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
    }
}
