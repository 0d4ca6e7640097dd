use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::utils::hash_password;

/// Account roles. Individuals report animals; NGOs triage reports and manage
/// adoption listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Individual,
    Ngo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Individual => "individual",
            Role::Ngo => "ngo",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(Role::Individual),
            "ngo" => Ok(Role::Ngo),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub contact_phone: Option<String>,
    pub ngo_name: Option<String>,
    pub ngo_registration: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub ngo_name: Option<String>,
    #[serde(default)]
    pub ngo_registration: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.username.chars().count() < 3 {
        return Err(AppError::Validation(
            "Username must be at least 3 characters".into(),
        ));
    }
    if !req
        .username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username may only contain letters, digits and underscores".into(),
        ));
    }
    if req.password.chars().count() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    if req.full_name.trim().chars().count() < 2 {
        return Err(AppError::Validation("Full name is required".into()));
    }
    Ok(())
}

impl Account {
    /// Role as the typed enum. Rows only ever hold values admitted by the
    /// schema check constraint.
    pub fn role(&self) -> Role {
        Role::from_str(&self.role).unwrap_or(Role::Individual)
    }

    pub async fn create(pool: &PgPool, req: RegisterRequest) -> Result<Self, AppError> {
        let password_hash = hash_password(&req.password)
            .map_err(|e| AppError::Storage(format!("failed to hash password: {}", e)))?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (
                id, username, password_hash, full_name, role,
                contact_phone, ngo_name, ngo_registration, location
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, username, password_hash, full_name, role,
                      contact_phone, ngo_name, ngo_registration, location
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&req.username)
        .bind(&password_hash)
        .bind(req.full_name.trim())
        .bind(req.role.as_str())
        .bind(&req.contact_phone)
        .bind(&req.ngo_name)
        .bind(&req.ngo_registration)
        .bind(&req.location)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::Validation("Username already exists".into())
            } else {
                AppError::from(e)
            }
        })?;

        Ok(account)
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, full_name, role,
                   contact_phone, ngo_name, ngo_registration, location
            FROM accounts
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, username, password_hash, full_name, role,
                   contact_phone, ngo_name, ngo_registration, location
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            username: "pawscare".into(),
            password: "secret123".into(),
            full_name: "PawsCare Trust".into(),
            role: Role::Ngo,
            contact_phone: None,
            ngo_name: Some("PawsCare".into()),
            ngo_registration: None,
            location: Some("Pune".into()),
        }
    }

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!(Role::from_str("ngo"), Ok(Role::Ngo));
        assert_eq!(Role::from_str("individual"), Ok(Role::Individual));
        assert_eq!(Role::from_str("admin"), Err(()));
        assert_eq!(Role::Ngo.as_str(), "ngo");
    }

    #[test]
    fn role_deserializes_from_lowercase_json() {
        let role: Role = serde_json::from_str("\"individual\"").unwrap();
        assert_eq!(role, Role::Individual);
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn valid_registration_passes() {
        assert!(validate_registration(&request()).is_ok());
    }

    #[test]
    fn short_or_malformed_fields_are_rejected() {
        let mut req = request();
        req.username = "ab".into();
        assert!(validate_registration(&req).is_err());

        let mut req = request();
        req.username = "paws care".into();
        assert!(validate_registration(&req).is_err());

        let mut req = request();
        req.password = "12345".into();
        assert!(validate_registration(&req).is_err());

        let mut req = request();
        req.full_name = " x ".into();
        assert!(validate_registration(&req).is_err());
    }

    #[test]
    fn password_hash_never_serializes() {
        let account = Account {
            id: "id".into(),
            username: "pawscare".into(),
            password_hash: "bcrypt-hash".into(),
            full_name: "PawsCare Trust".into(),
            role: "ngo".into(),
            contact_phone: None,
            ngo_name: None,
            ngo_registration: None,
            location: None,
        };
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["fullName"], "PawsCare Trust");
    }
}
