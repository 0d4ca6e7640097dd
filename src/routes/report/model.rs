use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::form::{optional_number, required};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Urgency {
    Urgent,
    NonUrgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Urgent => "urgent",
            Urgency::NonUrgent => "non-urgent",
        }
    }
}

impl FromStr for Urgency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Urgency::Urgent),
            "non-urgent" => Ok(Urgency::NonUrgent),
            _ => Err(()),
        }
    }
}

/// Case workflow states. Membership is validated; no transition graph is
/// enforced, so any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportStatus {
    Pending,
    InProgress,
    Resolved,
    Adoptable,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::InProgress => "in-progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Adoptable => "adoptable",
        }
    }
}

impl FromStr for ReportStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "in-progress" => Ok(ReportStatus::InProgress),
            "resolved" => Ok(ReportStatus::Resolved),
            "adoptable" => Ok(ReportStatus::Adoptable),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportedAnimal {
    pub id: String,
    pub animal_type: String,
    pub urgency: String,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    pub status: String,
    pub reported_at: DateTime<Utc>,
    pub reported_by: String,
    pub assigned_to: Option<String>,
}

/// A validated create payload, assembled from multipart text fields.
#[derive(Debug)]
pub struct NewReport {
    pub animal_type: String,
    pub urgency: Urgency,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewReport {
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, AppError> {
        let animal_type = required(fields, "animalType")?;
        let urgency = Urgency::from_str(&required(fields, "urgency")?)
            .map_err(|_| AppError::Validation("Urgency must be 'urgent' or 'non-urgent'".into()))?;

        let description = required(fields, "description")?;
        if description.chars().count() < 10 {
            return Err(AppError::Validation(
                "Description must be at least 10 characters".into(),
            ));
        }

        let location = required(fields, "location")?;
        if location.chars().count() < 3 {
            return Err(AppError::Validation("Please provide a location".into()));
        }

        Ok(NewReport {
            animal_type,
            urgency,
            description,
            location,
            latitude: optional_number(fields, "latitude")?,
            longitude: optional_number(fields, "longitude")?,
        })
    }
}

impl ReportedAnimal {
    /// New cases always start out pending and owned by the reporter.
    pub async fn create(
        pool: &PgPool,
        report: NewReport,
        reporter_id: &str,
        photo_url: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ReportedAnimal>(
            r#"
            INSERT INTO reported_animals (
                id, animal_type, urgency, description, location,
                latitude, longitude, photo_url, status, reported_at, reported_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', NOW(), $9)
            RETURNING id, animal_type, urgency, description, location,
                      latitude, longitude, photo_url, status, reported_at,
                      reported_by, assigned_to
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&report.animal_type)
        .bind(report.urgency.as_str())
        .bind(&report.description)
        .bind(&report.location)
        .bind(report.latitude)
        .bind(report.longitude)
        .bind(&photo_url)
        .bind(reporter_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportedAnimal>(
            r#"
            SELECT id, animal_type, urgency, description, location,
                   latitude, longitude, photo_url, status, reported_at,
                   reported_by, assigned_to
            FROM reported_animals
            ORDER BY reported_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_reporter(
        pool: &PgPool,
        reporter_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportedAnimal>(
            r#"
            SELECT id, animal_type, urgency, description, location,
                   latitude, longitude, photo_url, status, reported_at,
                   reported_by, assigned_to
            FROM reported_animals
            WHERE reported_by = $1
            ORDER BY reported_at DESC
            "#,
        )
        .bind(reporter_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportedAnimal>(
            r#"
            SELECT id, animal_type, urgency, description, location,
                   latitude, longitude, photo_url, status, reported_at,
                   reported_by, assigned_to
            FROM reported_animals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Last write wins; the triaging NGO becomes the assignee.
    pub async fn update_status(
        pool: &PgPool,
        id: &str,
        status: ReportStatus,
        assignee_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ReportedAnimal>(
            r#"
            UPDATE reported_animals
            SET status = $1, assigned_to = $2
            WHERE id = $3
            RETURNING id, animal_type, urgency, description, location,
                      latitude, longitude, photo_url, status, reported_at,
                      reported_by, assigned_to
            "#,
        )
        .bind(status.as_str())
        .bind(assignee_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn valid_fields() -> HashMap<String, String> {
        fields(&[
            ("animalType", "dog"),
            ("urgency", "urgent"),
            ("description", "Injured stray near the market"),
            ("location", "FC Road, Pune"),
        ])
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            ReportStatus::Pending,
            ReportStatus::InProgress,
            ReportStatus::Resolved,
            ReportStatus::Adoptable,
        ] {
            assert_eq!(ReportStatus::from_str(status.as_str()), Ok(status));
        }
        assert_eq!(ReportStatus::from_str("closed"), Err(()));
    }

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let status: ReportStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(status, ReportStatus::InProgress);
        assert!(serde_json::from_str::<ReportStatus>("\"in_progress\"").is_err());
    }

    #[test]
    fn payload_with_all_required_fields_passes() {
        let report = NewReport::from_fields(&valid_fields()).unwrap();
        assert_eq!(report.urgency, Urgency::Urgent);
        assert_eq!(report.latitude, None);
    }

    #[test]
    fn coordinates_are_optional_but_validated() {
        let mut f = valid_fields();
        f.insert("latitude".into(), "18.5204".into());
        f.insert("longitude".into(), "73.8567".into());
        let report = NewReport::from_fields(&f).unwrap();
        assert_eq!(report.latitude, Some(18.5204));

        f.insert("latitude".into(), "north".into());
        assert!(NewReport::from_fields(&f).is_err());
    }

    #[test]
    fn missing_description_is_rejected() {
        let mut f = valid_fields();
        f.remove("description");
        assert!(NewReport::from_fields(&f).is_err());
    }

    #[test]
    fn short_description_is_rejected() {
        let mut f = valid_fields();
        f.insert("description".into(), "hurt dog".into());
        assert!(NewReport::from_fields(&f).is_err());
    }

    #[test]
    fn unknown_urgency_is_rejected() {
        let mut f = valid_fields();
        f.insert("urgency".into(), "critical".into());
        assert!(NewReport::from_fields(&f).is_err());
    }
}
