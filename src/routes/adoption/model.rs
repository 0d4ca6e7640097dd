use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;
use crate::routes::form::required;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "unknown" => Ok(Gender::Unknown),
            _ => Err(()),
        }
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vaccinated {
    Yes,
    No,
    Partial,
}

impl FromStr for Vaccinated {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Vaccinated::Yes),
            "no" => Ok(Vaccinated::No),
            "partial" => Ok(Vaccinated::Partial),
            _ => Err(()),
        }
    }
}

impl Vaccinated {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vaccinated::Yes => "yes",
            Vaccinated::No => "no",
            Vaccinated::Partial => "partial",
        }
    }
}

/// Listing lifecycle. Only `available` listings appear on the public feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Pending,
    Adopted,
}

impl FromStr for ListingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ListingStatus::Available),
            "pending" => Ok(ListingStatus::Pending),
            "adopted" => Ok(ListingStatus::Adopted),
            _ => Err(()),
        }
    }
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Available => "available",
            ListingStatus::Pending => "pending",
            ListingStatus::Adopted => "adopted",
        }
    }
}

#[derive(Debug, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdoptableAnimal {
    pub id: String,
    pub name: String,
    pub animal_type: String,
    pub gender: String,
    pub age: String,
    pub vaccinated: String,
    pub description: String,
    pub photo_url: Option<String>,
    pub status: String,
    pub listed_at: DateTime<Utc>,
    pub listed_by: String,
}

#[derive(Debug)]
pub struct NewListing {
    pub name: String,
    pub animal_type: String,
    pub gender: Gender,
    pub age: String,
    pub vaccinated: Vaccinated,
    pub description: String,
}

impl NewListing {
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, AppError> {
        let name = required(fields, "name")?;
        let animal_type = required(fields, "animalType")?;
        let gender = Gender::from_str(&required(fields, "gender")?).map_err(|_| {
            AppError::Validation("Gender must be 'male', 'female' or 'unknown'".into())
        })?;
        let age = required(fields, "age")?;
        let vaccinated = Vaccinated::from_str(&required(fields, "vaccinated")?).map_err(|_| {
            AppError::Validation("Vaccination status must be 'yes', 'no' or 'partial'".into())
        })?;

        let description = required(fields, "description")?;
        if description.chars().count() < 10 {
            return Err(AppError::Validation(
                "Description must be at least 10 characters".into(),
            ));
        }

        Ok(NewListing {
            name,
            animal_type,
            gender,
            age,
            vaccinated,
            description,
        })
    }
}

impl AdoptableAnimal {
    /// New listings always start out available.
    pub async fn create(
        pool: &PgPool,
        listing: NewListing,
        ngo_id: &str,
        photo_url: Option<String>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AdoptableAnimal>(
            r#"
            INSERT INTO adoptable_animals (
                id, name, animal_type, gender, age, vaccinated,
                description, photo_url, status, listed_at, listed_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'available', NOW(), $9)
            RETURNING id, name, animal_type, gender, age, vaccinated,
                      description, photo_url, status, listed_at, listed_by
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&listing.name)
        .bind(&listing.animal_type)
        .bind(listing.gender.as_str())
        .bind(&listing.age)
        .bind(listing.vaccinated.as_str())
        .bind(&listing.description)
        .bind(&photo_url)
        .bind(ngo_id)
        .fetch_one(pool)
        .await
    }

    /// The public feed: available listings only.
    pub async fn list_available(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdoptableAnimal>(
            r#"
            SELECT id, name, animal_type, gender, age, vaccinated,
                   description, photo_url, status, listed_at, listed_by
            FROM adoptable_animals
            WHERE status = 'available'
            ORDER BY listed_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_ngo(pool: &PgPool, ngo_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdoptableAnimal>(
            r#"
            SELECT id, name, animal_type, gender, age, vaccinated,
                   description, photo_url, status, listed_at, listed_by
            FROM adoptable_animals
            WHERE listed_by = $1
            ORDER BY listed_at DESC
            "#,
        )
        .bind(ngo_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdoptableAnimal>(
            r#"
            SELECT id, name, animal_type, gender, age, vaccinated,
                   description, photo_url, status, listed_at, listed_by
            FROM adoptable_animals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: &str,
        status: ListingStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdoptableAnimal>(
            r#"
            UPDATE adoptable_animals
            SET status = $1
            WHERE id = $2
            RETURNING id, name, animal_type, gender, age, vaccinated,
                      description, photo_url, status, listed_at, listed_by
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM adoptable_animals WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
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
            ("name", "Rex"),
            ("animalType", "dog"),
            ("gender", "male"),
            ("age", "2 years"),
            ("vaccinated", "yes"),
            ("description", "Friendly stray, good with children"),
        ])
    }

    #[test]
    fn enums_round_trip() {
        assert_eq!(Gender::from_str("female"), Ok(Gender::Female));
        assert_eq!(Vaccinated::from_str("partial"), Ok(Vaccinated::Partial));
        assert_eq!(ListingStatus::from_str("adopted"), Ok(ListingStatus::Adopted));
        assert_eq!(ListingStatus::from_str("archived"), Err(()));
        assert_eq!(ListingStatus::Available.as_str(), "available");
    }

    #[test]
    fn complete_payload_passes() {
        let listing = NewListing::from_fields(&valid_fields()).unwrap();
        assert_eq!(listing.name, "Rex");
        assert_eq!(listing.gender, Gender::Male);
        assert_eq!(listing.vaccinated, Vaccinated::Yes);
    }

    #[test]
    fn missing_name_is_rejected() {
        let mut f = valid_fields();
        f.remove("name");
        assert!(NewListing::from_fields(&f).is_err());
    }

    #[test]
    fn unknown_gender_is_rejected() {
        let mut f = valid_fields();
        f.insert("gender".into(), "other".into());
        assert!(NewListing::from_fields(&f).is_err());
    }

    #[test]
    fn short_description_is_rejected() {
        let mut f = valid_fields();
        f.insert("description".into(), "good dog".into());
        assert!(NewListing::from_fields(&f).is_err());
    }
}
