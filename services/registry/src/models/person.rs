//! Person model and wire payloads
//!
//! The `Person` entity mirrors the `persons` table and is never serialized
//! directly; responses go through `PersonResponse` so the password hash
//! stays write-only. Mapping between the two is explicit.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Person entity
#[derive(Debug, Clone, FromRow)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: NaiveDate,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// New person insertion payload; audit timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewPerson {
    pub name: String,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: NaiveDate,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: String,
    pub password_hash: String,
}

/// Request for person registration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: Option<String>,
    pub password: Option<String>,
}

/// Request for partial person update; absent fields leave the stored value
/// unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePersonRequest {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: Option<String>,
}

/// Person login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub cpf: String,
    pub password: String,
}

/// Response for person operations
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResponse {
    pub id: i64,
    pub name: String,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub birth_date: NaiveDate,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: String,
}

impl From<Person> for PersonResponse {
    fn from(person: Person) -> Self {
        Self {
            id: person.id,
            name: person.name,
            gender: person.gender,
            email: person.email,
            birth_date: person.birth_date,
            nationality: person.nationality,
            place_of_birth: person.place_of_birth,
            cpf: person.cpf,
        }
    }
}

/// Response for a successful login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub person: PersonResponse,
}

/// Query parameters for person listing
///
/// Text filters are case-sensitive substring matches combined with AND; the
/// birth-date filter matches the exact calendar day. Page index and size
/// values below 1 silently fall back to the defaults (1 and 10).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonFilter {
    pub name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub nationality: Option<String>,
    pub place_of_birth: Option<String>,
    pub cpf: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub page_index: Option<i64>,
    pub page_size: Option<i64>,
}

impl PersonFilter {
    /// Page index with the default applied (1-based).
    pub fn page_index(&self) -> i64 {
        match self.page_index {
            Some(index) if index > 0 => index,
            _ => 1,
        }
    }

    /// Page size with the default applied.
    pub fn page_size(&self) -> i64 {
        match self.page_size {
            Some(size) if size > 0 => size,
            _ => 10,
        }
    }

    /// Number of records to skip before the requested page.
    pub fn offset(&self) -> i64 {
        (self.page_index() - 1) * self.page_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_defaults_apply_when_unset() {
        let filter = PersonFilter::default();
        assert_eq!(filter.page_index(), 1);
        assert_eq!(filter.page_size(), 10);
        assert_eq!(filter.offset(), 0);
    }

    #[test]
    fn filter_defaults_apply_when_out_of_range() {
        let filter = PersonFilter {
            page_index: Some(0),
            page_size: Some(-3),
            ..Default::default()
        };
        assert_eq!(filter.page_index(), 1);
        assert_eq!(filter.page_size(), 10);
    }

    #[test]
    fn filter_offset_skips_previous_pages() {
        let filter = PersonFilter {
            page_index: Some(3),
            page_size: Some(10),
            ..Default::default()
        };
        assert_eq!(filter.offset(), 20);
    }

    #[test]
    fn response_never_carries_the_password_hash() {
        let person = Person {
            id: 1,
            name: "Ana".to_string(),
            gender: None,
            email: Some("ana@example.com".to_string()),
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 20).unwrap(),
            nationality: None,
            place_of_birth: None,
            cpf: "11144477735".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };

        let body = serde_json::to_string(&PersonResponse::from(person)).unwrap();
        assert!(!body.contains("argon2"));
        assert!(!body.contains("password"));
        assert!(body.contains("\"birthDate\":\"1990-05-20\""));
    }
}
