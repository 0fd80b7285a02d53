//! Person storage
//!
//! `PersonStore` is the explicit persistence boundary for person records;
//! `PgPersonStore` is its PostgreSQL implementation. All reads exclude
//! soft-deleted rows; a soft delete is just an update that sets
//! `deleted_at`.

use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};
use thiserror::Error;
use tracing::info;

use crate::models::{NewPerson, Person, PersonFilter};

const PERSON_COLUMNS: &str = "id, name, gender, email, birth_date, nationality, \
     place_of_birth, cpf, password_hash, created_at, updated_at, deleted_at";

/// Errors that can occur in a person store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The CPF collides with another active person (unique index backstop)
    #[error("CPF already in use")]
    DuplicateCpf,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence boundary for person records
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Find an active person by ID
    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, StoreError>;

    /// Find an active person by normalized CPF
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Person>, StoreError>;

    /// List active persons matching the filter, one page at a time
    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, StoreError>;

    /// Insert a new person; audit timestamps are assigned by the store
    async fn insert(&self, new_person: NewPerson) -> Result<Person, StoreError>;

    /// Persist every mutable field of an existing person, including
    /// `deleted_at`
    async fn update(&self, person: &Person) -> Result<Person, StoreError>;
}

/// PostgreSQL-backed person store
#[derive(Clone)]
pub struct PgPersonStore {
    pool: PgPool,
}

impl PgPersonStore {
    /// Create a new person store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonStore for PgPersonStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Person>, StoreError> {
        info!("Finding person by ID: {}", id);

        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE deleted_at IS NULL AND id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Person>, StoreError> {
        let person = sqlx::query_as::<_, Person>(&format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE deleted_at IS NULL AND cpf = $1"
        ))
        .bind(cpf)
        .fetch_optional(&self.pool)
        .await?;

        Ok(person)
    }

    async fn list(&self, filter: &PersonFilter) -> Result<Vec<Person>, StoreError> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {PERSON_COLUMNS} FROM persons WHERE deleted_at IS NULL"
        ));

        push_contains(&mut query, "name", filter.name.as_deref());
        push_contains(&mut query, "gender", filter.gender.as_deref());
        push_contains(&mut query, "email", filter.email.as_deref());
        push_contains(&mut query, "nationality", filter.nationality.as_deref());
        push_contains(&mut query, "place_of_birth", filter.place_of_birth.as_deref());
        push_contains(&mut query, "cpf", filter.cpf.as_deref());

        if let Some(birth_date) = filter.birth_date {
            query.push(" AND birth_date = ").push_bind(birth_date);
        }

        // Deterministic order keeps pagination stable under concurrent writes.
        query.push(" ORDER BY id");
        query.push(" LIMIT ").push_bind(filter.page_size());
        query.push(" OFFSET ").push_bind(filter.offset());

        let persons = query
            .build_query_as::<Person>()
            .fetch_all(&self.pool)
            .await?;

        Ok(persons)
    }

    async fn insert(&self, new_person: NewPerson) -> Result<Person, StoreError> {
        info!("Creating person with name: {}", new_person.name);

        let person = sqlx::query_as::<_, Person>(&format!(
            "INSERT INTO persons \
                 (name, gender, email, birth_date, nationality, place_of_birth, cpf, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PERSON_COLUMNS}"
        ))
        .bind(&new_person.name)
        .bind(&new_person.gender)
        .bind(&new_person.email)
        .bind(new_person.birth_date)
        .bind(&new_person.nationality)
        .bind(&new_person.place_of_birth)
        .bind(&new_person.cpf)
        .bind(&new_person.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(person)
    }

    async fn update(&self, person: &Person) -> Result<Person, StoreError> {
        info!("Updating person with ID: {}", person.id);

        let person = sqlx::query_as::<_, Person>(&format!(
            "UPDATE persons SET \
                 name = $1, gender = $2, email = $3, birth_date = $4, nationality = $5, \
                 place_of_birth = $6, cpf = $7, password_hash = $8, updated_at = $9, \
                 deleted_at = $10 \
             WHERE id = $11 \
             RETURNING {PERSON_COLUMNS}"
        ))
        .bind(&person.name)
        .bind(&person.gender)
        .bind(&person.email)
        .bind(person.birth_date)
        .bind(&person.nationality)
        .bind(&person.place_of_birth)
        .bind(&person.cpf)
        .bind(&person.password_hash)
        .bind(person.updated_at)
        .bind(person.deleted_at)
        .bind(person.id)
        .fetch_one(&self.pool)
        .await
        .map_err(classify)?;

        Ok(person)
    }
}

/// Append a case-sensitive substring condition for `column` when a filter
/// value is present.
fn push_contains(query: &mut QueryBuilder<'_, sqlx::Postgres>, column: &str, term: Option<&str>) {
    if let Some(term) = term {
        query
            .push(format!(" AND {column} LIKE "))
            .push_bind(like_pattern(term))
            .push(" ESCAPE '\\'");
    }
}

/// Wrap a search term in `%` wildcards, escaping LIKE metacharacters so the
/// term is matched literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::DuplicateCpf;
        }
    }
    StoreError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_wraps_the_term() {
        assert_eq!(like_pattern("Ana"), "%Ana%");
    }

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
