//! Person service
//!
//! Orchestrates validation, password hashing, persistence, and token
//! issuance. Validation always runs before any storage call; business-rule
//! failures surface as client-facing messages and storage failures are
//! logged and mapped to a generic internal error.

use std::sync::Arc;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use tracing::{error, info};

use crate::error::{ApiError, ApiResult};
use crate::jwt::JwtService;
use crate::models::{
    CreatePersonRequest, LoginRequest, NewPerson, PersonFilter, PersonResponse, TokenResponse,
    UpdatePersonRequest,
};
use crate::repositories::{PersonStore, StoreError};
use crate::validation;

const CPF_IN_USE: &str = "The supplied CPF is already in use.";
const INVALID_ID: &str = "The supplied ID is not valid.";
const PERSON_NOT_FOUND: &str = "Person not found.";

/// Person service
#[derive(Clone)]
pub struct PersonService {
    store: Arc<dyn PersonStore>,
    jwt: JwtService,
}

impl PersonService {
    /// Create a new person service
    pub fn new(store: Arc<dyn PersonStore>, jwt: JwtService) -> Self {
        Self { store, jwt }
    }

    /// Register a new person
    pub async fn create(&self, req: CreatePersonRequest) -> ApiResult<PersonResponse> {
        let (fields, password) = validation::validate_create(&req).map_err(ApiError::Validation)?;

        // Advisory pre-check; the partial unique index on active CPFs is the
        // authoritative guard against the check-then-insert race.
        if self
            .store
            .find_by_cpf(&fields.cpf)
            .await
            .map_err(storage_error)?
            .is_some()
        {
            return Err(ApiError::BadRequest(CPF_IN_USE.to_string()));
        }

        let password_hash = hash_password(&password)?;

        let person = self
            .store
            .insert(NewPerson {
                name: fields.name,
                gender: fields.gender,
                email: fields.email,
                birth_date: fields.birth_date,
                nationality: fields.nationality,
                place_of_birth: fields.place_of_birth,
                cpf: fields.cpf,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateCpf => ApiError::BadRequest(CPF_IN_USE.to_string()),
                other => storage_error(other),
            })?;

        info!("Registered person with ID: {}", person.id);

        Ok(person.into())
    }

    /// Fetch one active person by ID
    pub async fn get(&self, id: i64) -> ApiResult<PersonResponse> {
        let person = self
            .store
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| ApiError::NotFound(PERSON_NOT_FOUND.to_string()))?;

        Ok(person.into())
    }

    /// List active persons matching the filter, one page at a time
    pub async fn list(&self, filter: PersonFilter) -> ApiResult<Vec<PersonResponse>> {
        let persons = self.store.list(&filter).await.map_err(storage_error)?;

        Ok(persons.into_iter().map(PersonResponse::from).collect())
    }

    /// Partially update an active person; only supplied fields overwrite the
    /// stored values
    pub async fn update(
        &self,
        id: i64,
        req: UpdatePersonRequest,
    ) -> ApiResult<PersonResponse> {
        let patch = validation::validate_update(&req).map_err(ApiError::Validation)?;

        let mut person = self
            .store
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| ApiError::BadRequest(INVALID_ID.to_string()))?;

        if let Some(cpf) = patch.cpf {
            if cpf != person.cpf
                && self
                    .store
                    .find_by_cpf(&cpf)
                    .await
                    .map_err(storage_error)?
                    .is_some()
            {
                return Err(ApiError::BadRequest(CPF_IN_USE.to_string()));
            }
            person.cpf = cpf;
        }
        if let Some(name) = patch.name {
            person.name = name;
        }
        if let Some(gender) = patch.gender {
            person.gender = Some(gender);
        }
        if let Some(email) = patch.email {
            person.email = Some(email);
        }
        if let Some(birth_date) = patch.birth_date {
            person.birth_date = birth_date;
        }
        if let Some(nationality) = patch.nationality {
            person.nationality = Some(nationality);
        }
        if let Some(place_of_birth) = patch.place_of_birth {
            person.place_of_birth = Some(place_of_birth);
        }
        person.updated_at = Utc::now();

        let person = self.store.update(&person).await.map_err(|e| match e {
            StoreError::DuplicateCpf => ApiError::BadRequest(CPF_IN_USE.to_string()),
            other => storage_error(other),
        })?;

        info!("Updated person with ID: {}", person.id);

        Ok(person.into())
    }

    /// Soft-delete an active person; the record stays in storage with its
    /// deletion timestamp set
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        let mut person = self
            .store
            .find_by_id(id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| ApiError::BadRequest(INVALID_ID.to_string()))?;

        let now = Utc::now();
        person.deleted_at = Some(now);
        person.updated_at = now;

        self.store.update(&person).await.map_err(storage_error)?;

        info!("Soft-deleted person with ID: {}", id);

        Ok(())
    }

    /// Authenticate by CPF and password. An unknown CPF and a wrong password
    /// fail identically so the response does not leak which persons exist.
    pub async fn login(&self, req: LoginRequest) -> ApiResult<TokenResponse> {
        info!("Login attempt");

        let cpf = validation::normalize_cpf(&req.cpf);

        let Some(person) = self.store.find_by_cpf(&cpf).await.map_err(storage_error)? else {
            return Err(ApiError::Unauthorized);
        };

        if !verify_password(&person.password_hash, &req.password)? {
            return Err(ApiError::Unauthorized);
        }

        let issued = self.jwt.issue_token(&person).map_err(|e| {
            error!("Failed to issue access token: {}", e);
            ApiError::Internal
        })?;

        Ok(TokenResponse {
            access_token: issued.token,
            expires_at: issued.expires_at,
            person: person.into(),
        })
    }
}

fn storage_error(err: StoreError) -> ApiError {
    match err {
        StoreError::DuplicateCpf => ApiError::BadRequest(CPF_IN_USE.to_string()),
        other => {
            error!("Storage failure: {}", other);
            ApiError::Internal
        }
    }
}

fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::Internal
        })
}

fn verify_password(hash: &str, password: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| {
        error!("Failed to parse stored password hash: {}", e);
        ApiError::Internal
    })?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
