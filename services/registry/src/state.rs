//! Application state shared across handlers

use sqlx::PgPool;

use crate::jwt::JwtService;
use crate::service::PersonService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub person_service: PersonService,
}
