//! Registry service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::ApiError,
    middleware::{AuthPerson, auth_middleware},
    models::{CreatePersonRequest, LoginRequest, PersonFilter, UpdatePersonRequest},
    state::AppState,
};

/// Create the router for the registry service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/v1/persons", get(list_persons))
        .route(
            "/api/v1/persons/:id",
            get(get_person).patch(update_person).delete(delete_person),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/persons", post(create_person))
        .route("/api/v1/persons/login", post(login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    common::database::health_check(&state.db_pool)
        .await
        .map_err(|e| {
            error!("Database health check failed: {}", e);
            ApiError::Internal
        })?;

    Ok(Json(json!({
        "status": "ok",
        "service": "person-registry"
    })))
}

/// Register a new person
pub async fn create_person(
    State(state): State<AppState>,
    Json(payload): Json<CreatePersonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let person = state.person_service.create(payload).await?;

    Ok(Json(person))
}

/// Fetch one person by ID
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let person = state.person_service.get(id).await?;

    Ok(Json(person))
}

/// List persons with filtering and pagination
pub async fn list_persons(
    State(state): State<AppState>,
    Query(filter): Query<PersonFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let persons = state.person_service.list(filter).await?;

    Ok(Json(persons))
}

/// Partially update a person
pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePersonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let person = state.person_service.update(id, payload).await?;

    Ok(Json(person))
}

/// Soft-delete a person
pub async fn delete_person(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthPerson>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.person_service.delete(id).await?;

    info!("Person {} deleted by {} ({})", id, auth.id, auth.name);

    Ok(Json(json!({ "message": "Person deleted successfully." })))
}

/// Authenticate a person and issue an access token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.person_service.login(payload).await?;

    Ok(Json(response))
}
