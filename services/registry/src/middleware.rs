//! Middleware for JWT token validation and authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated person taken from validated token claims
#[derive(Debug, Clone)]
pub struct AuthPerson {
    pub id: i64,
    pub name: String,
}

/// Extract and validate the JWT bearer token from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract the Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    // Check if it's a Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    // Validate the token
    let claims = state.jwt_service.validate_token(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        ApiError::Unauthorized
    })?;

    // Make the authenticated person available to handlers
    req.extensions_mut().insert(AuthPerson {
        id: claims.sub,
        name: claims.name,
    });

    Ok(next.run(req).await)
}
