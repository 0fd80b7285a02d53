use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod error;
mod jwt;
mod middleware;
mod models;
mod repositories;
mod routes;
mod service;
mod state;
mod validation;

use std::sync::Arc;

use common::database::{DatabaseConfig, init_pool};

use crate::jwt::{JwtConfig, JwtService};
use crate::repositories::PgPersonStore;
use crate::service::PersonService;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting person registry service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending migrations
    sqlx::migrate!().run(&pool).await?;
    info!("Database migrations applied");

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(jwt_config);

    let person_store = Arc::new(PgPersonStore::new(pool.clone()));
    let person_service = PersonService::new(person_store, jwt_service.clone());

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        person_service,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Person registry service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
