use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod api;
mod config;
mod context;
mod db;
mod error;
mod models;
mod services;
mod state;
mod utils;
#[cfg(test)]
mod tests;

use config::Config;
use db::SqliteUserDirectory;
use services::auth_service::AuthService;
use services::directory::PasswordHasher;
use services::token_service::TokenService;
use state::AppState;
use utils::password::BcryptHasher;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub fn create_router(state: AppState) -> Router {
    // Create a CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(api::auth::sign_up))
        .route("/auth/signin", post(api::auth::sign_in))
        .route("/auth/verify", post(api::auth::verify_token))
        .route("/auth/refresh", post(api::auth::refresh_token))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    // Wire collaborators
    let pool = db::create_db_pool(&config.database_url).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.bcrypt_cost));
    let directory = Arc::new(SqliteUserDirectory::new(pool, hasher.clone()));
    let tokens = TokenService::new(&config.secret_key)
        .with_lifetimes(config.token_lifetimes)
        .with_refresh_policy(config.refresh_policy);

    let auth = AuthService::new(directory, hasher, tokens);
    let app = create_router(AppState::new(auth, config.request_timeout));

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
