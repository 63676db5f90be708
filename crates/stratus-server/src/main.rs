//! Stratus Server — application entry point.

use std::sync::Arc;
use std::time::Duration;

use stratus_auth::{AuthService, CredentialStore, PlatformAuthService, SecretCodec};
use stratus_db::repository::{
    SurrealCatalogRepository, SurrealPlatformAdminRepository, SurrealRevocationRepository,
    SurrealRoleRepository, SurrealTenantRepository, SurrealUserRepository,
};
use stratus_db::DbManager;
use stratus_rbac::{CatalogWatcher, OnboardingService, PermissionResolver};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;
mod state;

use config::ServerConfig;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("stratus=info".parse()?),
        )
        .json()
        .init();

    tracing::info!("Starting Stratus server...");

    let config = ServerConfig::from_env()?;

    let db = DbManager::connect(&config.db).await?;
    stratus_db::run_migrations(db.client()).await?;

    let client = db.client().clone();
    let codec = SecretCodec::new(&config.auth.app_secret);

    let tenant_repo = SurrealTenantRepository::new(client.clone());
    let user_repo = match &config.auth.pepper {
        Some(p) => SurrealUserRepository::with_pepper(client.clone(), p.clone()),
        None => SurrealUserRepository::new(client.clone()),
    };
    let role_repo = SurrealRoleRepository::new(client.clone());
    let admin_repo = SurrealPlatformAdminRepository::new(client.clone());
    let catalog_repo = SurrealCatalogRepository::new(client.clone());
    let revocation_repo = SurrealRevocationRepository::new(client.clone());

    let state = AppState {
        credentials: Arc::new(CredentialStore::new(tenant_repo.clone(), codec.clone())),
        auth: Arc::new(AuthService::new(
            user_repo.clone(),
            role_repo.clone(),
            revocation_repo.clone(),
            config.auth.clone(),
        )),
        platform_auth: Arc::new(PlatformAuthService::new(
            admin_repo,
            revocation_repo,
            config.auth.clone(),
        )),
        resolver: Arc::new(PermissionResolver::new(
            tenant_repo.clone(),
            user_repo,
            role_repo,
            catalog_repo.clone(),
        )),
        onboarding: Arc::new(OnboardingService::new(
            tenant_repo.clone(),
            catalog_repo.clone(),
            codec,
        )),
        tenants: tenant_repo,
        catalog: catalog_repo.clone(),
        db: db.clone(),
    };

    // Catalog watcher: polls for platform catalog changes and fans the
    // diffs out to subscribers. Runs until the process exits.
    let watcher = CatalogWatcher::new(
        catalog_repo,
        Duration::from_secs(config.catalog_poll_secs),
    );
    tokio::spawn(watcher.run());

    let app = routes::router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    tracing::info!(bind = %config.bind, "Stratus server listening");

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
