// Infrastructure layer - external concerns (database, HTTP, identity, config)
// Implements the ports defined in the application layer

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::application::ports::UserRepository;
use crate::application::UserLifecycleCoordinator;

pub mod config;
pub mod driven;  // Output adapters (store, identity provider, work services)
pub mod driving; // Input adapters (HTTP)

use self::config::Settings;
use self::driven::{HttpRemoteCountGateway, InMemoryUserRepository, KeycloakIdentityProvider, PostgresUserRepository};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserLifecycleCoordinator>,
}

/// Wires the adapters selected by `settings` into the coordinator.
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<AppState> {
    let users: Arc<dyn UserRepository> = match &settings.database.url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(settings.database.max_connections)
                .connect(url)
                .await?;
            let repo = PostgresUserRepository::new(pool);
            repo.migrate().await?;
            info!("using postgres user store");
            Arc::new(repo)
        }
        None => {
            warn!("database.url not set, users are kept in memory only");
            Arc::new(InMemoryUserRepository::new())
        }
    };

    let gateway = HttpRemoteCountGateway::new(
        settings.project_endpoint()?,
        settings.task_endpoint()?,
        settings.retry_policy(),
        settings.circuit_breaker(),
    )?;
    let identity = KeycloakIdentityProvider::new(settings.keycloak()?)?;

    let coordinator = UserLifecycleCoordinator::new(users, Arc::new(identity), Arc::new(gateway));
    Ok(AppState { users: Arc::new(coordinator) })
}
