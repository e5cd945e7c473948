pub mod identity;
pub mod persistence;
pub mod work_services;

pub use identity::{KeycloakIdentityProvider, KeycloakSettings};
pub use persistence::{InMemoryUserRepository, PostgresUserRepository};
pub use work_services::{HttpRemoteCountGateway, UpstreamEndpoint};
