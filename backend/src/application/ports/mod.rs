// Application ports - Driven ports (output ports implemented by infrastructure)

pub mod user_repository;
pub mod identity_provider;
pub mod remote_count_gateway;

pub use user_repository::{RepositoryError, UserRepository};
pub use identity_provider::{AccountSpec, IdentityProvider, IdentityProviderError};
pub use remote_count_gateway::RemoteCountGateway;

#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
#[cfg(test)]
pub use remote_count_gateway::MockRemoteCountGateway;
