// Driven port - User repository (output port)

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{User, UserId, Username};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("a live user already holds username {0}")]
    Duplicate(String),

    #[error("user {0} is no longer active")]
    Stale(UserId),

    #[error("stored user row is invalid: {0}")]
    Corrupt(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Every read is scoped to users that are not deleted.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_active_by_username(&self, username: &Username) -> Result<Option<User>, RepositoryError>;

    /// Ordered by first name, then username.
    async fn find_all_active(&self) -> Result<Vec<User>, RepositoryError>;

    /// Inserts a new user, or replaces a stored one as long as the stored
    /// row is still active. Replacing a deleted row fails with `Stale`;
    /// taking a username held by another live user fails with `Duplicate`.
    async fn save(&self, user: &User) -> Result<User, RepositoryError>;
}
